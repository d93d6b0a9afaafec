//! Notification stream endpoint construction.

use url::Url;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Map an HTTP scheme to its WebSocket counterpart.
///
/// `http` becomes `ws` and `https` becomes `wss`; anything else, including
/// `ws` and `wss` themselves, is returned unchanged.
pub fn stream_scheme(scheme: &str) -> &str {
    match scheme {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
}

/// Build the authenticated notification stream URL for a server address.
///
/// The address's path and query are replaced; host and port are kept.
pub fn notification_endpoint(address: &str, access_token: &str, config: &SyncConfig) -> Result<Url> {
    let mut url = Url::parse(address).map_err(|e| SyncError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = stream_scheme(url.scheme()).to_string();
    if scheme != "ws" && scheme != "wss" {
        return Err(SyncError::UnsupportedScheme(scheme));
    }
    url.set_scheme(&scheme)
        .map_err(|_| SyncError::UnsupportedScheme(scheme.clone()))?;

    url.set_path(&config.notifications_path);
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair(&config.token_parameter, access_token);

    Ok(url)
}

/// Render a stream URL for logs with the token value masked.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, _)| (k.into_owned(), "***".to_string()))
        .collect();
    if pairs.is_empty() {
        return shown.to_string();
    }
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
