//! Configuration types for the sync-worker crate
//!
//! Timing and endpoint policy for a sync session. All values have production
//! defaults; tests shorten the intervals.

use std::time::Duration;

use crate::error::{Result, SyncError};

/// Configuration for a SyncSession
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time between presence/update checks when polling
    /// Default: 15 minutes
    pub poll_interval: Duration,

    /// Granularity of the interruptible sleep between poll checks
    /// Default: 250 milliseconds
    pub poll_slice: Duration,

    /// Upper bound on a single wait for a stream frame
    /// Default: 100 milliseconds
    pub stream_poll_timeout: Duration,

    /// Path of the notification stream on the server
    /// Default: "/websockets/notifications"
    pub notifications_path: String,

    /// Query parameter carrying the access token
    /// Default: "X-Plex-Token"
    pub token_parameter: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15 * 60),
            poll_slice: Duration::from_millis(250),
            stream_poll_timeout: Duration::from_millis(100),
            notifications_path: "/websockets/notifications".to_string(),
            token_parameter: "X-Plex-Token".to_string(),
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SyncConfig with short intervals for development and tests
    pub fn fast_polling() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            poll_slice: Duration::from_millis(10),
            stream_poll_timeout: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(SyncError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.poll_slice.is_zero() {
            return Err(SyncError::Configuration(
                "Poll slice must be greater than 0".to_string(),
            ));
        }

        if self.poll_slice > self.poll_interval {
            return Err(SyncError::Configuration(
                "Invalid poll slice: must not exceed the poll interval".to_string(),
            ));
        }

        if self.stream_poll_timeout.is_zero() {
            return Err(SyncError::Configuration(
                "Stream poll timeout must be greater than 0".to_string(),
            ));
        }

        if !self.notifications_path.starts_with('/') {
            return Err(SyncError::Configuration(format!(
                "Notifications path must be absolute: {}",
                self.notifications_path
            )));
        }

        if self.token_parameter.is_empty() {
            return Err(SyncError::Configuration(
                "Token parameter name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_slice(mut self, slice: Duration) -> Self {
        self.poll_slice = slice;
        self
    }

    pub fn with_stream_poll_timeout(mut self, timeout: Duration) -> Self {
        self.stream_poll_timeout = timeout;
        self
    }
}
