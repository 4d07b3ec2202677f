//! Per-link tuning: receive-side flow control parameters, timeouts and padding.
use crate::core::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MAX_WAIT_FRAMES, DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_ST_MIN_US,
};
use crate::error::ConfigError;
use crate::infra::codec::separation_time::MAX_ST_MIN_US;
use embassy_time::Duration;

/// Parameters of a single ISO-TP link.
///
/// `block_size` and `st_min_us` are advertised to the peer in our Flow-Control
/// frames; `st_min_us` is also the lower bound applied to the peer's STmin when
/// we transmit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// Consecutive Frames the peer may send between our Flow-Control frames. `0` = unlimited.
    pub block_size: u8,
    /// Minimum gap between Consecutive Frames, in microseconds.
    pub st_min_us: u32,
    /// Wait Flow-Control frames tolerated before a transfer is abandoned.
    pub max_wait_frames: u8,
    /// N_Bs / N_Cr timeout.
    pub response_timeout: Duration,
    /// Fill byte for short frames. `None` sends frames at their natural length.
    pub padding: Option<u8>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            st_min_us: DEFAULT_ST_MIN_US,
            max_wait_frames: DEFAULT_MAX_WAIT_FRAMES,
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            padding: None,
        }
    }
}

impl LinkConfig {
    pub fn with_block_size(mut self, block_size: u8) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_st_min_us(mut self, st_min_us: u32) -> Self {
        self.st_min_us = st_min_us;
        self
    }

    pub fn with_max_wait_frames(mut self, max_wait_frames: u8) -> Self {
        self.max_wait_frames = max_wait_frames;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_padding(mut self, padding: u8) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Checks that every deadline fits the wrapping 32-bit timestamp window and
    /// that STmin can be advertised on the wire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let micros = self.response_timeout.as_micros();
        if micros == 0 || micros > i32::MAX as u64 {
            return Err(ConfigError::InvalidResponseTimeout { micros });
        }
        if self.st_min_us > MAX_ST_MIN_US {
            return Err(ConfigError::InvalidSeparationTime {
                micros: self.st_min_us,
            });
        }
        Ok(())
    }

    /// Response timeout in microseconds. Only meaningful after `validate`.
    pub(crate) fn timeout_us(&self) -> u32 {
        self.response_timeout.as_micros().min(i32::MAX as u64) as u32
    }
}
