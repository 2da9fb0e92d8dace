//! Configuration for the routing engine.

use crate::routing::SAMPLE_SIZE;
use crate::CallAudioError;

/// Default size of every call leg's ring buffer in bytes.
///
/// About 25 seconds of 8kHz 16-bit mono audio.
pub const DEFAULT_RING_BUFFER_SIZE: usize = 400_000;

/// Default internal sampling rate in Hz.
pub const DEFAULT_SAMPLING_RATE: u32 = 8000;

/// Configuration for a [`MainBuffer`](crate::MainBuffer).
///
/// Use [`BufferConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use call_audio::BufferConfig;
///
/// let config = BufferConfig {
///     ring_buffer_size: 32_000,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Capacity of each call leg's ring buffer in bytes.
    ///
    /// Fixed when the buffer is created; the data path never reallocates.
    /// Must be a non-zero multiple of the 2-byte PCM sample size.
    /// Default: 400 000
    pub ring_buffer_size: usize,

    /// Sampling rate shared by every buffer, in Hz.
    ///
    /// Raising it later through
    /// [`MainBuffer::set_internal_sampling_rate`](crate::MainBuffer::set_internal_sampling_rate)
    /// flushes all buffers.
    /// Default: 8000
    pub internal_sampling_rate: u32,
}

impl BufferConfig {
    /// Checks that the configuration can back a `MainBuffer`.
    pub fn validate(&self) -> Result<(), CallAudioError> {
        if self.ring_buffer_size == 0 {
            return Err(CallAudioError::InvalidCapacity);
        }
        if self.ring_buffer_size % SAMPLE_SIZE != 0 {
            return Err(CallAudioError::MisalignedCapacity {
                size: self.ring_buffer_size,
                sample_size: SAMPLE_SIZE,
            });
        }
        if self.internal_sampling_rate == 0 {
            return Err(CallAudioError::InvalidSamplingRate);
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: DEFAULT_RING_BUFFER_SIZE,
            internal_sampling_rate: DEFAULT_SAMPLING_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_config_defaults() {
        let config = BufferConfig::default();
        assert_eq!(config.ring_buffer_size, 400_000);
        assert_eq!(config.internal_sampling_rate, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_size() {
        let config = BufferConfig {
            ring_buffer_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(CallAudioError::InvalidCapacity));
    }

    #[test]
    fn test_rejects_odd_size() {
        let config = BufferConfig {
            ring_buffer_size: 1001,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CallAudioError::MisalignedCapacity { size: 1001, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let config = BufferConfig {
            internal_sampling_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(CallAudioError::InvalidSamplingRate));
    }
}
