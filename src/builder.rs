//! Builder pattern for `MainBuffer`.

use crate::{event_callback, BufferConfig, BufferEvent, CallAudioError, EventCallback, MainBuffer};

/// Builder for configuring a [`MainBuffer`].
///
/// Use [`MainBuffer::builder()`] to create a new builder.
///
/// # Example
///
/// ```
/// use call_audio::MainBuffer;
///
/// let main_buffer = MainBuffer::builder()
///     .ring_buffer_size(32_000)
///     .internal_sampling_rate(16_000)
///     .on_event(|e| tracing::warn!(?e, "routing event"))
///     .build()?;
///
/// assert_eq!(main_buffer.internal_sampling_rate(), 16_000);
/// # Ok::<(), call_audio::CallAudioError>(())
/// ```
#[must_use]
pub struct MainBufferBuilder {
    /// Buffer configuration.
    config: BufferConfig,
    /// Event callback.
    event_callback: Option<EventCallback>,
}

impl Default for MainBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MainBufferBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BufferConfig::default(),
            event_callback: None,
        }
    }

    /// Set the capacity of every call leg's ring buffer, in bytes.
    ///
    /// Default: [`DEFAULT_RING_BUFFER_SIZE`](crate::DEFAULT_RING_BUFFER_SIZE)
    pub fn ring_buffer_size(mut self, size: usize) -> Self {
        self.config.ring_buffer_size = size;
        self
    }

    /// Set the initial internal sampling rate, in Hz.
    ///
    /// Default: [`DEFAULT_SAMPLING_RATE`](crate::DEFAULT_SAMPLING_RATE)
    pub fn internal_sampling_rate(mut self, sampling_rate: u32) -> Self {
        self.config.internal_sampling_rate = sampling_rate;
        self
    }

    /// Set a callback to receive routing events.
    ///
    /// Events include write overflows, bind and unbind changes, and
    /// sampling-rate flushes.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(BufferEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Set custom buffer configuration.
    pub fn with_config(mut self, config: BufferConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the `MainBuffer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring buffer size is zero or not a whole
    /// number of samples, or if the sampling rate is zero.
    pub fn build(self) -> Result<MainBuffer, CallAudioError> {
        self.config.validate()?;

        tracing::debug!(
            ring_buffer_size = self.config.ring_buffer_size,
            sampling_rate = self.config.internal_sampling_rate,
            "creating main buffer"
        );
        Ok(MainBuffer::from_parts(self.config, self.event_callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let mb = MainBufferBuilder::new().build().unwrap();
        assert_eq!(mb.ring_buffer_size(), crate::DEFAULT_RING_BUFFER_SIZE);
        assert_eq!(mb.internal_sampling_rate(), crate::DEFAULT_SAMPLING_RATE);
    }

    #[test]
    fn test_builder_settings() {
        let mb = MainBufferBuilder::default()
            .ring_buffer_size(1024)
            .internal_sampling_rate(44_100)
            .build()
            .unwrap();
        assert_eq!(mb.ring_buffer_size(), 1024);
        assert_eq!(mb.internal_sampling_rate(), 44_100);
    }

    #[test]
    fn test_builder_with_config() {
        let config = BufferConfig {
            ring_buffer_size: 640,
            internal_sampling_rate: 16_000,
        };
        let mb = MainBufferBuilder::new().with_config(config).build().unwrap();
        assert_eq!(mb.ring_buffer_size(), 640);
        assert_eq!(mb.internal_sampling_rate(), 16_000);
    }

    #[test]
    fn test_builder_validation() {
        let result = MainBufferBuilder::new().ring_buffer_size(0).build();
        assert!(matches!(result, Err(CallAudioError::InvalidCapacity)));

        let result = MainBufferBuilder::new().ring_buffer_size(3).build();
        assert!(matches!(
            result,
            Err(CallAudioError::MisalignedCapacity { size: 3, .. })
        ));

        let result = MainBufferBuilder::new().internal_sampling_rate(0).build();
        assert!(matches!(result, Err(CallAudioError::InvalidSamplingRate)));
    }
}
