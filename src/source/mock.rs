//! Mock audio source for testing without a codec or sound card.

use std::time::Duration;

use crate::buffer::RingBuffer;
use crate::routing::SAMPLE_SIZE;
use crate::MainBuffer;

/// A mock call leg that generates synthetic 16-bit PCM for testing.
///
/// Samples are stored as native-endian bytes, the same layout a
/// [`MainBuffer`] carries and mixes, so they can be fed straight into any
/// call leg's buffer.
///
/// # Example
///
/// ```
/// use call_audio::{MainBuffer, MockFrameSource};
///
/// let main_buffer = MainBuffer::new();
/// main_buffer.bind_call_id("call-1");
///
/// let mut mock = MockFrameSource::new(8000);
/// mock.generate_sine(440.0, 20);
///
/// // 20ms at 8kHz is 160 samples
/// assert_eq!(mock.feed(&main_buffer, "call-1"), 320);
/// assert_eq!(main_buffer.avail_for_get(), 320);
/// ```
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    sample_rate: u32,
    bytes: Vec<u8>,
}

impl MockFrameSource {
    /// Creates a new mock source producing mono PCM at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bytes: Vec::new(),
        }
    }

    /// Creates a mock source at the default internal rate (8kHz).
    pub fn narrowband() -> Self {
        Self::new(crate::DEFAULT_SAMPLING_RATE)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Generates silence for the given duration in milliseconds.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        self.bytes.resize(self.bytes.len() + num_samples * SAMPLE_SIZE, 0);
    }

    /// Generates a sine wave at the given frequency for the given duration.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let sample_rate = f64::from(self.sample_rate);

        for i in 0..num_samples {
            let t = i as f64 / sample_rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin();
            self.push_sample((value * 32767.0) as i16);
        }
    }

    /// Generates white noise for the given duration.
    pub fn generate_noise(&mut self, duration_ms: u64, amplitude: f64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let amplitude = (amplitude * 32767.0) as i16;

        // Simple LCG for deterministic "random" noise
        let mut seed: u32 = 12345;
        for _ in 0..num_samples {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let random = ((seed >> 16) as i32 - 32768) as i16;
            self.push_sample((i32::from(random) * i32::from(amplitude) / 32767) as i16);
        }
    }

    /// Adds raw samples directly.
    pub fn add_samples(&mut self, samples: &[i16]) {
        for &sample in samples {
            self.push_sample(sample);
        }
    }

    /// Takes all accumulated bytes, clearing the internal buffer.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Returns the accumulated bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the accumulated audio decoded back into samples.
    pub fn samples(&self) -> Vec<i16> {
        self.bytes
            .chunks_exact(SAMPLE_SIZE)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    /// Returns the duration of accumulated audio.
    pub fn duration(&self) -> Duration {
        let samples = self.bytes.len() / SAMPLE_SIZE;
        Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate))
    }

    /// Returns the number of bytes in one frame of `duration_ms`.
    pub fn frame_len(&self, duration_ms: u64) -> usize {
        self.samples_for_duration(duration_ms) * SAMPLE_SIZE
    }

    /// Writes the accumulated audio into `call_id`'s buffer.
    ///
    /// Bytes that do not fit stay queued for the next call. Returns the
    /// number of bytes written.
    pub fn feed(&mut self, main_buffer: &MainBuffer, call_id: &str) -> usize {
        let written = main_buffer.put_data_to(&self.bytes, call_id);
        self.bytes.drain(..written);
        written
    }

    /// Creates a standalone ring buffer holding the accumulated audio.
    ///
    /// The buffer has one reader, `reader_id`, positioned at the start.
    pub fn into_ring_buffer(self, reader_id: &str) -> RingBuffer {
        let capacity = self.bytes.len().max(1024);
        let mut ring_buffer = RingBuffer::new(capacity);
        ring_buffer.create_read_pointer(reader_id);
        ring_buffer.put(&self.bytes);
        ring_buffer
    }

    fn push_sample(&mut self, sample: i16) {
        self.bytes.extend_from_slice(&sample.to_ne_bytes());
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_silence() {
        let mut mock = MockFrameSource::new(16000);
        mock.generate_silence(100);

        let bytes = mock.take_bytes();
        assert_eq!(bytes.len(), 3200); // 1600 samples
        assert!(bytes.iter().all(|&b| b == 0));
        assert!(mock.bytes().is_empty());
    }

    #[test]
    fn test_mock_source_sine() {
        let mut mock = MockFrameSource::new(16000);
        mock.generate_sine(440.0, 100);

        let samples = mock.samples();
        assert_eq!(samples.len(), 1600);

        // Sine wave should have positive and negative values
        assert!(samples.iter().any(|&s| s > 0));
        assert!(samples.iter().any(|&s| s < 0));
    }

    #[test]
    fn test_mock_source_noise_is_deterministic() {
        let mut a = MockFrameSource::narrowband();
        let mut b = MockFrameSource::narrowband();
        a.generate_noise(10, 0.5);
        b.generate_noise(10, 0.5);
        assert_eq!(a.bytes(), b.bytes());
        assert!(a.samples().iter().all(|s| s.unsigned_abs() <= 16384));
    }

    #[test]
    fn test_mock_source_duration() {
        let mut mock = MockFrameSource::narrowband();
        mock.generate_silence(500);

        assert_eq!(mock.duration(), Duration::from_millis(500));
        assert_eq!(mock.frame_len(20), 320);
    }

    #[test]
    fn test_mock_source_feed_keeps_remainder() {
        let main_buffer = MainBuffer::builder().ring_buffer_size(8).build().unwrap();
        main_buffer.bind_call_id("call");

        let mut mock = MockFrameSource::narrowband();
        mock.add_samples(&[1, 2, 3, 4, 5, 6]);

        assert_eq!(mock.feed(&main_buffer, "call"), 8);
        assert_eq!(mock.samples(), vec![5, 6]);
        assert_eq!(mock.feed(&main_buffer, "unknown"), 0);
        assert_eq!(mock.samples(), vec![5, 6]);
    }

    #[test]
    fn test_mock_source_ring_buffer() {
        let mut mock = MockFrameSource::narrowband();
        mock.add_samples(&[1, 2, 3, 4, 5]);

        let mut ring_buffer = mock.into_ring_buffer("reader");

        let mut output = [0u8; 10];
        assert_eq!(ring_buffer.get(&mut output, "reader"), 10);

        let samples: Vec<i16> = output
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
    }
}
