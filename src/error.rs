//! Error types for call-audio.
//!
//! Errors are split into two categories:
//! - **Construction errors** ([`CallAudioError`]): an invalid configuration
//!   prevents a [`MainBuffer`](crate::MainBuffer) from being built
//! - **Runtime conditions**: unknown call IDs, short writes and the like are
//!   never errors. Data-path operations return `0`/`false`/`None` and
//!   report through [`EventCallback`](crate::EventCallback), because they run
//!   on real-time audio threads.

/// Errors that prevent a [`MainBuffer`](crate::MainBuffer) from being created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallAudioError {
    /// The ring buffer size is zero.
    #[error("ring buffer size must be greater than zero")]
    InvalidCapacity,

    /// The ring buffer size would split PCM samples at the wrap point.
    #[error("ring buffer size {size} is not a multiple of the {sample_size}-byte sample size")]
    MisalignedCapacity {
        /// The requested size in bytes.
        size: usize,
        /// Size of one PCM sample in bytes.
        sample_size: usize,
    },

    /// The internal sampling rate is zero.
    #[error("internal sampling rate must be greater than zero")]
    InvalidSamplingRate,
}
