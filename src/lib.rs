//! # call-audio
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Audio routing core for a VoIP daemon.
//!
//! `call-audio` moves 16-bit PCM between the local sound card and any number
//! of call legs. Each leg owns a fixed-size ring buffer with one independent
//! cursor per reader, so the speaker, a bridged peer and a recorder can all
//! drain the same audio at their own pace. Conferences are plain bindings:
//! a reader bound to several legs gets their audio mixed.
//!
//! ## Quick Start
//!
//! ```rust
//! use call_audio::MainBuffer;
//!
//! let main_buffer = MainBuffer::builder()
//!     .ring_buffer_size(32_000)
//!     .on_event(|e| tracing::warn!(?e, "routing event"))
//!     .build()?;
//!
//! // Two remote parties joined to the local user
//! main_buffer.bind_call_id("alice");
//! main_buffer.bind_call_id("bob");
//!
//! // Decoder threads write each party's audio into its own leg
//! main_buffer.put_data_to(&100i16.to_ne_bytes(), "alice");
//! main_buffer.put_data_to(&20i16.to_ne_bytes(), "bob");
//!
//! // The playback thread hears both, mixed
//! let mut out = [0u8; 2];
//! main_buffer.get_data(&mut out);
//! assert_eq!(i16::from_ne_bytes(out), 120);
//! # Ok::<(), call_audio::CallAudioError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Ring buffers** never reallocate and never block the writer. A write is
//!   truncated rather than overtake the slowest reader.
//! - **Routing** is a read-mostly map: bind and unbind take a write lock,
//!   the audio path only a read lock plus the per-leg buffer mutex.
//! - **Events** report overflows and routing changes without ever running
//!   under a lock.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

pub mod buffer;
mod builder;
mod config;
mod error;
mod event;
pub mod routing;
pub mod source;

pub use buffer::RingBuffer;
pub use builder::MainBufferBuilder;
pub use config::{BufferConfig, DEFAULT_RING_BUFFER_SIZE, DEFAULT_SAMPLING_RATE};
pub use error::CallAudioError;
pub use event::{event_callback, BufferEvent, EventCallback};
pub use routing::{CallId, CallIdSet, MainBuffer, DEFAULT_ID};
pub use source::MockFrameSource;
