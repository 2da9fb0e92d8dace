//! Routing events for monitoring buffer health.
//!
//! Events are non-fatal notifications. The operation that emitted one has
//! already completed; they exist for logging and metrics, not for error
//! handling.

use std::sync::Arc;

use crate::routing::CallId;

/// Events emitted by a [`MainBuffer`](crate::MainBuffer).
///
/// Callbacks run on the thread that triggered the event, which may be a
/// real-time audio thread. Keep them short and non-blocking. They are always
/// invoked after the routing locks have been released, so a callback may
/// safely call back into the `MainBuffer`.
///
/// # Example
///
/// ```
/// use call_audio::BufferEvent;
///
/// fn handle_event(event: BufferEvent) {
///     match event {
///         BufferEvent::Overflow { call_id, requested, written } => {
///             eprintln!("{call_id}: wrote {written} of {requested} bytes");
///         }
///         BufferEvent::Bound { call_id, peer } => {
///             eprintln!("{call_id} <-> {peer}");
///         }
///         BufferEvent::Unbound { call_id, peer } => {
///             eprintln!("{call_id} -/- {peer}");
///         }
///         BufferEvent::TapAttached { process_id, call_id } => {
///             eprintln!("{process_id} taps {call_id}");
///         }
///         BufferEvent::TapDetached { process_id, call_id } => {
///             eprintln!("{process_id} stopped tapping {call_id}");
///         }
///         BufferEvent::CallRemoved { call_id } => {
///             eprintln!("{call_id} torn down");
///         }
///         BufferEvent::BuffersFlushed { sampling_rate } => {
///             eprintln!("all buffers flushed, now {sampling_rate}Hz");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEvent {
    /// A write was truncated because the slowest reader of the buffer is
    /// too far behind.
    ///
    /// Not emitted for a buffer nobody reads, such as the hardware capture
    /// path before any call is bound.
    Overflow {
        /// Buffer that was written.
        call_id: CallId,
        /// Bytes the producer offered.
        requested: usize,
        /// Bytes actually stored.
        written: usize,
    },

    /// Two legs (or a leg and the hardware path) now exchange audio.
    Bound {
        /// First leg of the binding.
        call_id: CallId,
        /// Second leg of the binding.
        peer: CallId,
    },

    /// Two legs stopped exchanging audio.
    Unbound {
        /// First leg of the binding.
        call_id: CallId,
        /// Second leg of the binding.
        peer: CallId,
    },

    /// A one-way reader (e.g. a recorder) attached to a call's buffer.
    TapAttached {
        /// The reading process.
        process_id: CallId,
        /// The call being read.
        call_id: CallId,
    },

    /// A one-way reader detached from a call's buffer.
    TapDetached {
        /// The reading process.
        process_id: CallId,
        /// The call that was read.
        call_id: CallId,
    },

    /// A call leg's buffer and binding set were released.
    CallRemoved {
        /// The leg that was removed.
        call_id: CallId,
    },

    /// Every buffer was flushed because the internal sampling rate rose.
    BuffersFlushed {
        /// The new internal sampling rate in Hz.
        sampling_rate: u32,
    },
}

/// Callback type for receiving routing events.
///
/// Register one with [`MainBufferBuilder::on_event()`].
///
/// [`MainBufferBuilder::on_event()`]: crate::MainBufferBuilder::on_event
pub type EventCallback = Arc<dyn Fn(BufferEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use call_audio::{event_callback, BufferEvent};
///
/// let callback = event_callback(|event: BufferEvent| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(BufferEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
