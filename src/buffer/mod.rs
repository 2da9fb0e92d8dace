//! Per-call audio storage.
//!
//! Each call leg owns one [`RingBuffer`]. The leg's producer writes into it
//! and every consumer bound to the leg reads through its own cursor:
//!
//! ```text
//! decode thread ──put──► RingBuffer(call) ──get("audiolayer_id")──► playback
//!                                         └─get("peer")───────────► peer leg
//! ```
//!
//! The slowest cursor bounds the writer, so no reader ever loses audio it
//! has not consumed and the writer never blocks.

mod ring_buffer;

pub use ring_buffer::RingBuffer;
