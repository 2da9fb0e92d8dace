//! Call routing: who hears whom.
//!
//! Every call leg, plus the local hardware path under
//! [`DEFAULT_ID`], owns a ring buffer and a [`CallIdSet`] naming the legs it
//! listens to. Binding two legs adds each to the other's set and gives each a
//! reader on the other's buffer:
//!
//! ```text
//!              bind_call_id(A)               bind_call_id(B)
//!   mic ──► [audiolayer_id] ──► A, B        A ──► [A] ──┐
//!                                           B ──► [B] ──┴─mix──► speaker
//! ```
//!
//! A reader bound to one leg gets that leg's bytes unchanged; a reader bound
//! to several (a conference) gets their 16-bit PCM mixed.

mod call_id;
mod call_id_set;
mod main_buffer;
mod mix;

pub use call_id::{CallId, DEFAULT_ID};
pub use call_id_set::CallIdSet;
pub use main_buffer::MainBuffer;
pub use mix::{mix_into, SAMPLE_SIZE};
