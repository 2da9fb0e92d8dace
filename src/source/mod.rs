//! Synthetic audio sources for driving a `MainBuffer` without hardware.

mod mock;

pub use mock::MockFrameSource;
