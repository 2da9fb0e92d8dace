//! Conference mixing of 16-bit PCM held in byte buffers.
//!
//! Ring buffers carry opaque bytes; only mixing interprets them, as
//! native-endian signed 16-bit samples (the daemon's internal PCM format).

/// Size in bytes of one PCM sample.
pub const SAMPLE_SIZE: usize = std::mem::size_of::<i16>();

/// Adds the samples in `head` followed by `tail` onto the samples in `out`.
///
/// The two input slices are the (possibly wrapped) halves of one readable
/// region, so a sample may straddle them. Sums saturate instead of wrapping.
/// Mixing stops at whichever side runs out first; a trailing odd byte is left
/// untouched. Never allocates.
pub fn mix_into(out: &mut [u8], head: &[u8], tail: &[u8]) {
    let mut input = head.iter().chain(tail).copied();

    for frame in out.chunks_exact_mut(SAMPLE_SIZE) {
        let (Some(lo), Some(hi)) = (input.next(), input.next()) else {
            break;
        };
        let current = i16::from_ne_bytes([frame[0], frame[1]]);
        let incoming = i16::from_ne_bytes([lo, hi]);
        frame.copy_from_slice(&current.saturating_add(incoming).to_ne_bytes());
    }
}
