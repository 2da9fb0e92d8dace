//! Fixed-capacity circular byte buffer with named, independently paced readers.

use std::collections::HashMap;

use crate::routing::CallId;

/// Number of reader slots reserved up front. Covers a leg bound to the
/// hardware path plus a handful of conference peers without rehashing.
const INITIAL_READERS: usize = 4;

/// A circular byte buffer with one writer and any number of named readers.
///
/// Every reader owns a cursor that only ever moves forward (until a flush).
/// The writer is throttled by the slowest reader: it can never overwrite
/// bytes that some registered reader has not consumed yet. Advancing one
/// reader never changes what another reader sees.
///
/// All cursors are absolute byte positions since the last [`flush`]; the
/// physical slot of a position is `position % capacity`. They are `usize`,
/// so on 32-bit targets a buffer must be flushed before 4 GiB have passed
/// through it (about 6 hours of 48kHz 16-bit stereo). Call setup flushes, and
/// so does every sampling-rate change.
///
/// When no reader is registered, the *origin* cursor stands in for the
/// slowest reader. It is 0 after creation or a flush, and takes the position
/// of the last reader removed. Audio written to an unbound buffer is
/// therefore retained (and eventually throttled) rather than silently
/// discarded. The origin is writer-side accounting only: nothing ever reads
/// through it, and [`avail_for_get`] reports 0 for any unregistered token.
///
/// # Example
///
/// ```
/// use call_audio::{CallId, RingBuffer};
///
/// let mut rb = RingBuffer::new(64);
/// let playback = CallId::default_id();
/// rb.create_read_pointer(playback.clone());
///
/// assert_eq!(rb.put(&[1, 2, 3, 4]), 4);
///
/// let mut out = [0u8; 4];
/// assert_eq!(rb.get(&mut out, playback.as_str()), 4);
/// assert_eq!(out, [1, 2, 3, 4]);
/// ```
///
/// [`flush`]: RingBuffer::flush
/// [`avail_for_get`]: RingBuffer::avail_for_get
pub struct RingBuffer {
    id: CallId,
    data: Box<[u8]>,
    write_cursor: usize,
    origin: usize,
    read_pointers: HashMap<CallId, usize>,
}

impl RingBuffer {
    /// Creates an anonymous buffer holding `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_id(capacity, CallId::new(""))
    }

    /// Creates a buffer owned by the given call leg.
    pub fn with_id(capacity: usize, id: impl Into<CallId>) -> Self {
        Self {
            id: id.into(),
            data: vec![0u8; capacity].into_boxed_slice(),
            write_cursor: 0,
            origin: 0,
            read_pointers: HashMap::with_capacity(INITIAL_READERS),
        }
    }

    /// Returns the ID of the call leg that owns this buffer.
    pub fn id(&self) -> &CallId {
        &self.id
    }

    /// Returns the size of the backing store in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the absolute write position.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    // Read pointer management

    /// Registers a reader positioned at the current write cursor.
    ///
    /// A new reader only sees audio written after it attached. Registering a
    /// token that already exists leaves its cursor untouched.
    pub fn create_read_pointer(&mut self, token: impl Into<CallId>) {
        let write_cursor = self.write_cursor;
        self.read_pointers
            .entry(token.into())
            .or_insert(write_cursor);
    }

    /// Removes a reader. Unknown tokens are ignored.
    pub fn remove_read_pointer(&mut self, token: &str) {
        if let Some(cursor) = self.read_pointers.remove(token) {
            if self.read_pointers.is_empty() {
                self.origin = cursor;
            }
        }
    }

    /// Returns the cursor of a reader, or `None` if the token is unknown.
    pub fn read_pointer(&self, token: &str) -> Option<usize> {
        self.read_pointers.get(token).copied()
    }

    /// Moves a reader to an explicit position.
    ///
    /// The position is clamped to the bytes still held by the store
    /// (`write_cursor - capacity ..= write_cursor`). Unknown tokens are
    /// ignored.
    pub fn store_read_pointer(&mut self, position: usize, token: &str) {
        let low = self.write_cursor.saturating_sub(self.capacity());
        let high = self.write_cursor;
        if let Some(cursor) = self.read_pointers.get_mut(token) {
            *cursor = position.clamp(low, high);
        }
    }

    /// Returns `true` if the token has a cursor on this buffer.
    pub fn has_read_pointer(&self, token: &str) -> bool {
        self.read_pointers.contains_key(token)
    }

    /// Returns the number of registered readers.
    pub fn read_pointer_count(&self) -> usize {
        self.read_pointers.len()
    }

    /// Returns `true` if nobody reads from this buffer.
    pub fn has_no_read_pointers(&self) -> bool {
        self.read_pointers.is_empty()
    }

    /// Iterates over the tokens of all registered readers.
    pub fn read_pointers(&self) -> impl Iterator<Item = &CallId> {
        self.read_pointers.keys()
    }

    /// Returns the position of the slowest reader (or the origin if none).
    pub fn smallest_read_pointer(&self) -> usize {
        self.read_pointers
            .values()
            .min()
            .copied()
            .unwrap_or(self.origin)
    }

    // Accounting

    /// Returns how many bytes can be written without overrunning the slowest reader.
    pub fn avail_for_put(&self) -> usize {
        self.capacity() - self.put_len()
    }

    /// Returns how many bytes are held back for the slowest reader.
    pub fn put_len(&self) -> usize {
        self.write_cursor - self.smallest_read_pointer()
    }

    /// Returns how many bytes the given reader has not consumed yet.
    ///
    /// Unknown tokens have nothing to read.
    pub fn avail_for_get(&self, token: &str) -> usize {
        self.read_pointer(token)
            .map_or(0, |cursor| self.write_cursor - cursor)
    }

    /// Alias of [`avail_for_get`](Self::avail_for_get).
    pub fn get_len(&self, token: &str) -> usize {
        self.avail_for_get(token)
    }

    // Data path

    /// Appends as much of `data` as fits and returns the number of bytes written.
    ///
    /// A short count is the backpressure signal: the slowest reader is too
    /// far behind. Nothing already written is ever overwritten.
    pub fn put(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.avail_for_put());
        if len < data.len() {
            tracing::trace!(
                call_id = %self.id,
                requested = data.len(),
                written = len,
                "ring buffer full, truncating write"
            );
        }
        if len == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let start = self.write_cursor % capacity;
        let first = len.min(capacity - start);
        self.data[start..start + first].copy_from_slice(&data[..first]);
        self.data[..len - first].copy_from_slice(&data[first..len]);

        self.write_cursor += len;
        len
    }

    /// Copies up to `buf.len()` bytes for the given reader and advances its cursor.
    ///
    /// Returns the number of bytes copied; 0 for unknown tokens.
    pub fn get(&mut self, buf: &mut [u8], token: &str) -> usize {
        let (head, tail) = self.readable(buf.len(), token);
        let len = head.len() + tail.len();
        buf[..head.len()].copy_from_slice(head);
        buf[head.len()..len].copy_from_slice(tail);

        self.advance(len, token)
    }

    /// Advances the given reader by up to `len` bytes without copying.
    ///
    /// Cursor and accounting effects are identical to [`get`](Self::get).
    pub fn discard(&mut self, len: usize, token: &str) -> usize {
        let len = len.min(self.avail_for_get(token));
        self.advance(len, token)
    }

    /// Borrows up to `len` unread bytes for the given reader without consuming them.
    ///
    /// The bytes come back as two slices because the readable region may wrap
    /// around the end of the store; the second slice is empty otherwise.
    pub fn readable(&self, len: usize, token: &str) -> (&[u8], &[u8]) {
        let len = len.min(self.avail_for_get(token));
        if len == 0 {
            return (&[], &[]);
        }

        let Some(cursor) = self.read_pointer(token) else {
            return (&[], &[]);
        };
        let capacity = self.capacity();
        let start = cursor % capacity;
        let first = len.min(capacity - start);

        (&self.data[start..start + first], &self.data[..len - first])
    }

    fn advance(&mut self, len: usize, token: &str) -> usize {
        match self.read_pointers.get_mut(token) {
            Some(cursor) => {
                *cursor += len;
                len
            }
            None => 0,
        }
    }

    // Reset

    /// Drops all buffered audio and rewinds every cursor to 0.
    ///
    /// Used when a call (re)connects so stale audio is not replayed.
    pub fn flush(&mut self) {
        self.write_cursor = 0;
        self.origin = 0;
        for cursor in self.read_pointers.values_mut() {
            *cursor = 0;
        }
    }

    /// Catches one reader up with the writer, dropping what it has not read.
    pub fn flush_reader(&mut self, token: &str) {
        let write_cursor = self.write_cursor;
        if let Some(cursor) = self.read_pointers.get_mut(token) {
            *cursor = write_cursor;
        }
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("write_cursor", &self.write_cursor)
            .field("origin", &self.origin)
            .field("read_pointers", &self.read_pointers)
            .finish_non_exhaustive()
    }
}
