//! Routing facade owning every call leg's buffer and binding set.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use super::mix::mix_into;
use super::{CallId, CallIdSet, DEFAULT_ID};
use crate::buffer::RingBuffer;
use crate::{BufferConfig, BufferEvent, CallAudioError, EventCallback, MainBufferBuilder};

/// Registry state guarded by the routing lock.
#[derive(Debug)]
struct Routing {
    ring_buffers: HashMap<CallId, Mutex<RingBuffer>>,
    call_id_sets: HashMap<CallId, CallIdSet>,
    sampling_rate: u32,
}

impl Routing {
    fn new(sampling_rate: u32) -> Self {
        Self {
            ring_buffers: HashMap::new(),
            call_id_sets: HashMap::new(),
            sampling_rate,
        }
    }

    fn create_ring_buffer(&mut self, call_id: &CallId, size: usize) -> bool {
        if self.ring_buffers.contains_key(call_id.as_str()) {
            tracing::debug!(%call_id, "ring buffer already exists, ignoring");
            return false;
        }
        let ring_buffer = RingBuffer::with_id(size, call_id.clone());
        self.ring_buffers
            .insert(call_id.clone(), Mutex::new(ring_buffer));
        true
    }

    fn create_call_id_set(&mut self, call_id: &CallId) -> bool {
        if self.call_id_sets.contains_key(call_id.as_str()) {
            tracing::debug!(%call_id, "call id set already exists, ignoring");
            return false;
        }
        self.call_id_sets.insert(call_id.clone(), CallIdSet::new());
        true
    }

    fn ring_buffer_mut(&mut self, call_id: &str) -> Option<&mut RingBuffer> {
        self.ring_buffers.get_mut(call_id).map(|rb| rb.get_mut())
    }

    /// Makes `a` and `b` read each other. Returns `true` if anything changed.
    fn bind(&mut self, a: &CallId, b: &CallId, size: usize) -> bool {
        self.create_ring_buffer(a, size);
        self.create_call_id_set(a);
        self.create_ring_buffer(b, size);
        self.create_call_id_set(b);

        let mut changed = false;
        if let Some(rb) = self.ring_buffer_mut(a.as_str()) {
            changed |= !rb.has_read_pointer(b.as_str());
            rb.create_read_pointer(b);
        }
        if let Some(rb) = self.ring_buffer_mut(b.as_str()) {
            changed |= !rb.has_read_pointer(a.as_str());
            rb.create_read_pointer(a);
        }
        if let Some(set) = self.call_id_sets.get_mut(a.as_str()) {
            changed |= set.insert(b);
        }
        if let Some(set) = self.call_id_sets.get_mut(b.as_str()) {
            changed |= set.insert(a);
        }
        changed
    }

    /// Undoes [`bind`](Self::bind). Returns `true` if anything changed.
    fn unbind(&mut self, a: &str, b: &str) -> bool {
        let mut changed = false;
        if let Some(set) = self.call_id_sets.get_mut(a) {
            changed |= set.remove(b);
        }
        if let Some(set) = self.call_id_sets.get_mut(b) {
            changed |= set.remove(a);
        }
        if let Some(rb) = self.ring_buffer_mut(b) {
            changed |= rb.has_read_pointer(a);
            rb.remove_read_pointer(a);
        }
        if let Some(rb) = self.ring_buffer_mut(a) {
            changed |= rb.has_read_pointer(b);
            rb.remove_read_pointer(b);
        }
        changed
    }

    /// Unbinds `call_id` from every member of its set.
    fn unbind_all(&mut self, call_id: &CallId) -> Vec<BufferEvent> {
        let peers: Vec<CallId> = match self.call_id_sets.get(call_id.as_str()) {
            Some(set) => set.iter().cloned().collect(),
            None => return Vec::new(),
        };

        peers
            .into_iter()
            .filter(|peer| self.unbind(call_id.as_str(), peer.as_str()))
            .map(|peer| BufferEvent::Unbound {
                call_id: call_id.clone(),
                peer,
            })
            .collect()
    }

    fn get_by_id(&self, buf: &mut [u8], call_id: &str, reader_id: &str) -> usize {
        self.ring_buffers
            .get(call_id)
            .map_or(0, |rb| rb.lock().get(buf, reader_id))
    }

    fn avail_for_get_by_id(&self, call_id: &str, reader_id: &str) -> usize {
        if call_id != DEFAULT_ID && call_id == reader_id {
            tracing::warn!(call_id, "ring buffer queried through a read pointer on itself");
        }
        self.ring_buffers
            .get(call_id)
            .map_or(0, |rb| rb.lock().avail_for_get(reader_id))
    }

    fn discard_by_id(&self, len: usize, call_id: &str, reader_id: &str) -> usize {
        self.ring_buffers
            .get(call_id)
            .map_or(0, |rb| rb.lock().discard(len, reader_id))
    }
}

/// The routing facade: owns every call leg's [`RingBuffer`] and [`CallIdSet`].
///
/// Every operation is keyed by call ID. Producers write into their own leg's
/// buffer; consumers read with their own ID as the reader token from the
/// buffers of every leg they are bound to. The reserved
/// [`DEFAULT_ID`](crate::DEFAULT_ID) names the local hardware path, so a
/// plain two-party call is just `bind_call_id(call)`.
///
/// # Locking
///
/// The routing maps sit behind one `RwLock`: bind, unbind, create and remove
/// take it for writing, data-path calls take it for reading. Each ring
/// buffer has its own `Mutex`, so legs on different buffers are written and
/// read in parallel. No lock is ever held across a call to user code, and no
/// data-path operation allocates or blocks on anything but these locks.
///
/// # Failure semantics
///
/// Operations on unknown IDs are no-ops returning `0`, `false` or `None`.
/// Call legs are torn down asynchronously while audio threads are
/// mid-drain, so this is expected rather than exceptional.
///
/// # Example
///
/// ```
/// use call_audio::MainBuffer;
///
/// let main_buffer = MainBuffer::new();
/// main_buffer.bind_call_id("call-1");
///
/// // Decoded network audio for the call...
/// main_buffer.put_data_to(&[1, 0, 2, 0], "call-1");
///
/// // ...is drained by the hardware playback path.
/// let mut out = [0u8; 4];
/// assert_eq!(main_buffer.get_data(&mut out), 4);
/// assert_eq!(out, [1, 0, 2, 0]);
/// ```
pub struct MainBuffer {
    routing: RwLock<Routing>,
    ring_buffer_size: usize,
    event_callback: Option<EventCallback>,
}

impl MainBuffer {
    /// Creates a routing engine with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(BufferConfig::default(), None)
    }

    /// Creates a routing engine with a custom configuration.
    pub fn with_config(config: BufferConfig) -> Result<Self, CallAudioError> {
        config.validate()?;
        Ok(Self::from_parts(config, None))
    }

    /// Returns a builder for configuring a `MainBuffer`.
    pub fn builder() -> MainBufferBuilder {
        MainBufferBuilder::new()
    }

    pub(crate) fn from_parts(config: BufferConfig, event_callback: Option<EventCallback>) -> Self {
        Self {
            routing: RwLock::new(Routing::new(config.internal_sampling_rate)),
            ring_buffer_size: config.ring_buffer_size,
            event_callback,
        }
    }

    fn emit_event(&self, event: BufferEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    fn emit_events(&self, events: Vec<BufferEvent>) {
        for event in events {
            self.emit_event(event);
        }
    }

    /// Returns the capacity given to every new ring buffer.
    pub fn ring_buffer_size(&self) -> usize {
        self.ring_buffer_size
    }

    // Ring buffer registry

    /// Registers a buffer for a call leg.
    ///
    /// Idempotent: if the leg already has a buffer it is kept as is and
    /// `false` is returned.
    pub fn create_ring_buffer(&self, call_id: impl Into<CallId>) -> bool {
        let call_id = call_id.into();
        self.routing
            .write()
            .create_ring_buffer(&call_id, self.ring_buffer_size)
    }

    /// Runs `f` on a call leg's buffer, or returns `None` if it has none.
    ///
    /// The buffer is only reachable for the duration of `f`, while the
    /// routing lock is held, so it can never be used after removal. Do not
    /// call back into this `MainBuffer` from `f`.
    pub fn with_ring_buffer<R>(
        &self,
        call_id: &str,
        f: impl FnOnce(&mut RingBuffer) -> R,
    ) -> Option<R> {
        let routing = self.routing.read();
        let ring_buffer = routing.ring_buffers.get(call_id)?;
        let mut guard = ring_buffer.lock();
        Some(f(&mut *guard))
    }

    /// Returns `true` if the call leg has a buffer.
    pub fn has_ring_buffer(&self, call_id: &str) -> bool {
        self.routing.read().ring_buffers.contains_key(call_id)
    }

    /// Returns the number of registered buffers.
    pub fn ring_buffer_count(&self) -> usize {
        self.routing.read().ring_buffers.len()
    }

    /// Releases a call leg's buffer. Returns `false` if it had none.
    pub fn remove_ring_buffer(&self, call_id: &str) -> bool {
        let removed = self.routing.write().ring_buffers.remove(call_id).is_some();
        if !removed {
            tracing::debug!(call_id, "ring buffer does not exist");
        }
        removed
    }

    // Binding set registry

    /// Registers an empty binding set for a call leg. Idempotent.
    pub fn create_call_id_set(&self, call_id: impl Into<CallId>) -> bool {
        let call_id = call_id.into();
        self.routing.write().create_call_id_set(&call_id)
    }

    /// Returns a snapshot of a call leg's binding set.
    pub fn call_id_set(&self, call_id: &str) -> Option<CallIdSet> {
        self.routing.read().call_id_sets.get(call_id).cloned()
    }

    /// Returns the number of registered binding sets.
    pub fn call_id_set_count(&self) -> usize {
        self.routing.read().call_id_sets.len()
    }

    /// Releases a call leg's binding set. Returns `false` if it had none.
    pub fn remove_call_id_set(&self, call_id: &str) -> bool {
        let removed = self.routing.write().call_id_sets.remove(call_id).is_some();
        if !removed {
            tracing::debug!(call_id, "call id set does not exist");
        }
        removed
    }

    /// Adds `call_id` to the set of `set_id`. Returns `false` if `set_id`
    /// has no set.
    pub fn add_call_id_to_set(&self, set_id: &str, call_id: impl Into<CallId>) -> bool {
        match self.routing.write().call_id_sets.get_mut(set_id) {
            Some(set) => {
                set.insert(call_id);
                true
            }
            None => false,
        }
    }

    /// Removes `call_id` from the set of `set_id`. Returns `false` if it
    /// was not a member.
    pub fn remove_call_id_from_set(&self, set_id: &str, call_id: &str) -> bool {
        self.routing
            .write()
            .call_id_sets
            .get_mut(set_id)
            .is_some_and(|set| set.remove(call_id))
    }

    // Binding

    /// Binds a call leg to the hardware path.
    ///
    /// Playback then drains the leg's decoded audio and the leg's encoder
    /// drains captured microphone audio.
    pub fn bind_call_id(&self, call_id: impl Into<CallId>) {
        self.bind_call_ids(call_id, CallId::default_id());
    }

    /// Binds two call legs so each reads the other's buffer.
    ///
    /// Missing buffers and sets are created. Binding an already bound pair
    /// changes nothing, and a leg is never bound to itself.
    pub fn bind_call_ids(&self, call_id1: impl Into<CallId>, call_id2: impl Into<CallId>) {
        let (a, b) = (call_id1.into(), call_id2.into());
        if a == b {
            tracing::warn!(call_id = %a, "refusing to bind a call to itself");
            return;
        }

        let changed = self.routing.write().bind(&a, &b, self.ring_buffer_size);
        if changed {
            tracing::debug!(call_id = %a, peer = %b, "bound");
            self.emit_event(BufferEvent::Bound {
                call_id: a,
                peer: b,
            });
        }
    }

    /// Unbinds a call leg from the hardware path.
    pub fn unbind_call_id(&self, call_id: &str) {
        self.unbind_call_ids(call_id, DEFAULT_ID);
    }

    /// Stops two call legs reading each other. No-op if they are not bound.
    ///
    /// Buffers are kept; release them with [`remove_call`](Self::remove_call).
    pub fn unbind_call_ids(&self, call_id1: &str, call_id2: &str) {
        let changed = self.routing.write().unbind(call_id1, call_id2);
        if changed {
            tracing::debug!(call_id = call_id1, peer = call_id2, "unbound");
            self.emit_event(BufferEvent::Unbound {
                call_id: CallId::new(call_id1),
                peer: CallId::new(call_id2),
            });
        }
    }

    /// Lets `process_id` read `call_id`'s buffer without sending anything back.
    ///
    /// Used by recorders. Returns `false` (and does nothing) if `call_id` has
    /// no buffer or if both IDs are the same leg. Attaching an existing tap
    /// again returns `true` without emitting another event.
    pub fn bind_half_duplex_out(
        &self,
        process_id: impl Into<CallId>,
        call_id: impl Into<CallId>,
    ) -> bool {
        let (process_id, call_id) = (process_id.into(), call_id.into());
        if process_id == call_id {
            tracing::warn!(%call_id, "refusing to tap a call into itself");
            return false;
        }

        let changed = {
            let mut routing = self.routing.write();
            let Some(rb) = routing.ring_buffer_mut(call_id.as_str()) else {
                return false;
            };
            let mut changed = !rb.has_read_pointer(process_id.as_str());
            rb.create_read_pointer(&process_id);
            routing.create_call_id_set(&process_id);
            if let Some(set) = routing.call_id_sets.get_mut(process_id.as_str()) {
                changed |= set.insert(&call_id);
            }
            changed
        };

        if changed {
            self.emit_event(BufferEvent::TapAttached {
                process_id,
                call_id,
            });
        }
        true
    }

    /// Detaches a one-way reader. The reader's set is released once empty.
    pub fn unbind_half_duplex_out(&self, process_id: &str, call_id: &str) {
        let changed = {
            let mut routing = self.routing.write();
            let mut changed = false;
            if let Some(set) = routing.call_id_sets.get_mut(process_id) {
                changed |= set.remove(call_id);
                if set.is_empty() {
                    routing.call_id_sets.remove(process_id);
                }
            }
            if let Some(rb) = routing.ring_buffer_mut(call_id) {
                changed |= rb.has_read_pointer(process_id);
                rb.remove_read_pointer(process_id);
            }
            changed
        };

        if changed {
            self.emit_event(BufferEvent::TapDetached {
                process_id: CallId::new(process_id),
                call_id: CallId::new(call_id),
            });
        }
    }

    /// Unbinds a call leg from every leg in its set.
    pub fn unbind_all(&self, call_id: impl Into<CallId>) {
        let call_id = call_id.into();
        let events = self.routing.write().unbind_all(&call_id);
        self.emit_events(events);
    }

    /// Tears a call leg down: unbinds it everywhere and releases its buffer
    /// and set. Returns `false` if the leg had neither.
    pub fn remove_call(&self, call_id: impl Into<CallId>) -> bool {
        let call_id = call_id.into();
        let (mut events, removed) = {
            let mut routing = self.routing.write();
            let events = routing.unbind_all(&call_id);

            // One-way readers of this leg hold it in their own sets
            let mut emptied = Vec::new();
            for (id, set) in &mut routing.call_id_sets {
                if set.remove(call_id.as_str()) && set.is_empty() {
                    emptied.push(id.clone());
                }
            }
            for id in emptied {
                if !routing.ring_buffers.contains_key(id.as_str()) {
                    routing.call_id_sets.remove(id.as_str());
                }
            }

            let had_buffer = routing.ring_buffers.remove(call_id.as_str()).is_some();
            let had_set = routing.call_id_sets.remove(call_id.as_str()).is_some();
            (events, had_buffer || had_set)
        };

        if removed {
            tracing::info!(%call_id, "call removed");
            events.push(BufferEvent::CallRemoved { call_id });
        }
        self.emit_events(events);
        removed
    }

    // Data path

    /// Writes captured hardware audio. See [`put_data_to`](Self::put_data_to).
    pub fn put_data(&self, data: &[u8]) -> usize {
        self.put_data_to(data, DEFAULT_ID)
    }

    /// Writes into a call leg's buffer and returns the number of bytes stored.
    ///
    /// A short count means the slowest reader of the leg is too far behind;
    /// an [`Overflow`](BufferEvent::Overflow) event is emitted. A full buffer
    /// with no reader at all truncates silently. Unknown legs store nothing.
    pub fn put_data_to(&self, data: &[u8], call_id: &str) -> usize {
        let routing = self.routing.read();
        let Some((id, rb)) = routing.ring_buffers.get_key_value(call_id) else {
            tracing::trace!(call_id, "put to unknown call id ignored");
            return 0;
        };

        let (written, unread) = {
            let mut rb = rb.lock();
            (rb.put(data), rb.has_no_read_pointers())
        };
        // Nobody drains an unbound buffer, so it stays full until a reader attaches
        let overflow = (written < data.len() && !unread).then(|| BufferEvent::Overflow {
            call_id: id.clone(),
            requested: data.len(),
            written,
        });
        drop(routing);

        if let Some(event) = overflow {
            self.emit_event(event);
        }
        written
    }

    /// Reads audio for the hardware playback path. See [`get_data_for`](Self::get_data_for).
    pub fn get_data(&self, buf: &mut [u8]) -> usize {
        self.get_data_for(buf, DEFAULT_ID)
    }

    /// Reads audio for `reader_id` from every leg it is bound to.
    ///
    /// With a single bound leg the bytes are copied as is. With several
    /// (a conference), `buf` is zero-filled and each leg's audio is mixed in
    /// as 16-bit PCM. Returns the largest number of bytes read from any leg;
    /// 0 if `reader_id` is bound to nothing.
    pub fn get_data_for(&self, buf: &mut [u8], reader_id: &str) -> usize {
        let routing = self.routing.read();
        let Some(set) = routing.call_id_sets.get(reader_id) else {
            return 0;
        };

        if let Some(member) = set.single() {
            return routing.get_by_id(buf, member.as_str(), reader_id);
        }

        buf.fill(0);
        let mut size = 0;
        for member in set {
            let Some(rb) = routing.ring_buffers.get(member.as_str()) else {
                continue;
            };
            let mut rb = rb.lock();
            let (head, tail) = rb.readable(buf.len(), reader_id);
            let read = head.len() + tail.len();
            mix_into(buf, head, tail);
            rb.discard(read, reader_id);
            size = size.max(read);
        }
        size
    }

    /// Reads one leg's buffer through an explicit reader token.
    pub fn get_data_by_id(&self, buf: &mut [u8], call_id: &str, reader_id: &str) -> usize {
        self.routing.read().get_by_id(buf, call_id, reader_id)
    }

    /// Returns how much the hardware capture path can write.
    pub fn avail_for_put(&self) -> usize {
        self.avail_for_put_to(DEFAULT_ID)
    }

    /// Returns how much can be written into a call leg's buffer.
    pub fn avail_for_put_to(&self, call_id: &str) -> usize {
        self.routing
            .read()
            .ring_buffers
            .get(call_id)
            .map_or(0, |rb| rb.lock().avail_for_put())
    }

    /// Returns how much the hardware playback path can read.
    pub fn avail_for_get(&self) -> usize {
        self.avail_for_get_for(DEFAULT_ID)
    }

    /// Returns how much `reader_id` can read from the legs it is bound to.
    ///
    /// With several bound legs, this is the smallest non-zero amount, so a
    /// mixed read of that size draws real audio from every leg that has any.
    pub fn avail_for_get_for(&self, reader_id: &str) -> usize {
        let routing = self.routing.read();
        let Some(set) = routing.call_id_sets.get(reader_id) else {
            return 0;
        };

        if let Some(member) = set.single() {
            return routing.avail_for_get_by_id(member.as_str(), reader_id);
        }

        set.iter()
            .map(|member| routing.avail_for_get_by_id(member.as_str(), reader_id))
            .filter(|&avail| avail != 0)
            .min()
            .unwrap_or(0)
    }

    /// Returns how much `reader_id` can read from one leg's buffer.
    pub fn avail_for_get_by_id(&self, call_id: &str, reader_id: &str) -> usize {
        self.routing.read().avail_for_get_by_id(call_id, reader_id)
    }

    /// Skips audio on the hardware playback path. See [`discard_for`](Self::discard_for).
    pub fn discard(&self, len: usize) -> usize {
        self.discard_for(len, DEFAULT_ID)
    }

    /// Skips up to `len` bytes for `reader_id` on every leg it is bound to.
    ///
    /// Returns the largest number of bytes skipped on any leg.
    pub fn discard_for(&self, len: usize, reader_id: &str) -> usize {
        let routing = self.routing.read();
        let Some(set) = routing.call_id_sets.get(reader_id) else {
            return 0;
        };

        set.iter()
            .map(|member| routing.discard_by_id(len, member.as_str(), reader_id))
            .max()
            .unwrap_or(0)
    }

    /// Skips up to `len` bytes of one leg's buffer for an explicit reader.
    pub fn discard_by_id(&self, len: usize, call_id: &str, reader_id: &str) -> usize {
        self.routing.read().discard_by_id(len, call_id, reader_id)
    }

    /// Catches `reader_id` up with the writer on every leg it is bound to.
    pub fn flush_for(&self, reader_id: &str) {
        let routing = self.routing.read();
        let Some(set) = routing.call_id_sets.get(reader_id) else {
            return;
        };
        for member in set {
            if let Some(rb) = routing.ring_buffers.get(member.as_str()) {
                rb.lock().flush_reader(reader_id);
            }
        }
    }

    /// Catches one reader up with the writer on one leg's buffer.
    pub fn flush_by_id(&self, call_id: &str, reader_id: &str) {
        if let Some(rb) = self.routing.read().ring_buffers.get(call_id) {
            rb.lock().flush_reader(reader_id);
        }
    }

    /// Drops all buffered audio on every leg and rewinds every cursor.
    pub fn flush_all_buffers(&self) {
        for rb in self.routing.read().ring_buffers.values() {
            rb.lock().flush();
        }
    }

    // Sampling rate

    /// Returns the sampling rate shared by every buffer.
    pub fn internal_sampling_rate(&self) -> u32 {
        self.routing.read().sampling_rate
    }

    /// Raises the shared sampling rate, flushing every buffer.
    ///
    /// Audio already buffered is at the old rate and would play back wrong.
    /// Lower or equal rates are ignored: the engine keeps running at the
    /// highest rate any participant needs.
    pub fn set_internal_sampling_rate(&self, sampling_rate: u32) {
        {
            let mut routing = self.routing.write();
            if sampling_rate <= routing.sampling_rate {
                return;
            }
            for rb in routing.ring_buffers.values_mut() {
                rb.get_mut().flush();
            }
            routing.sampling_rate = sampling_rate;
        }

        tracing::debug!(sampling_rate, "internal sampling rate raised, buffers flushed");
        self.emit_event(BufferEvent::BuffersFlushed { sampling_rate });
    }

    // Diagnostics

    /// Logs every binding set and every buffer's readers at debug level.
    pub fn dump_info(&self) {
        let routing = self.routing.read();

        for (call_id, set) in &routing.call_id_sets {
            let members: Vec<&str> = set.iter().map(CallId::as_str).collect();
            tracing::debug!(%call_id, bound_to = ?members, "call");
        }

        for (call_id, rb) in &routing.ring_buffers {
            let rb = rb.lock();
            let readers: Vec<&str> = rb.read_pointers().map(CallId::as_str).collect();
            tracing::debug!(
                %call_id,
                read_pointers = ?readers,
                put_len = rb.put_len(),
                "buffer"
            );
        }
    }
}

impl Default for MainBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MainBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainBuffer")
            .field("routing", &*self.routing.read())
            .field("ring_buffer_size", &self.ring_buffer_size)
            .field("has_event_callback", &self.event_callback.is_some())
            .finish()
    }
}
