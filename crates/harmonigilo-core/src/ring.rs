//! Fixed-capacity ring storage for a mono sample stream
//!
//! Wrap-safe block put/get with relative addressing. Capacity is fixed at
//! construction (max delay × sample rate plus block headroom) and never grows,
//! so the per-block path stays allocation-free.

use crate::types::Sample;

/// Ring buffer over an owned, fixed-capacity sample arena.
///
/// Two cursors, both always in `[0, capacity)`: the write cursor advances with
/// `put`, the read cursor with `take`. Keeping the write cursor from outrunning
/// unread data is the caller's responsibility; the only hard precondition is
/// that a single `put` never exceeds capacity.
#[derive(Debug)]
pub struct SampleRing {
    data: Box<[Sample]>,
    write_pos: usize,
    read_pos: usize,
}

impl SampleRing {
    /// Create a ring of the given capacity, zero-filled
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be nonzero");
        Self {
            data: vec![0.0; capacity].into_boxed_slice(),
            write_pos: 0,
            read_pos: 0,
        }
    }

    /// Fixed capacity in samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Zero the storage and reset both cursors
    pub fn reset(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
    }

    /// Copy `src` into the ring at the write cursor, wrapping at capacity.
    ///
    /// Panics if `src` is longer than the capacity; that is a programming
    /// error, not a recoverable condition.
    pub fn put(&mut self, src: &[Sample]) {
        let len = src.len();
        assert!(len <= self.capacity(), "single ring write exceeds capacity");

        let first = (self.capacity() - self.write_pos).min(len);
        self.data[self.write_pos..self.write_pos + first].copy_from_slice(&src[..first]);
        self.data[..len - first].copy_from_slice(&src[first..]);
        self.write_pos = self.wrapped(self.write_pos, len as isize);
    }

    /// Copy `dst.len()` samples starting at `(write_pos + offset) mod capacity`
    /// into `dst`, wrapping across the end. Does not move either cursor.
    ///
    /// A negative offset reads behind the write cursor; this is how delayed
    /// data and latency-compensated dry data are fetched.
    pub fn get_relative(&self, offset: isize, dst: &mut [Sample]) {
        let len = dst.len();
        assert!(len <= self.capacity(), "single ring read exceeds capacity");

        let start = self.wrapped(self.write_pos, offset);
        let first = (self.capacity() - start).min(len);
        dst[..first].copy_from_slice(&self.data[start..start + first]);
        dst[first..].copy_from_slice(&self.data[..len - first]);
    }

    /// Consume `dst.len()` samples at the read cursor, advancing it.
    pub fn take(&mut self, dst: &mut [Sample]) {
        let len = dst.len();
        assert!(len <= self.capacity(), "single ring read exceeds capacity");

        let first = (self.capacity() - self.read_pos).min(len);
        dst[..first].copy_from_slice(&self.data[self.read_pos..self.read_pos + first]);
        dst[first..].copy_from_slice(&self.data[..len - first]);
        self.read_pos = self.wrapped(self.read_pos, len as isize);
    }

    #[inline]
    fn wrapped(&self, base: usize, offset: isize) -> usize {
        let cap = self.capacity() as isize;
        let pos = (base as isize + offset) % cap;
        if pos < 0 {
            (pos + cap) as usize
        } else {
            pos as usize
        }
    }
}
