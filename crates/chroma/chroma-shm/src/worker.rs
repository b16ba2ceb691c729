//! The producer-side handle. Opens, never creates.

use crate::error::ShmError;
use crate::ring::seq_to_index;
use crate::shm_layout::{ShmHeader, slots_offset};
use crate::slot::Slot;
use chroma_mmap::MmapFileMut;
use std::marker::PhantomData;
use std::mem::size_of;
use std::path::Path;
use std::sync::atomic::Ordering;

/// One generator's handle onto the shared region.
///
/// Attaching validates the header and registers the worker in the shared
/// control block, so the coordinator's shutdown fan-out accounts for it
/// before its first publish.
pub struct Worker<T: Copy> {
    /// Owns the mapping lifetime; all access goes through `base`.
    _mm: MmapFileMut,
    base: *mut u8,
    mask: u64,
    _pd: PhantomData<T>,
}

// The raw pointers target the mapping the handle itself owns.
unsafe impl<T: Copy + Send> Send for Worker<T> {}

impl<T: Copy> Worker<T> {
    /// Opens an existing region and registers this worker.
    ///
    /// Fails with a typed error when the region is absent or its header
    /// does not match (`T`'s size included); the caller treats every case
    /// as fatal.
    pub fn attach<P: AsRef<Path>>(path: P) -> Result<Self, ShmError> {
        let mut mm = MmapFileMut::open_rw(path)?;
        if mm.len() < size_of::<ShmHeader>() {
            return Err(ShmError::BadMagic);
        }
        let base = mm.as_mut_ptr();

        // SAFETY: length checked above; validate() decides whether these
        // bytes are actually a chroma header before anything is trusted.
        let h = unsafe { &*(base as *const ShmHeader) };
        h.validate::<T>()?;
        let mask = h.capacity - 1;

        // Registration happens under guard, before any publish, so the
        // fan-out count can never miss a live worker.
        h.guard.wait()?;
        h.worker_count.fetch_add(1, Ordering::Relaxed);
        h.guard.post()?;

        Ok(Self {
            _mm: mm,
            base,
            mask,
            _pd: PhantomData,
        })
    }

    #[inline(always)]
    fn header(&self) -> &ShmHeader {
        // SAFETY: validated at attach time.
        unsafe { &*(self.base as *const ShmHeader) }
    }

    #[inline(always)]
    fn slot_mut(&mut self, idx: u64) -> &mut Slot<T> {
        // SAFETY: idx is masked to capacity bounds by the caller; the
        // permit protocol makes the access exclusive and the offset keeps
        // the reference slot-aligned.
        let slots = unsafe { self.base.add(slots_offset::<T>()) as *mut Slot<T> };
        unsafe { &mut *slots.add(idx as usize) }
    }

    /// True once the coordinator has begun shutdown.
    ///
    /// Polled once per iteration, outside any critical section; the
    /// Acquire load pairs with the coordinator's Release store.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.header().shutdown.load(Ordering::Acquire) != 0
    }

    /// Publishes one record, blocking while the ring is full.
    ///
    /// The `slots_free` permit plus the unique ticket make this worker the
    /// exclusive owner of one physical slot; once the permit is claimed
    /// the write always runs to completion (no mid-operation cancel).
    pub fn publish(&mut self, value: T) -> Result<(), ShmError> {
        self.header().slots_free.wait()?;
        let ticket = self.header().write_seq.fetch_add(1, Ordering::Relaxed);
        let idx = seq_to_index(ticket, self.mask);
        self.slot_mut(idx).publish(ticket, value);
        self.header().slots_used.post()?;
        Ok(())
    }
}
