//! Per-slot publication sequence.
//!
//! The semaphore triad rations slot OWNERSHIP, but with several producers
//! in flight a `slots_used` post can belong to a later ticket than the one
//! the consumer reads next. The slot's own sequence word closes that gap:
//! the consumer only copies the payload once the writer for its ticket has
//! finished, so FIFO consumption never observes a torn record.

use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

/// One ring slot: a publication sequence plus the record payload.
///
/// `T` must be `Copy` so records cross the process boundary as plain bytes.
/// Cache-line aligned to keep neighbouring slots from false sharing.
#[repr(C, align(64))]
pub struct Slot<T: Copy> {
    /// `ticket + 1` of the last completed write; 0 means never written.
    seq: AtomicU64,
    data: MaybeUninit<T>,
}

impl<T: Copy> Slot<T> {
    #[inline(always)]
    pub fn init(&mut self) {
        self.seq.store(0, Ordering::Relaxed);
    }

    /// Completes the write for `ticket`.
    ///
    /// The caller owns this slot exclusively: it holds a `slots_free`
    /// permit and tickets are unique, so two writers of the same physical
    /// slot are `capacity` tickets apart and serialized by the consumer's
    /// `slots_free` posts in between.
    #[inline(always)]
    pub fn publish(&mut self, ticket: u64, value: T) {
        // SAFETY: exclusive ownership per the permit protocol above.
        unsafe { self.data.as_mut_ptr().write(value) };
        // Release pairs with the Acquire in `read`: the payload is visible
        // before the ticket is.
        self.seq.store(ticket + 1, Ordering::Release);
    }

    /// Copies out the record for `ticket`, waiting for its writer to finish.
    ///
    /// The caller holds a `slots_used` permit, which proves some write
    /// completed; the writer for THIS ticket is at worst mid-copy, so the
    /// spin is normally a handful of iterations. It does busy-wait for as
    /// long as that one writer stays descheduled mid-publish, even while
    /// later writers keep completing; accepted trade-off over a per-slot
    /// blocking primitive.
    #[inline(always)]
    pub fn read(&self, ticket: u64) -> T {
        while self.seq.load(Ordering::Acquire) < ticket + 1 {
            std::hint::spin_loop();
        }
        // SAFETY: the sequence check above proves the writer initialized
        // the payload for this ticket before its Release store.
        unsafe { self.data.as_ptr().read() }
    }
}
