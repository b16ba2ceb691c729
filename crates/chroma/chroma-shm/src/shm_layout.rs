//! Binary layout of the shared region.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ ShmHeader                                                     │
//! │   magic · version · capacity · elem_size                      │
//! │   write_seq (atomic ticket counter)                           │
//! │   shutdown flag · worker_count                                │
//! │   slots_used · slots_free · guard   (semaphore triad)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Slot<T>[0] … Slot<T>[capacity-1]                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! `repr(C)` end to end: every process maps the same file and walks the
//! same offsets.

use crate::error::ShmError;
use crate::sem::Semaphore;
use crate::slot::Slot;
use std::mem::{align_of, size_of};
use std::sync::atomic::{AtomicU32, AtomicU64};

/// ASCII "CHROMA3C"; rejects maps of files that are not a chroma region.
pub const SHM_MAGIC: u64 = 0x4348_524F_4D41_3343;

/// Bumped on any incompatible layout change.
pub const SHM_VERSION: u64 = 1;

/// Control block at offset 0 of the mapped region.
#[repr(C)]
pub struct ShmHeader {
    /// Must equal [`SHM_MAGIC`].
    pub magic: u64,

    /// Must equal [`SHM_VERSION`].
    pub version: u64,

    /// Slot count; power of two.
    pub capacity: u64,

    /// `size_of` one record, checked against the attaching type.
    pub elem_size: u64,

    /// Shared write cursor. `fetch_add` hands every producer a unique
    /// ticket, which is what makes slot ownership exclusive per permit.
    pub write_seq: AtomicU64,

    /// Termination flag. Stored (Release) under `guard` by the
    /// coordinator; producers poll it with an Acquire load outside any
    /// critical section.
    pub shutdown: AtomicU32,

    /// Registered producer count. Mutated only under `guard`; read by the
    /// coordinator during the shutdown fan-out.
    pub worker_count: AtomicU32,

    /// Completed, unread records ("filled"). Init 0.
    pub slots_used: Semaphore,

    /// Writable slots ("empty"). Init `capacity`.
    pub slots_free: Semaphore,

    /// Mutual exclusion over the control block fields above. Init 1.
    /// Never held across a wait on `slots_used`/`slots_free`.
    pub guard: Semaphore,
}

impl ShmHeader {
    /// Validates a freshly mapped header before it is trusted.
    pub fn validate<T: Copy>(&self) -> Result<(), ShmError> {
        if self.magic != SHM_MAGIC {
            return Err(ShmError::BadMagic);
        }
        if self.version != SHM_VERSION {
            return Err(ShmError::VersionMismatch {
                found: self.version,
                expected: SHM_VERSION,
            });
        }
        if !(self.capacity as usize).is_power_of_two() {
            return Err(ShmError::BadCapacity(self.capacity));
        }
        if self.elem_size as usize != size_of::<T>() {
            return Err(ShmError::RecordSizeMismatch {
                found: self.elem_size,
                expected: size_of::<T>() as u64,
            });
        }
        Ok(())
    }
}

/// Byte offset of the slot array within the region.
///
/// `Slot<T>` is cache-line aligned and the header size is not a multiple
/// of that, so the header size is rounded up; dereferencing a slot at a
/// raw `size_of::<ShmHeader>()` offset would be a misaligned access.
pub fn slots_offset<T: Copy>() -> usize {
    size_of::<ShmHeader>().next_multiple_of(align_of::<Slot<T>>())
}

/// Total bytes to map for a ring of `capacity` records of `T`.
pub fn bytes_for_region<T: Copy>(capacity: usize) -> usize {
    slots_offset::<T>() + capacity * size_of::<Slot<T>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_size_scales_with_capacity() {
        let one = bytes_for_region::<u64>(1);
        let many = bytes_for_region::<u64>(128);
        assert_eq!(many - one, 127 * size_of::<Slot<u64>>());
        assert!(one > size_of::<ShmHeader>());
    }

    /// The mapping starts page-aligned, so slot alignment holds exactly
    /// when the array offset is a multiple of the slot's own alignment.
    #[test]
    fn slot_array_offset_is_slot_aligned() {
        assert_eq!(slots_offset::<u64>() % align_of::<Slot<u64>>(), 0);
        assert!(slots_offset::<u64>() >= size_of::<ShmHeader>());
        // A record type with modest alignment still lands on the slot's
        // cache-line boundary, not its payload's.
        assert_eq!(slots_offset::<[u32; 3]>() % 64, 0);
    }
}
