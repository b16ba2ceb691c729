//! The consumer-side handle: sole creator, drainer, and remover of the
//! shared region.

use crate::error::{RecvError, ShmError};
use crate::ring::{RingConfig, seq_to_index};
use crate::shm_layout::{SHM_MAGIC, SHM_VERSION, ShmHeader, bytes_for_region, slots_offset};
use crate::slot::Slot;
use chroma_mmap::MmapFileMut;
use std::io;
use std::marker::PhantomData;
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// Owner of the shared region. Exactly one exists per run.
///
/// Creation zero-initializes the control block and every slot, brings the
/// triad to its initial values (`used = 0`, `free = capacity`, `guard = 1`),
/// and only then lets workers attach. The read cursor lives here, not in
/// shared memory, because this is the only consumer.
pub struct Coordinator<T: Copy> {
    /// Owns the mapping lifetime; all access goes through `base`.
    _mm: MmapFileMut,
    base: *mut u8,
    mask: u64,
    read_seq: u64,
    path: PathBuf,
    _pd: PhantomData<T>,
}

// The raw pointers target the mapping the handle itself owns; moving the
// handle to another thread moves the mapping with it.
unsafe impl<T: Copy + Send> Send for Coordinator<T> {}

impl<T: Copy> Coordinator<T> {
    /// Creates and initializes the shared region at `path`.
    ///
    /// The backing file is truncated, so `set_len` guarantees zero-filled
    /// bytes before any field is written.
    pub fn create<P: AsRef<Path>>(path: P, cfg: RingConfig) -> Result<Self, ShmError> {
        let bytes = bytes_for_region::<T>(cfg.capacity);
        let mut mm = MmapFileMut::create_rw(&path, bytes as u64)?;
        let base = mm.as_mut_ptr();

        // SAFETY: freshly created mapping, exclusively owned until this
        // function returns; no worker can attach before the header and
        // triad are fully initialized.
        unsafe {
            let h = &mut *(base as *mut ShmHeader);
            h.magic = SHM_MAGIC;
            h.version = SHM_VERSION;
            h.capacity = cfg.capacity as u64;
            h.elem_size = size_of::<T>() as u64;
            h.write_seq.store(0, Ordering::Relaxed);
            h.shutdown.store(0, Ordering::Relaxed);
            h.worker_count.store(0, Ordering::Relaxed);
            h.slots_used.init(0)?;
            h.slots_free.init(cfg.capacity as u32)?;
            h.guard.init(1)?;

            let slots = base.add(slots_offset::<T>()) as *mut Slot<T>;
            for i in 0..cfg.capacity {
                (*slots.add(i)).init();
            }
        }

        Ok(Self {
            _mm: mm,
            base,
            mask: cfg.mask(),
            read_seq: 0,
            path: path.as_ref().to_path_buf(),
            _pd: PhantomData,
        })
    }

    #[inline(always)]
    fn header(&self) -> &ShmHeader {
        // SAFETY: base points at the header this handle initialized.
        unsafe { &*(self.base as *const ShmHeader) }
    }

    #[inline(always)]
    fn slot(&self, idx: u64) -> &Slot<T> {
        // SAFETY: idx is masked to capacity bounds by the caller; the
        // offset keeps the reference slot-aligned.
        let slots = unsafe { self.base.add(slots_offset::<T>()) as *const Slot<T> };
        unsafe { &*slots.add(idx as usize) }
    }

    /// Blocks until a completed record is available and returns it.
    ///
    /// Reads are strictly FIFO over completed writes: the `slots_used`
    /// permit bounds how far the consumer may advance, and the slot's own
    /// publication sequence guarantees the record for THIS cursor position
    /// is finished before it is copied out.
    pub fn recv(&mut self) -> Result<T, RecvError> {
        match self.header().slots_used.wait_interruptible() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                return Err(RecvError::Interrupted);
            }
            Err(e) => return Err(RecvError::Io(e)),
        }

        let ticket = self.read_seq;
        let idx = seq_to_index(ticket, self.mask);
        let value = self.slot(idx).read(ticket);
        self.header().slots_free.post()?;
        self.read_seq += 1;
        Ok(value)
    }

    /// Sets the termination flag and performs the fan-out release.
    ///
    /// One `slots_free` post per registered worker unblocks anyone parked
    /// on a full ring so it can observe the flag and exit. This pushes
    /// `slots_free` past its steady-state bound, which is safe: nothing is
    /// read after the flag is set. Returns the released worker count.
    pub fn begin_shutdown(&mut self) -> Result<u32, ShmError> {
        let h = self.header();
        h.guard.wait()?;
        h.shutdown.store(1, Ordering::Release);
        let workers = h.worker_count.load(Ordering::Relaxed);
        h.guard.post()?;

        for _ in 0..workers {
            h.slots_free.post()?;
        }
        Ok(workers)
    }

    /// Unmaps the region and deletes the backing file, removing the region
    /// and the embedded triad from the system namespace in one step.
    /// Stragglers keep valid handles through their own mappings.
    pub fn unlink(self) -> io::Result<()> {
        let path = self.path.clone();
        drop(self);
        std::fs::remove_file(path)
    }

    /// Quiescent-point diagnostic: `(free, used)` permit values.
    pub fn permits(&self) -> io::Result<(i32, i32)> {
        let h = self.header();
        Ok((h.slots_free.value()?, h.slots_used.value()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Worker;
    use chroma_graph::{Edge, Solution};
    use std::time::Duration;

    fn tmp_path(tag: &str) -> String {
        format!("/tmp/chroma_shm_test_{}_{}", tag, std::process::id())
    }

    fn cleanup(path: &str) {
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn round_trip_preserves_count_and_edge_set() {
        let path = tmp_path("roundtrip");
        let mut coord = Coordinator::<Solution>::create(&path, RingConfig::new(8)).unwrap();
        let mut worker = Worker::<Solution>::attach(&path).unwrap();

        let conflicts = [Edge::new(0, 1), Edge::new(4, 2), Edge::new(7, 7)];
        let sent = Solution::from_conflicts(&conflicts).unwrap();
        worker.publish(sent).unwrap();

        let got = coord.recv().unwrap();
        assert_eq!(got.conflict_count(), 3);
        // Same edge set, orientation and order aside.
        for sent_edge in &conflicts {
            assert!(
                got.edges().iter().any(|e| e.same_endpoints(sent_edge)),
                "edge {sent_edge} missing from received record"
            );
        }

        cleanup(&path);
    }

    #[test]
    fn reads_are_fifo_over_completed_writes() {
        let path = tmp_path("fifo");
        let mut coord = Coordinator::<u64>::create(&path, RingConfig::new(4)).unwrap();
        let mut worker = Worker::<u64>::attach(&path).unwrap();

        for v in [10u64, 20, 30] {
            worker.publish(v).unwrap();
        }
        assert_eq!(coord.recv().unwrap(), 10);
        assert_eq!(coord.recv().unwrap(), 20);
        // Wraparound: capacity 4, keep going past one lap.
        for v in [40u64, 50, 60] {
            worker.publish(v).unwrap();
        }
        for expect in [30u64, 40, 50, 60] {
            assert_eq!(coord.recv().unwrap(), expect);
        }

        cleanup(&path);
    }

    #[test]
    fn free_plus_used_is_capacity_at_quiescent_points() {
        let path = tmp_path("invariant");
        let mut coord = Coordinator::<u64>::create(&path, RingConfig::new(8)).unwrap();
        let mut worker = Worker::<u64>::attach(&path).unwrap();

        let (free, used) = coord.permits().unwrap();
        assert_eq!((free, used), (8, 0));

        for v in 0..5u64 {
            worker.publish(v).unwrap();
        }
        let (free, used) = coord.permits().unwrap();
        assert_eq!((free, used), (3, 5));

        for _ in 0..5 {
            coord.recv().unwrap();
        }
        let (free, used) = coord.permits().unwrap();
        assert_eq!((free, used), (8, 0));

        cleanup(&path);
    }

    #[test]
    fn attach_rejects_wrong_record_size() {
        let path = tmp_path("elemsize");
        let _coord = Coordinator::<u64>::create(&path, RingConfig::new(4)).unwrap();
        let err = match Worker::<u32>::attach(&path) {
            Err(e) => e,
            Ok(_) => panic!("attach with the wrong record type succeeded"),
        };
        match err {
            ShmError::RecordSizeMismatch { found, expected } => {
                assert_eq!(found, 8);
                assert_eq!(expected, 4);
            }
            other => panic!("expected RecordSizeMismatch, got {other:?}"),
        }
        cleanup(&path);
    }

    #[test]
    fn attach_rejects_foreign_file() {
        let path = tmp_path("magic");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();
        assert!(matches!(
            Worker::<u64>::attach(&path),
            Err(ShmError::BadMagic)
        ));
        cleanup(&path);
    }

    #[test]
    fn attach_fails_without_a_region() {
        let path = tmp_path("absent");
        assert!(matches!(
            Worker::<u64>::attach(&path),
            Err(ShmError::Io(_))
        ));
    }

    #[test]
    fn shutdown_fanout_releases_a_blocked_worker() {
        let path = tmp_path("fanout");
        let mut coord = Coordinator::<u64>::create(&path, RingConfig::new(2)).unwrap();
        let mut worker = Worker::<u64>::attach(&path).unwrap();

        let producer = std::thread::spawn(move || {
            let mut published = 0u64;
            // Fills the 2-slot ring, then blocks on slots_free until the
            // fan-out post arrives; the flag check ends the loop.
            while !worker.is_shutdown() {
                worker.publish(published).unwrap();
                published += 1;
            }
            published
        });

        // Wait until the ring is full, i.e. the producer is parked on
        // slots_free (or one instruction away from it).
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let (free, _) = coord.permits().unwrap();
            if free == 0 {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "producer never filled the ring"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
        let released = coord.begin_shutdown().unwrap();
        assert_eq!(released, 1);

        let published = producer.join().unwrap();
        assert!(published >= 2, "producer should have filled the ring");

        coord.unlink().unwrap();
        assert!(!std::path::Path::new(&path).exists());
    }

    /// Self-checking record for the concurrency test below: `check` is
    /// derived from the other two fields, so any interleaving of a torn
    /// read or a write landing in the wrong slot breaks the checksum.
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Stamped {
        producer: u64,
        seq: u64,
        check: u64,
    }

    impl Stamped {
        const SALT: u64 = 0x5EED_CAFE;

        fn new(producer: u64, seq: u64) -> Self {
            Self {
                producer,
                seq,
                check: producer ^ seq.rotate_left(17) ^ Self::SALT,
            }
        }

        fn is_consistent(&self) -> bool {
            self.check == self.producer ^ self.seq.rotate_left(17) ^ Self::SALT
        }
    }

    #[test]
    fn concurrent_workers_share_the_ring_without_torn_reads() {
        const WORKERS: usize = 3;
        const PER_WORKER: u64 = 2_000;

        let path = tmp_path("mpsc");
        // Tiny ring so producers constantly contend and lap it.
        let mut coord = Coordinator::<Stamped>::create(&path, RingConfig::new(4)).unwrap();

        let producers: Vec<_> = (0..WORKERS as u64)
            .map(|id| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut worker = Worker::<Stamped>::attach(&path).unwrap();
                    for seq in 0..PER_WORKER {
                        worker.publish(Stamped::new(id, seq)).unwrap();
                    }
                })
            })
            .collect();

        // Each producer's own records must come out in its publish order:
        // tickets are claimed in that order and reads drain FIFO.
        let mut next_seq = [0u64; WORKERS];
        for _ in 0..WORKERS as u64 * PER_WORKER {
            let record = coord.recv().unwrap();
            assert!(record.is_consistent(), "torn or misplaced record");
            let id = record.producer as usize;
            assert_eq!(record.seq, next_seq[id], "producer {id} reordered");
            next_seq[id] += 1;
        }

        for p in producers {
            p.join().unwrap();
        }

        // Quiescent point: everything published was drained.
        let (free, used) = coord.permits().unwrap();
        assert_eq!((free, used), (4, 0));

        cleanup(&path);
    }

    #[test]
    fn registered_workers_are_counted() {
        let path = tmp_path("count");
        let mut coord = Coordinator::<u64>::create(&path, RingConfig::new(4)).unwrap();
        let _w1 = Worker::<u64>::attach(&path).unwrap();
        let _w2 = Worker::<u64>::attach(&path).unwrap();
        let _w3 = Worker::<u64>::attach(&path).unwrap();

        assert_eq!(coord.begin_shutdown().unwrap(), 3);
        cleanup(&path);
    }
}
