//! Process-shared POSIX semaphores embedded in the mapped region.
//!
//! The region's file path is the single system-wide name for the whole
//! triad: unlinking the file removes every primitive at once, and an
//! attached process keeps a valid handle through its own mapping even
//! after the unlink (same semantics as `sem_unlink` on named semaphores).

use std::cell::UnsafeCell;
use std::io;

/// A counting semaphore living inside shared memory.
///
/// Never constructed as a value: the creator reinterprets zeroed mapped
/// bytes as this type and calls [`Semaphore::init`] in place.
#[repr(C)]
pub struct Semaphore {
    inner: UnsafeCell<libc::sem_t>,
}

// sem_wait/sem_post are the synchronization; the cell only yields the
// `*mut sem_t` the libc API needs from a shared reference into the region.
unsafe impl Sync for Semaphore {}
unsafe impl Send for Semaphore {}

impl Semaphore {
    /// Initializes the semaphore in place with `pshared = 1`.
    ///
    /// # Safety
    /// Must run exactly once per region lifetime, by the creating process,
    /// before any other process can reach the semaphore.
    pub unsafe fn init(&self, value: u32) -> io::Result<()> {
        if unsafe { libc::sem_init(self.inner.get(), 1, value) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Blocking wait, retried on `EINTR`.
    ///
    /// Used on the generator side, where signal delivery targets the
    /// supervisor and an interrupted wait should just resume.
    pub fn wait(&self) -> io::Result<()> {
        loop {
            if unsafe { libc::sem_wait(self.inner.get()) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Blocking wait that surfaces `EINTR` to the caller.
    ///
    /// The supervisor parks here; a delivered SIGINT/SIGTERM must abort
    /// the wait so the stop flag can be observed instead of re-entering a
    /// wait that may never be satisfied again.
    pub fn wait_interruptible(&self) -> io::Result<()> {
        if unsafe { libc::sem_wait(self.inner.get()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn post(&self) -> io::Result<()> {
        if unsafe { libc::sem_post(self.inner.get()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Current value as reported by `sem_getvalue`. Diagnostic only: the
    /// value is stale the moment it returns unless the system is quiescent.
    pub fn value(&self) -> io::Result<i32> {
        let mut v: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.inner.get(), &mut v) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(v)
    }
}
