//! Bounded producer/consumer handoff over file-backed shared memory.
//!
//! One supervisor process creates a mapped region holding a control block,
//! a counting-semaphore triad, and a fixed ring of record slots. Any number
//! of generator processes attach, claim a free slot each iteration, and
//! publish a record; the supervisor drains the ring strictly FIFO. The
//! triad rations slot ownership, so no record is lost, no slot is read
//! before its writer finishes, and a cooperative shutdown fan-out releases
//! every blocked producer.

mod coordinator;
mod error;
mod ring;
mod sem;
mod shm_layout;
mod slot;
mod worker;

pub use coordinator::Coordinator;
pub use error::{RecvError, ShmError};
pub use ring::RingConfig;
pub use worker::Worker;
