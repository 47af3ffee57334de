//! One pseudo-terminal per service.
//!
//! `run_service` owns the child and the PTY master for the whole lifetime
//! of the service. Dedicated threads own the reader (relay) and the writer
//! (input). Everything else talks to a runner through `RunnerCommand`s.

mod pty;
mod relay;
mod service;
mod writer;

use devmux_core::state::PaneSize;

pub use service::run_service;

/// Capacity of each runner's command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerCommand {
    /// Raw bytes for the child's terminal input.
    Input(Vec<u8>),
    Resize(PaneSize),
}
