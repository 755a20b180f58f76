//! Timed scheduling primitives for lanparty.
//!
//! Two building blocks live here:
//!
//! - [`TickScheduler`]: a fixed-interval tick source that skips ahead
//!   after a late wake-up. Discovery uses one per background task to pace
//!   announcements and peer-list refreshes.
//! - [`Sequence`]: a cancellable, step-by-step timed task. Code parks at
//!   named suspension points; once the paired [`CancelHandle`] fires (or is
//!   dropped), the next suspension point returns [`Cancelled`] and the
//!   task unwinds without running its remaining side effects.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a task's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         result = socket.recv_from(&mut buf) => { /* record datagram */ }
//!         _ = scheduler.wait_for_tick() => { /* publish snapshot */ }
//!     }
//! }
//! ```

mod scheduler;
mod sequence;

pub use scheduler::{TickConfig, TickInfo, TickScheduler};
pub use sequence::{CancelHandle, Cancelled, Sequence};
