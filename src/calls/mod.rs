//! Placing calls.
//!
//! A call attempt resolves the target, optionally sends a message, starts
//! ringing, waits and hangs up. Every outcome is reduced to a [`CallResult`].

mod backend;
mod dialer;
mod interrupt;
mod types;

pub use backend::CallBackend;
pub use dialer::Dialer;
pub use interrupt::Interrupt;
pub use types::{BatchSummary, CallResult, CallStatus, Target};

pub(crate) use types::truncate;
