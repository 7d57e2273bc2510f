//! Resource protection for paid external calls

pub mod rate_limit;

pub use rate_limit::{RateGate, ResetTask};
