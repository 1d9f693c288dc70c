//! Device usage: used/free derivation, percentage, and alarm tier.

pub mod calculator;
pub mod severity;
