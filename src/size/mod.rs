//! Exact byte quantities and their human-scaled display form.

pub mod humanize;
pub mod quantity;
pub mod unit;
