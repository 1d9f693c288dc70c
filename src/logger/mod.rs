//! Append-only JSONL activity logging for the command-line front end.

pub mod jsonl;
