//! Turnstile - Sliding Window Event Counters
//!
//! This crate implements the counting half of sliding window rate limiting:
//! given a caller-supplied key and a time window, it tracks how many events
//! have occurred for that key within that window, so a rate limiting
//! decision layer can compare the count against its thresholds. Window
//! boundary math and the allow/deny decision belong to that layer, not to
//! this crate.

pub mod config;
pub mod counter;
pub mod error;
