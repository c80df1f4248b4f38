//! Metrics for the client layer
//!
//! Privacy-safe: labels carry backend and outcome only, never values,
//! handles or addresses.

use metrics::{counter, histogram};
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_REJECTED: &str = "rejected";
pub const OUTCOME_ERROR: &str = "error";

pub fn record_load(backend: &str, outcome: &str, duration: Duration) {
    counter!("fhevm_load_total", "backend" => backend.to_string(), "outcome" => outcome.to_string()).increment(1);
    histogram!("fhevm_load_duration_seconds", "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_stale_load() {
    counter!("fhevm_stale_load_total").increment(1);
}

pub fn record_encrypt(outcome: &str) {
    counter!("fhevm_encrypt_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_decrypt(outcome: &str) {
    counter!("fhevm_decrypt_total", "outcome" => outcome.to_string()).increment(1);
}
