// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

/// Register all Nudge metric descriptions.
pub fn register_metrics() {
    describe_counter!("nudge_inbound_total", "Inbound events by routing decision");
    describe_counter!("nudge_dispatch_total", "Dispatch cycles by outcome");
    describe_counter!(
        "nudge_retraction_failures_total",
        "Summary retractions that failed or timed out"
    );
    describe_counter!(
        "nudge_persistence_failures_total",
        "Document saves that failed"
    );
    describe_gauge!("nudge_pending_messages", "Unanswered messages in the store");
}

/// Record how an inbound event was routed.
pub fn record_inbound(route: &'static str) {
    metrics::counter!("nudge_inbound_total", "route" => route).increment(1);
}

/// Record the outcome of a dispatch cycle.
pub fn record_dispatch(outcome: &'static str) {
    metrics::counter!("nudge_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_retraction_failure() {
    metrics::counter!("nudge_retraction_failures_total").increment(1);
}

pub fn set_pending_messages(count: usize) {
    metrics::gauge!("nudge_pending_messages").set(count as f64);
}
