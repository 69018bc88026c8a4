//! Delivery metrics for user events.

use metrics::{counter, describe_counter, describe_histogram, histogram};

use crate::models::EventType;

pub const PUBLISHED_TOTAL: &str = "user_events_published_total";
pub const ATTEMPT_FAILURES_TOTAL: &str = "user_events_attempt_failures_total";
pub const DEAD_LETTERED_TOTAL: &str = "user_events_dead_lettered_total";
pub const DEAD_LETTER_FAILURES_TOTAL: &str = "user_events_dead_letter_failures_total";
pub const DELIVERY_ATTEMPTS: &str = "user_events_delivery_attempts";

/// Delivery metrics recorder
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Register descriptions with the installed recorder
    pub fn describe() {
        describe_counter!(PUBLISHED_TOTAL, "User events accepted by the broker");
        describe_counter!(
            ATTEMPT_FAILURES_TOTAL,
            "Individual publish attempts that failed"
        );
        describe_counter!(
            DEAD_LETTERED_TOTAL,
            "User events written to the dead-letter store"
        );
        describe_counter!(
            DEAD_LETTER_FAILURES_TOTAL,
            "User events lost because the dead-letter write failed"
        );
        describe_histogram!(
            DELIVERY_ATTEMPTS,
            "Publish attempts used by each delivered user event"
        );
    }

    pub fn record_delivered(event_type: EventType, attempts: u32) {
        counter!(PUBLISHED_TOTAL, "event_type" => event_type.as_ref().to_string()).increment(1);
        histogram!(DELIVERY_ATTEMPTS, "event_type" => event_type.as_ref().to_string())
            .record(attempts as f64);
    }

    pub fn record_attempt_failed(event_type: EventType) {
        counter!(ATTEMPT_FAILURES_TOTAL, "event_type" => event_type.as_ref().to_string())
            .increment(1);
    }

    pub fn record_dead_lettered(event_type: EventType) {
        counter!(DEAD_LETTERED_TOTAL, "event_type" => event_type.as_ref().to_string())
            .increment(1);
    }

    pub fn record_dead_letter_failed(event_type: EventType) {
        counter!(DEAD_LETTER_FAILURES_TOTAL, "event_type" => event_type.as_ref().to_string())
            .increment(1);
    }
}
