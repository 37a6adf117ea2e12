use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("petshop_scheduling_statds")
        .with_description("Appointment engine statistics")
        .with_unit("attempt")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_appointment_action_statds(action: &str) {
    incr_statds("appointment_action".to_string(), action.into())
}

pub fn incr_payment_status_statds(status: &str) {
    incr_statds("payment_status".to_string(), status.into())
}

pub fn incr_rejection_statds(kind: &str) {
    incr_statds("rejection".to_string(), kind.into())
}
