//! Dispatch log sink.
//!
//! One record per handled request, success or failure.

use std::time::Duration;

use crate::dispatch::outcome::Stage;

pub const DISPATCH_TARGET: &str = "factrice::dispatch";

/// What gets logged for a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub request_id: String,
    pub origin: String,
    pub route: String,
    pub status: u16,
    pub stage: Stage,
    pub message: String,
    pub elapsed: Duration,
}

#[cfg_attr(test, mockall::automock)]
pub trait DispatchLog: Send + Sync {
    fn record(&self, record: &DispatchRecord);
}

/// Emits records as tracing events, levelled by status class.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatchLog;

impl DispatchLog for TracingDispatchLog {
    fn record(&self, record: &DispatchRecord) {
        let elapsed_ms = record.elapsed.as_millis() as u64;
        match record.status {
            500.. => tracing::error!(
                target: DISPATCH_TARGET,
                request_id = %record.request_id,
                origin = %record.origin,
                route = %record.route,
                status = record.status,
                stage = %record.stage,
                elapsed_ms,
                "{}", record.message
            ),
            400..=499 => tracing::warn!(
                target: DISPATCH_TARGET,
                request_id = %record.request_id,
                origin = %record.origin,
                route = %record.route,
                status = record.status,
                stage = %record.stage,
                elapsed_ms,
                "{}", record.message
            ),
            _ => tracing::info!(
                target: DISPATCH_TARGET,
                request_id = %record.request_id,
                origin = %record.origin,
                route = %record.route,
                status = record.status,
                stage = %record.stage,
                elapsed_ms,
                "{}", record.message
            ),
        }
    }
}
