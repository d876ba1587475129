//! Request dispatch.
//!
//! # Responsibilities
//! - Run authorization, route lookup, rendering and sending in order
//! - Classify the first failing stage into a `DispatchError`
//! - Emit exactly one log record per request, on every path
//!
//! # Design Decisions
//! - Linear state machine: RECEIVED → AUTHORIZED → ROUTE_RESOLVED →
//!   RENDERED → SENT, any failure jumps to FAILED; logging always runs
//! - Shared state (registry, gates) lives in an immutable `DispatchContext`
//!   built once at startup; the dispatcher never mutates it
//! - The transport send is the only await point; nothing is retried

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::dispatch::error::DispatchError;
use crate::dispatch::log::{DispatchLog, DispatchRecord, TracingDispatchLog};
use crate::dispatch::outcome::{RequestOutcome, Stage};
use crate::mail::{MailEnvelope, MailHeaders, MailTransport};
use crate::observability::metrics;
use crate::routing::RouteRegistry;
use crate::security::{AuthorizationGate, Verdict};
use crate::template::TemplateRenderer;

/// Metrics label for names that match no route.
const UNKNOWN_ROUTE_LABEL: &str = "_unknown";

/// Process-wide, read-only state shared by every request.
#[derive(Debug)]
pub struct DispatchContext {
    pub registry: RouteRegistry,
    pub gate: AuthorizationGate,
    pub renderer: TemplateRenderer,
    /// Sender used when a request carries no `from`.
    pub default_from: Option<String>,
}

/// One inbound dispatch request.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub request_id: String,
    pub origin: String,
    pub route: String,
    pub credential: Option<String>,
    pub payload: Value,
    pub headers: MailHeaders,
}

pub struct Dispatcher {
    context: Arc<DispatchContext>,
    transport: Arc<dyn MailTransport>,
    log: Arc<dyn DispatchLog>,
}

impl Dispatcher {
    pub fn new(context: DispatchContext, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            context: Arc::new(context),
            transport,
            log: Arc::new(TracingDispatchLog),
        }
    }

    /// Replace the default tracing log sink.
    pub fn with_log(mut self, log: Arc<dyn DispatchLog>) -> Self {
        self.log = log;
        self
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: DispatchRequest) -> RequestOutcome {
        let start = Instant::now();
        self.advance(&request, Stage::Received);
        let result = self.run(&request).await;
        self.finish(&request.request_id, &request.origin, &request.route, result, start)
    }

    /// Record a request that was refused before it could be dispatched
    /// (e.g. an unreadable body). Still produces one log record.
    pub fn reject(
        &self,
        request_id: &str,
        origin: &str,
        route: &str,
        error: DispatchError,
    ) -> RequestOutcome {
        self.finish(request_id, origin, route, Err(error), Instant::now())
    }

    async fn run(&self, request: &DispatchRequest) -> Result<(), DispatchError> {
        let context = &self.context;

        if let Verdict::Deny(reason) = context
            .gate
            .authorize(&request.origin, request.credential.as_deref())
        {
            return Err(reason.into());
        }
        self.advance(request, Stage::Authorized);

        let route = context
            .registry
            .lookup(&request.route)
            .ok_or(DispatchError::NotFound)?;
        self.advance(request, Stage::RouteResolved);

        let html = context
            .renderer
            .render(route.template(), route.bindings(), &request.payload)?;
        let envelope =
            MailEnvelope::assemble(&request.headers, html, context.default_from.as_deref())?;
        self.advance(request, Stage::Rendered);

        self.transport.send(&envelope).await?;
        self.advance(request, Stage::Sent);

        Ok(())
    }

    fn advance(&self, request: &DispatchRequest, stage: Stage) {
        tracing::debug!(
            request_id = %request.request_id,
            route = %request.route,
            stage = %stage,
            "Dispatch stage reached"
        );
    }

    fn finish(
        &self,
        request_id: &str,
        origin: &str,
        route: &str,
        result: Result<(), DispatchError>,
        start: Instant,
    ) -> RequestOutcome {
        let (outcome, stage) = match &result {
            Ok(()) => (RequestOutcome::sent(), Stage::Sent),
            Err(err) => {
                if let DispatchError::Internal(detail) = err {
                    tracing::error!(
                        request_id = %request_id,
                        detail = %detail,
                        "Internal dispatch failure"
                    );
                }
                (RequestOutcome::from(err), Stage::Failed(err.kind()))
            }
        };

        self.log.record(&DispatchRecord {
            request_id: request_id.to_string(),
            origin: origin.to_string(),
            route: route.to_string(),
            status: outcome.status.as_u16(),
            stage,
            message: outcome.message.clone(),
            elapsed: start.elapsed(),
        });

        let label = if self.context.registry.lookup(route).is_some() {
            route
        } else {
            UNKNOWN_ROUTE_LABEL
        };
        metrics::record_dispatch(label, outcome.status.as_u16(), start);

        outcome
    }
}
