//! Request authorization.
//!
//! # Responsibilities
//! - Check the request origin against the whitelist
//! - Check the presented token against the origin's expected token
//! - Evaluate gates in order; the first deny wins
//!
//! # Design Decisions
//! - Gates are an ordered list of trait objects so new checks slot in
//!   without touching the dispatch flow
//! - The whitelist runs before the token check: an origin outside the
//!   whitelist learns nothing about token validity
//! - The token table is keyed by origin. This ties identity to network
//!   address and is kept as-is until callers carry their own identity

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::{TokenConfig, WhitelistConfig};

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Origin is not whitelisted.
    Forbidden,
    /// Token missing or wrong.
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

/// Who is asking, and with what credential.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub origin: &'a str,
    pub credential: Option<&'a str>,
}

/// A single authorization check.
pub trait Gate: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn check(&self, request: &GateRequest<'_>) -> Verdict;
}

/// Origin allow-list. Disabled means every origin passes.
#[derive(Debug, Clone, Default)]
pub struct WhitelistGate {
    enabled: bool,
    allowed: HashSet<String>,
}

impl WhitelistGate {
    pub fn new(enabled: bool, allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled,
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl From<&WhitelistConfig> for WhitelistGate {
    fn from(config: &WhitelistConfig) -> Self {
        Self::new(config.enable, config.authorized.iter().cloned())
    }
}

impl Gate for WhitelistGate {
    fn name(&self) -> &'static str {
        "whitelist"
    }

    fn check(&self, request: &GateRequest<'_>) -> Verdict {
        if self.enabled && !self.allowed.contains(request.origin) {
            Verdict::Deny(DenyReason::Forbidden)
        } else {
            Verdict::Allow
        }
    }
}

/// Per-origin token table. Disabled means every credential passes.
#[derive(Clone, Default)]
pub struct TokenGate {
    enabled: bool,
    tokens: HashMap<String, String>,
}

impl TokenGate {
    pub fn new(enabled: bool, tokens: HashMap<String, String>) -> Self {
        Self { enabled, tokens }
    }
}

impl fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGate")
            .field("enabled", &self.enabled)
            .field("origins", &self.tokens.len())
            .finish()
    }
}

impl From<&TokenConfig> for TokenGate {
    fn from(config: &TokenConfig) -> Self {
        Self::new(config.enable, config.tokens.clone())
    }
}

impl Gate for TokenGate {
    fn name(&self) -> &'static str {
        "query_token"
    }

    fn check(&self, request: &GateRequest<'_>) -> Verdict {
        if !self.enabled {
            return Verdict::Allow;
        }
        match (self.tokens.get(request.origin), request.credential) {
            (Some(expected), Some(given)) if expected == given => Verdict::Allow,
            _ => Verdict::Deny(DenyReason::Unauthorized),
        }
    }
}

/// Ordered chain of gates.
#[derive(Debug, Default)]
pub struct AuthorizationGate {
    gates: Vec<Box<dyn Gate>>,
}

impl AuthorizationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitelist first, then tokens.
    pub fn from_config(whitelist: &WhitelistConfig, tokens: &TokenConfig) -> Self {
        Self::new()
            .with_gate(WhitelistGate::from(whitelist))
            .with_gate(TokenGate::from(tokens))
    }

    /// Append a gate at the end of the chain.
    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    pub fn authorize(&self, origin: &str, credential: Option<&str>) -> Verdict {
        let request = GateRequest { origin, credential };
        for gate in &self.gates {
            if let Verdict::Deny(reason) = gate.check(&request) {
                tracing::debug!(
                    gate = gate.name(),
                    origin = %origin,
                    reason = ?reason,
                    "Request denied"
                );
                return Verdict::Deny(reason);
            }
        }
        Verdict::Allow
    }
}

/// One-shot evaluation over raw whitelist and token table values.
pub fn authorize(
    origin: &str,
    credential: Option<&str>,
    whitelist_enabled: bool,
    whitelist: &HashSet<String>,
    tokens_enabled: bool,
    token_table: &HashMap<String, String>,
) -> Verdict {
    AuthorizationGate::new()
        .with_gate(WhitelistGate::new(whitelist_enabled, whitelist.iter().cloned()))
        .with_gate(TokenGate::new(tokens_enabled, token_table.clone()))
        .authorize(origin, credential)
}
