//! The signal union - one independently-verifiable observation per variant.
//!
//! The variants carry the evaluated check booleans alongside the minimal
//! observation data. There is no field anywhere for a response body, header,
//! or cookie; data minimization is a property of the type shape, not a
//! runtime filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification of a UI element observed as evidence of a state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiElementKind {
    Avatar,
    LogoutLink,
    Username,
    AccountMenu,
    Custom,
}

/// One completion signal, fully evaluated against the policy in force.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// The agent was redirected off an identity flow onto a destination
    /// inside the declared scope.
    DomainRedirect {
        source_domain: String,
        destination_domain: String,
        destination_path: String,
        in_allowed_scope: bool,
        not_identity_provider: bool,
        not_login_path: bool,
    },
    /// A post-completion UI element was observed via a pre-approved
    /// selector.
    UiElement {
        element: UiElementKind,
        selector: String,
        selector_approved: bool,
    },
    /// A pre-registered read-only probe returned its expected status.
    /// Probes are referenced by alias; the payload is never inspected.
    AuthenticatedProbe {
        alias: String,
        observed_status: u16,
        expected_status: u16,
        read_only: bool,
        non_sensitive: bool,
        in_scope: bool,
    },
}

impl Signal {
    /// A signal passes only when every one of its independent checks holds.
    pub fn passes(&self) -> bool {
        match self {
            Signal::DomainRedirect {
                in_allowed_scope,
                not_identity_provider,
                not_login_path,
                ..
            } => *in_allowed_scope && *not_identity_provider && *not_login_path,
            Signal::UiElement {
                selector_approved, ..
            } => *selector_approved,
            Signal::AuthenticatedProbe {
                observed_status,
                expected_status,
                read_only,
                non_sensitive,
                in_scope,
                ..
            } => {
                *read_only && *non_sensitive && *in_scope && observed_status == expected_status
            }
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::DomainRedirect { .. } => SignalKind::DomainRedirect,
            Signal::UiElement { .. } => SignalKind::UiElement,
            Signal::AuthenticatedProbe { .. } => SignalKind::AuthenticatedProbe,
        }
    }

    /// Redacted view for audit records: check booleans only, no observation
    /// content.
    pub fn summary(&self) -> SignalSummary {
        let mut checks = BTreeMap::new();
        match self {
            Signal::DomainRedirect {
                in_allowed_scope,
                not_identity_provider,
                not_login_path,
                ..
            } => {
                checks.insert("in_allowed_scope".into(), *in_allowed_scope);
                checks.insert("not_identity_provider".into(), *not_identity_provider);
                checks.insert("not_login_path".into(), *not_login_path);
            }
            Signal::UiElement {
                selector_approved, ..
            } => {
                checks.insert("selector_approved".into(), *selector_approved);
            }
            Signal::AuthenticatedProbe {
                observed_status,
                expected_status,
                read_only,
                non_sensitive,
                in_scope,
                ..
            } => {
                checks.insert("status_matches".into(), observed_status == expected_status);
                checks.insert("read_only".into(), *read_only);
                checks.insert("non_sensitive".into(), *non_sensitive);
                checks.insert("in_scope".into(), *in_scope);
            }
        }
        SignalSummary {
            kind: self.kind(),
            passed: self.passes(),
            checks,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    DomainRedirect,
    UiElement,
    AuthenticatedProbe,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignalKind::DomainRedirect => "domain_redirect",
            SignalKind::UiElement => "ui_element",
            SignalKind::AuthenticatedProbe => "authenticated_probe",
        };
        write!(f, "{name}")
    }
}

/// A signal as recorded on a gate's system key, with its verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedSignal {
    pub signal: Signal,
    pub passed: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl ValidatedSignal {
    pub fn record(signal: Signal) -> Self {
        let passed = signal.passes();
        Self {
            signal,
            passed,
            evaluated_at: Utc::now(),
        }
    }
}

/// Redacted signal snapshot carried into audit entries: kind, verdict, and
/// the individual check booleans. Never raw observation content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub kind: SignalKind,
    pub passed: bool,
    pub checks: BTreeMap<String, bool>,
}
