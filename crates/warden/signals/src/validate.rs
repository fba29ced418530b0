//! Pure validators, one per signal variant.
//!
//! Each validator takes the policy lists in force plus a raw observation
//! and returns a fully evaluated signal. The caller never supplies the
//! check booleans; they are always derived here.

use crate::domain::{
    domain_in_scope, extract_domain, extract_path, is_identity_provider, is_login_path,
};
use crate::SignalError;
use serde::{Deserialize, Serialize};
use warden_types::{PolicyBinding, Signal, UiElementKind};

/// A raw observation from the browser-automation layer, before validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Navigation {
        source_url: String,
        destination_url: String,
    },
    UiProbe {
        element: UiElementKind,
        selector: String,
    },
    ProbeResponse {
        alias: String,
        status: u16,
    },
}

/// Dispatch an observation to the validator for its signal kind.
pub fn evaluate(policy: &PolicyBinding, observation: &Observation) -> Result<Signal, SignalError> {
    match observation {
        Observation::Navigation {
            source_url,
            destination_url,
        } => Ok(evaluate_redirect(
            &policy.allowed_domains,
            source_url,
            destination_url,
        )),
        Observation::UiProbe { element, selector } => Ok(evaluate_ui_element(
            &policy.approved_selectors,
            *element,
            selector,
        )),
        Observation::ProbeResponse { alias, status } => evaluate_probe(policy, alias, *status),
    }
}

/// Domain-redirect validation: three independent checks, ANDed by
/// [`Signal::passes`]. A redirect landing back on a login or callback
/// path never counts as success, even when the host is allowed.
pub fn evaluate_redirect(
    allowed_domains: &[String],
    source_url: &str,
    destination_url: &str,
) -> Signal {
    let source_domain = extract_domain(source_url);
    let destination_domain = extract_domain(destination_url);
    let destination_path = extract_path(destination_url);

    let signal = Signal::DomainRedirect {
        in_allowed_scope: domain_in_scope(&destination_domain, allowed_domains),
        not_identity_provider: !is_identity_provider(&destination_domain),
        not_login_path: !is_login_path(&destination_path),
        source_domain,
        destination_domain,
        destination_path,
    };
    tracing::debug!(passed = signal.passes(), "evaluated domain-redirect signal");
    signal
}

/// UI-element validation: simple list membership against the policy's
/// pre-approved selector list.
pub fn evaluate_ui_element(
    approved_selectors: &[String],
    element: UiElementKind,
    selector: &str,
) -> Signal {
    Signal::UiElement {
        element,
        selector: selector.to_string(),
        selector_approved: approved_selectors.iter().any(|s| s == selector),
    }
}

/// Probe validation: membership by alias (never URL) in the approved probe
/// registry, flags sourced from the registry entry, and the received
/// status compared to the expected one. The payload is never inspected.
pub fn evaluate_probe(
    policy: &PolicyBinding,
    alias: &str,
    observed_status: u16,
) -> Result<Signal, SignalError> {
    let registration = policy
        .probe(alias)
        .ok_or_else(|| SignalError::UnknownProbeAlias(alias.to_string()))?;

    Ok(Signal::AuthenticatedProbe {
        alias: alias.to_string(),
        observed_status,
        expected_status: registration.expected_status,
        read_only: registration.read_only,
        non_sensitive: !registration.sensitive,
        in_scope: registration.in_scope,
    })
}
