//! End-to-end exercise of the approval core: gate creation through signal
//! consensus, human approval, session issuance, drift tracking, and an
//! export/verify round trip with tamper detection.

use std::sync::Arc;
use warden_gate::{GateConfig, GateError, GateManager};
use warden_ledger::{AuditEventKind, AuditLedger};
use warden_signals::Observation;
use warden_types::{
    ActionCategory, ActorIdentity, AgentId, ApprovalMethod, GateContext, GateStatus,
    PolicySnapshot, ProbeRegistration, TabGroupId, UiElementKind, WorkstationId,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn policy() -> PolicySnapshot {
    PolicySnapshot {
        policy_id: "pack-sam-gov".into(),
        version: "2.1.0".into(),
        content_hash: "a1b2c3".into(),
        allowed_domains: vec!["sam.gov".into(), "*.sam.gov".into()],
        approved_probes: vec![ProbeRegistration {
            alias: "entity-dashboard".into(),
            expected_status: 200,
            read_only: true,
            sensitive: false,
            in_scope: true,
        }],
        approved_selectors: vec!["[data-test=avatar]".into()],
        timeout_override: None,
    }
}

fn context() -> GateContext {
    GateContext {
        workstation: WorkstationId::new("ws-alpha"),
        tab_group: TabGroupId::new("tg-1"),
        agent: AgentId::new("agent-registrar"),
        origin_domain: "login.gov".into(),
        target_domain: "sam.gov".into(),
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn full_approval_flow_with_verified_audit_trail() {
    init_tracing();
    let ledger = Arc::new(AuditLedger::new());
    let manager = GateManager::new(GateConfig::default(), Arc::clone(&ledger));
    let policy = policy();

    let gate = manager
        .create(ActionCategory::Authentication, context(), &policy)
        .expect("gate opens");
    assert_eq!(gate.status, GateStatus::Pending);

    // The agent lands back on the workspace after the identity flow.
    let progress = manager
        .submit_signal(
            &gate.id,
            &Observation::Navigation {
                source_url: "https://login.gov/authorize?client=sam".into(),
                destination_url: "https://sam.gov/workspace".into(),
            },
        )
        .expect("redirect signal accepted");
    assert_eq!(progress.passing_signals, 1);
    assert!(!progress.system_approved);

    // A pre-registered probe confirms the authenticated state.
    let progress = manager
        .submit_signal(
            &gate.id,
            &Observation::ProbeResponse {
                alias: "entity-dashboard".into(),
                status: 200,
            },
        )
        .expect("probe signal accepted");
    assert!(progress.system_approved);
    assert_eq!(progress.status, GateStatus::KeyBApproved);

    // The operator confirms on the console.
    let operator = ActorIdentity::new("op-42").with_display_name("R. Vasquez");
    let progress = manager
        .approve_human(&gate.id, operator, ApprovalMethod::Console)
        .expect("human approval accepted");
    assert_eq!(progress.status, GateStatus::Approved);
    let session_id = progress.session.expect("session bound on approval");

    let sessions = manager.sessions().expect("sessions readable");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].actor.operator_id, "op-42");
    assert_eq!(sessions[0].policy_hash, "a1b2c3");
    assert!(!sessions[0].verified_signals.is_empty());

    // A resolved gate no longer exists from the caller's perspective.
    assert!(matches!(
        manager.status(&gate.id),
        Err(GateError::NotFound(_))
    ));

    // The ledger tells the whole story in order and verifies clean. The
    // terminal transition is exactly one entry, carrying the session id.
    let entries = ledger.entries().expect("entries readable");
    let kinds: Vec<_> = entries.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::GateCreated,
            AuditEventKind::SignalSubmitted,
            AuditEventKind::SignalSubmitted,
            AuditEventKind::HumanApproved,
            AuditEventKind::GateApproved,
        ]
    );
    let approved = entries.last().expect("approval entry");
    assert_eq!(approved.subtype.as_deref(), Some(session_id.to_string().as_str()));

    let verification = ledger.verify_self().expect("verification runs");
    assert!(verification.valid);

    // Export survives a parse-and-verify round trip, and one flipped byte
    // is caught and attributed.
    let export = ledger.export().expect("export");
    let clean = AuditLedger::verify_export(&export);
    assert!(clean.valid);

    let tampered = export.replacen("op-42", "op-66", 1);
    let verdict = AuditLedger::verify_export(&tampered);
    assert!(!verdict.valid);
    assert!(!verdict.faults.is_empty());
}

#[test]
fn drift_cycle_is_tracked_alongside_gates() {
    init_tracing();
    let ledger = Arc::new(AuditLedger::new());
    let manager = GateManager::new(GateConfig::default(), Arc::clone(&ledger));
    let policy = policy();
    let ws = WorkstationId::new("ws-alpha");
    let agent = AgentId::new("agent-registrar");

    let check = manager
        .check_domain(&ws, &agent, "https://google.com/search?q=entity", &policy)
        .expect("check runs");
    assert!(!check.in_scope);

    let check = manager
        .check_domain(&ws, &agent, "https://entity.sam.gov/profile", &policy)
        .expect("check runs");
    assert!(check.in_scope, "wildcard subdomain is in scope");

    let kinds: Vec<_> = ledger
        .entries()
        .expect("entries readable")
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![AuditEventKind::DriftDetected, AuditEventKind::DriftReturned]
    );
}

#[test]
fn policy_change_voids_a_nearly_approved_gate() {
    init_tracing();
    let ledger = Arc::new(AuditLedger::new());
    let manager = GateManager::new(GateConfig::default(), Arc::clone(&ledger));
    let policy = policy();

    let gate = manager
        .create(ActionCategory::Submission, context(), &policy)
        .expect("gate opens");
    manager
        .submit_signal(
            &gate.id,
            &Observation::UiProbe {
                element: UiElementKind::Avatar,
                selector: "[data-test=avatar]".into(),
            },
        )
        .expect("signal accepted");
    manager
        .approve_human(
            &gate.id,
            ActorIdentity::new("op-42"),
            ApprovalMethod::Console,
        )
        .expect("human approval accepted");

    let err = manager
        .check_policy_drift(&gate.id, "d4e5f6")
        .expect_err("diverged hash invalidates");
    assert!(matches!(err, GateError::PolicyMismatch(_)));
    assert!(manager.sessions().expect("readable").is_empty());

    let entry = ledger
        .entries()
        .expect("entries readable")
        .into_iter()
        .find(|e| e.kind == AuditEventKind::GateInvalidated)
        .expect("invalidation recorded");
    assert!(entry.security_relevant);
    assert!(entry.policy.mismatch);
    assert_eq!(entry.policy.hash_at_creation, "a1b2c3");
    assert_eq!(entry.policy.current_hash, "d4e5f6");
}
