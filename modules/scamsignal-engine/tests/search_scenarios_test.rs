//! Scenario-driven search tests: community signal + backend signal through
//! the full fusion path. Scripted adapters and in-memory stores; no
//! network, no disk.
//!
//! Run with: cargo test -p scamsignal-engine --test search_scenarios_test

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use ai_client::BackendId;
use scamsignal_common::{CommunitySignal, IdentifierKind, ReportSummary, RiskLevel, Urgency};
use scamsignal_engine::testing::{
    failing_factory, scripted_factory, MemoryCommunityStore, MemoryCredentialStore,
};
use scamsignal_engine::{CredentialRegistry, DispatchError, Dispatcher, RiskAnalyzer};

const REPORTED_PHONE: &str = "+1 (612) 555-0134";

fn reported_phone_signal(report_count: u32) -> CommunitySignal {
    CommunitySignal {
        risk_level: if report_count >= 5 {
            RiskLevel::Dangerous
        } else if report_count >= 2 {
            RiskLevel::Suspicious
        } else {
            RiskLevel::Safe
        },
        report_count,
        confidence: 75,
        reasons: vec![format!("Reported {report_count} time(s) by the community")],
        verified_reports: (0..report_count.min(5))
            .map(|i| ReportSummary {
                id: Uuid::new_v4(),
                category: "phone_scam".to_string(),
                summary: format!("caller demanded gift cards ({i})"),
                reported_at: Utc::now(),
            })
            .collect(),
    }
}

fn registry(factory: scamsignal_engine::AdapterFactory) -> Arc<CredentialRegistry> {
    Arc::new(CredentialRegistry::new(
        Arc::new(MemoryCredentialStore::new()),
        factory,
    ))
}

// ===========================================================================
// Scenario: no backend configured, heavily reported phone number
// ===========================================================================

/// Six community reports and no backend: the local fallback carries the
/// verdict (dangerous, high urgency, confidence 80) and community-only
/// fields survive fusion.
#[tokio::test]
async fn no_backend_with_six_reports_is_dangerous() {
    let community = Arc::new(MemoryCommunityStore::new());
    community
        .insert(REPORTED_PHONE, IdentifierKind::Phone, reported_phone_signal(6))
        .await;

    let registry = registry(scripted_factory("{}"));
    let analyzer = RiskAnalyzer::new(community, Dispatcher::new(registry));

    let result = analyzer.search(REPORTED_PHONE).await;
    assert_eq!(result.risk_level, RiskLevel::Dangerous);
    assert_eq!(result.urgency, Urgency::High);
    assert_eq!(result.confidence, 80);
    assert_eq!(result.report_count, 6);
    assert_eq!(result.verified_reports.len(), 5);
    assert!(result
        .reasons
        .iter()
        .any(|r| r.contains("no analysis backend was reachable")));
}

// ===========================================================================
// Scenario: structured backend verdict over an unreported identifier
// ===========================================================================

/// Backend says suspicious with confidence 65; the community has nothing.
/// The fused verdict takes the more severe level, the max confidence, and
/// concatenates reasons community-first.
#[tokio::test]
async fn backend_verdict_fuses_with_empty_community_signal() {
    let reply = r#"{
        "risk_level": "suspicious",
        "confidence": 65,
        "reasons": ["Pattern resembles advance-fee scams"],
        "narrative": "This number matches patterns seen in advance-fee scams.",
        "recommendations": ["Do not send money"],
        "urgency": "medium",
        "similar_patterns": ["advance-fee"],
        "prevention_tips": ["Never pay to receive winnings"]
    }"#;

    let registry = registry(scripted_factory(reply));
    assert!(registry
        .set_credential(BackendId::Claude, "sk-ant-REDACTED")
        .await
        .unwrap());

    let analyzer = RiskAnalyzer::new(
        Arc::new(MemoryCommunityStore::new()),
        Dispatcher::new(registry),
    );

    let result = analyzer.search(REPORTED_PHONE).await;
    assert_eq!(result.risk_level, RiskLevel::Suspicious);
    assert_eq!(result.confidence, 65);
    assert_eq!(result.urgency, Urgency::Medium);
    assert_eq!(result.report_count, 0);
    // Community reason first, backend reason after, no de-duplication.
    assert_eq!(result.reasons.len(), 2);
    assert!(result.reasons[0].contains("No prior community reports"));
    assert_eq!(result.reasons[1], "Pattern resembles advance-fee scams");
    assert_eq!(result.recommendations, vec!["Do not send money"]);
}

// ===========================================================================
// Scenario: backend down, community has some reports
// ===========================================================================

#[tokio::test]
async fn backend_failure_degrades_to_report_count_verdict() {
    let community = Arc::new(MemoryCommunityStore::new());
    community
        .insert(REPORTED_PHONE, IdentifierKind::Phone, reported_phone_signal(3))
        .await;

    let registry = registry(failing_factory());
    assert!(registry
        .set_credential(BackendId::OpenAi, "sk-proj-abcdefghijklmnopqrs")
        .await
        .unwrap());

    let analyzer = RiskAnalyzer::new(community, Dispatcher::new(registry));

    let result = analyzer.search(REPORTED_PHONE).await;
    assert_eq!(result.risk_level, RiskLevel::Suspicious);
    assert_eq!(result.urgency, Urgency::Medium);
    assert_eq!(result.confidence, 80);
    assert_eq!(result.report_count, 3);
}

// ===========================================================================
// Scenario: prose reply from the backend
// ===========================================================================

/// An unstructured reply still yields a verdict through the keyword scan,
/// with the documented fallback confidence.
#[tokio::test]
async fn prose_backend_reply_is_classified_by_keyword_scan() {
    let registry = registry(scripted_factory(
        "I would not trust this at all — it looks like a phishing domain.",
    ));
    assert!(registry
        .set_credential(BackendId::Claude, "sk-ant-REDACTED")
        .await
        .unwrap());

    let analyzer = RiskAnalyzer::new(
        Arc::new(MemoryCommunityStore::new()),
        Dispatcher::new(registry),
    );

    let result = analyzer.search("paypal-secure.example.com").await;
    assert_eq!(result.risk_level, RiskLevel::Dangerous);
    assert_eq!(result.confidence, 70);
}

// ===========================================================================
// Scenario: image analysis capability gate
// ===========================================================================

/// OpenRouter's descriptor declares no image support, so the dispatcher
/// refuses before any call is attempted.
#[tokio::test]
async fn image_analysis_on_text_only_backend_is_rejected_up_front() {
    let registry = registry(scripted_factory("{}"));
    assert!(registry
        .set_credential(BackendId::OpenRouter, "sk-or-v1-abcdefghijklmnopq")
        .await
        .unwrap());

    let dispatcher = Dispatcher::new(registry);
    let result = dispatcher.analyze_image(&[0u8; 8], "image/png").await;
    assert!(matches!(
        result,
        Err(DispatchError::UnsupportedCapability(BackendId::OpenRouter))
    ));
}

/// With no backend at all, image analysis reports the missing configuration
/// rather than a capability problem.
#[tokio::test]
async fn image_analysis_without_backend_reports_no_backend() {
    let registry = registry(scripted_factory("{}"));
    let dispatcher = Dispatcher::new(registry);
    let result = dispatcher.analyze_image(&[0u8; 8], "image/png").await;
    assert!(matches!(result, Err(DispatchError::NoBackendConfigured)));
}
