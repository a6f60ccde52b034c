//! Signal fusion: combines the community-report signal with the backend's
//! analysis into one verdict, degrading through a deterministic fallback
//! chain when no backend can answer. `search()` never fails: a safety
//! check that errors out with no answer is worse than a low-confidence one.

use std::sync::Arc;

use tracing::{info, warn};

use scamsignal_common::{
    classify_identifier, AnalysisRequest, AnalysisResult, CommunitySignal, RiskLevel, SearchResult,
    Urgency,
};

use crate::community::{default_signal, CommunityStore};
use crate::dispatcher::Dispatcher;

/// Confidence of the local fallback when community reports exist.
const FALLBACK_REPORTS_CONFIDENCE: u8 = 80;

/// Confidence of the local fallback with no backend and no reports.
const FALLBACK_NEUTRAL_CONFIDENCE: u8 = 50;

/// Report-count thresholds for the local fallback verdict.
const DANGEROUS_REPORTS: u32 = 5;
const SUSPICIOUS_REPORTS: u32 = 2;

pub struct RiskAnalyzer {
    community: Arc<dyn CommunityStore>,
    dispatcher: Dispatcher,
}

impl RiskAnalyzer {
    pub fn new(community: Arc<dyn CommunityStore>, dispatcher: Dispatcher) -> Self {
        Self {
            community,
            dispatcher,
        }
    }

    /// Analyze one identifier. Infallible: every failure mode below the
    /// surface degrades to a lower-confidence but always-present verdict.
    pub async fn search(&self, query: &str) -> SearchResult {
        let kind = classify_identifier(query);

        let community = match self.community.lookup(query, kind).await {
            Ok(Some(signal)) => signal,
            Ok(None) => default_signal(),
            Err(e) => {
                warn!(error = %e, "Community store lookup failed, using default signal");
                default_signal()
            }
        };

        let request = AnalysisRequest {
            query: query.to_string(),
            kind,
            prior_report_count: community.report_count,
            context: "User-initiated safety check of a suspicious identifier".to_string(),
        };

        let analysis = match self.dispatcher.analyze(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Backend analysis unavailable, using local fallback");
                local_fallback(&community)
            }
        };

        let result = fuse(community, analysis);
        info!(
            kind = %kind,
            risk_level = %result.risk_level,
            confidence = result.confidence,
            report_count = result.report_count,
            "Search completed"
        );
        result
    }
}

/// Verdict derived from community data alone, used whenever the dispatcher
/// cannot produce a result.
pub fn local_fallback(community: &CommunitySignal) -> AnalysisResult {
    if community.report_count == 0 {
        return AnalysisResult {
            risk_level: RiskLevel::Safe,
            confidence: FALLBACK_NEUTRAL_CONFIDENCE,
            reasons: vec![
                "No analysis backend available and no community reports to draw on".to_string(),
            ],
            narrative: "No analysis backend is configured and the community has not reported \
                        this identifier. Treat this as an absence of evidence, not a clean bill \
                        of health."
                .to_string(),
            recommendations: vec![
                "Configure an analysis backend for a deeper verdict".to_string(),
            ],
            urgency: Urgency::Low,
            similar_patterns: Vec::new(),
            prevention_tips: Vec::new(),
        };
    }

    let (risk_level, urgency) = verdict_from_report_count(community.report_count);
    AnalysisResult {
        risk_level,
        confidence: FALLBACK_REPORTS_CONFIDENCE,
        reasons: vec![format!(
            "Verdict derived from {} community report(s); no analysis backend was reachable",
            community.report_count
        )],
        narrative: format!(
            "This identifier has {} community report(s) on record. The verdict is based on \
             report volume alone because no analysis backend was reachable.",
            community.report_count
        ),
        recommendations: vec![
            "Avoid engaging with this identifier until it is verified".to_string(),
        ],
        urgency,
        similar_patterns: Vec::new(),
        prevention_tips: vec![
            "Treat unsolicited contact from reported identifiers as hostile".to_string(),
        ],
    }
}

fn verdict_from_report_count(report_count: u32) -> (RiskLevel, Urgency) {
    if report_count >= DANGEROUS_REPORTS {
        (RiskLevel::Dangerous, Urgency::High)
    } else if report_count >= SUSPICIOUS_REPORTS {
        (RiskLevel::Suspicious, Urgency::Medium)
    } else {
        (RiskLevel::Safe, Urgency::Low)
    }
}

/// The community signal carries no urgency of its own; it contributes one
/// derived from report volume, on the same thresholds as the local fallback.
fn community_urgency(report_count: u32) -> Urgency {
    verdict_from_report_count(report_count).1
}

/// Fuse the two signals. Asymmetric on purpose:
/// - ordinal fields (risk level, urgency, confidence) take the max, so the
///   fused verdict is never less alarming than either source;
/// - reasons concatenate community-first with no de-duplication, preserving
///   provenance;
/// - recommendations/similar_patterns/prevention_tips come from the backend
///   result only, report_count/verified_reports from the community only;
///   each source keeps the fields only it can produce.
pub fn fuse(community: CommunitySignal, analysis: AnalysisResult) -> SearchResult {
    let mut reasons = community.reasons;
    reasons.extend(analysis.reasons);

    SearchResult {
        risk_level: community.risk_level.max(analysis.risk_level),
        report_count: community.report_count,
        confidence: community.confidence.max(analysis.confidence),
        reasons,
        narrative: analysis.narrative,
        verified_reports: community.verified_reports,
        recommendations: analysis.recommendations,
        urgency: community_urgency(community.report_count).max(analysis.urgency),
        similar_patterns: analysis.similar_patterns,
        prevention_tips: analysis.prevention_tips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community(risk_level: RiskLevel, report_count: u32, confidence: u8) -> CommunitySignal {
        CommunitySignal {
            risk_level,
            report_count,
            confidence,
            reasons: vec![format!("community says {risk_level}")],
            verified_reports: Vec::new(),
        }
    }

    fn analysis(risk_level: RiskLevel, urgency: Urgency, confidence: u8) -> AnalysisResult {
        AnalysisResult {
            risk_level,
            confidence,
            reasons: vec![format!("backend says {risk_level}")],
            narrative: "backend narrative".to_string(),
            recommendations: vec!["backend recommendation".to_string()],
            urgency,
            similar_patterns: vec!["pattern".to_string()],
            prevention_tips: vec!["tip".to_string()],
        }
    }

    const LEVELS: [RiskLevel; 3] = [
        RiskLevel::Safe,
        RiskLevel::Suspicious,
        RiskLevel::Dangerous,
    ];

    #[test]
    fn fused_risk_is_never_less_severe_than_either_input() {
        for community_level in LEVELS {
            for backend_level in LEVELS {
                let fused = fuse(
                    community(community_level, 0, 60),
                    analysis(backend_level, Urgency::Low, 50),
                );
                assert!(
                    fused.risk_level >= community_level && fused.risk_level >= backend_level,
                    "{community_level} + {backend_level} fused to {}",
                    fused.risk_level
                );
            }
        }
    }

    #[test]
    fn confidence_takes_the_max_of_both_sources() {
        let fused = fuse(
            community(RiskLevel::Safe, 0, 60),
            analysis(RiskLevel::Suspicious, Urgency::Medium, 65),
        );
        assert_eq!(fused.confidence, 65);

        let fused = fuse(
            community(RiskLevel::Safe, 3, 90),
            analysis(RiskLevel::Suspicious, Urgency::Medium, 65),
        );
        assert_eq!(fused.confidence, 90);
    }

    #[test]
    fn reasons_concatenate_community_first_without_dedup() {
        let mut signal = community(RiskLevel::Safe, 0, 60);
        signal.reasons = vec!["shared reason".to_string()];
        let mut result = analysis(RiskLevel::Safe, Urgency::Low, 50);
        result.reasons = vec!["shared reason".to_string(), "backend only".to_string()];

        let fused = fuse(signal, result);
        assert_eq!(
            fused.reasons,
            vec!["shared reason", "shared reason", "backend only"]
        );
    }

    #[test]
    fn source_specific_fields_pass_through_untouched() {
        let mut signal = community(RiskLevel::Suspicious, 4, 70);
        signal.verified_reports = vec![scamsignal_common::ReportSummary {
            id: uuid::Uuid::new_v4(),
            category: "phishing".to_string(),
            summary: "fake login".to_string(),
            reported_at: chrono::Utc::now(),
        }];

        let fused = fuse(signal, analysis(RiskLevel::Safe, Urgency::Low, 50));
        assert_eq!(fused.report_count, 4);
        assert_eq!(fused.verified_reports.len(), 1);
        assert_eq!(fused.recommendations, vec!["backend recommendation"]);
        assert_eq!(fused.similar_patterns, vec!["pattern"]);
        assert_eq!(fused.prevention_tips, vec!["tip"]);
        assert_eq!(fused.narrative, "backend narrative");
    }

    #[test]
    fn heavy_report_volume_raises_fused_urgency() {
        let fused = fuse(
            community(RiskLevel::Dangerous, 6, 80),
            analysis(RiskLevel::Safe, Urgency::Low, 50),
        );
        assert_eq!(fused.urgency, Urgency::High);

        let fused = fuse(
            community(RiskLevel::Safe, 0, 60),
            analysis(RiskLevel::Dangerous, Urgency::Critical, 90),
        );
        assert_eq!(fused.urgency, Urgency::Critical);
    }

    #[test]
    fn local_fallback_applies_report_thresholds() {
        let many = local_fallback(&community(RiskLevel::Dangerous, 6, 80));
        assert_eq!(many.risk_level, RiskLevel::Dangerous);
        assert_eq!(many.urgency, Urgency::High);
        assert_eq!(many.confidence, FALLBACK_REPORTS_CONFIDENCE);

        let some = local_fallback(&community(RiskLevel::Suspicious, 2, 70));
        assert_eq!(some.risk_level, RiskLevel::Suspicious);
        assert_eq!(some.urgency, Urgency::Medium);

        let one = local_fallback(&community(RiskLevel::Safe, 1, 65));
        assert_eq!(one.risk_level, RiskLevel::Safe);
        assert_eq!(one.urgency, Urgency::Low);
        assert_eq!(one.confidence, FALLBACK_REPORTS_CONFIDENCE);
    }

    #[test]
    fn local_fallback_without_reports_is_neutral_and_says_so() {
        let neutral = local_fallback(&default_signal());
        assert_eq!(neutral.risk_level, RiskLevel::Safe);
        assert_eq!(neutral.urgency, Urgency::Low);
        assert_eq!(neutral.confidence, FALLBACK_NEUTRAL_CONFIDENCE);
        assert!(neutral.reasons[0].contains("No analysis backend"));
    }
}
