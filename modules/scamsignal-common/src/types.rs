use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Verdict Enums ---

/// Final verdict severity. Variant order is the severity order used by
/// signal fusion: `Safe < Suspicious < Dangerous`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Suspicious,
    Dangerous,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "safe"),
            RiskLevel::Suspicious => write!(f, "suspicious"),
            RiskLevel::Dangerous => write!(f, "dangerous"),
        }
    }
}

/// How quickly the user should act on the verdict.
/// Variant order is the severity order: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
            Urgency::Critical => write!(f, "critical"),
        }
    }
}

// --- Identifier Kinds ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Phone,
    Url,
    Email,
    Text,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Phone => write!(f, "phone"),
            IdentifierKind::Url => write!(f, "url"),
            IdentifierKind::Email => write!(f, "email"),
            IdentifierKind::Text => write!(f, "text"),
        }
    }
}

// --- Analysis Request / Result ---

/// One backend analysis call. Built fresh per search, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub query: String,
    pub kind: IdentifierKind,
    pub prior_report_count: u32,
    /// Short free-text context passed through to the backend prompt.
    pub context: String,
}

/// Normalized backend output. `confidence` is always within 0..=100 and
/// the enum fields are always in-set: the normalizer collapses anything
/// unrecognized to `Safe`/`Low` rather than passing raw backend text through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub narrative: String,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub similar_patterns: Vec<String>,
    pub prevention_tips: Vec<String>,
}

// --- Community Signal ---

/// Summary of one verified community report, as returned by the report store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: Uuid,
    pub category: String,
    pub summary: String,
    pub reported_at: DateTime<Utc>,
}

/// What the community report store knows about an identifier.
/// Read-only from the analysis core's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySignal {
    pub risk_level: RiskLevel,
    pub report_count: u32,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub verified_reports: Vec<ReportSummary>,
}

// --- Search Result ---

/// The fused, caller-facing verdict. Recomputed on every search, since community
/// data and backend availability both change, so freshness wins over reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub risk_level: RiskLevel,
    pub report_count: u32,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub narrative: String,
    pub verified_reports: Vec<ReportSummary>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub similar_patterns: Vec<String>,
    pub prevention_tips: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_orders_by_severity() {
        assert!(RiskLevel::Safe < RiskLevel::Suspicious);
        assert!(RiskLevel::Suspicious < RiskLevel::Dangerous);
        assert_eq!(
            RiskLevel::Suspicious.max(RiskLevel::Dangerous),
            RiskLevel::Dangerous
        );
    }

    #[test]
    fn urgency_orders_by_severity() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::High < Urgency::Critical);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Dangerous).unwrap(),
            "\"dangerous\""
        );
        assert_eq!(
            serde_json::to_string(&Urgency::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(
            serde_json::to_string(&IdentifierKind::Phone).unwrap(),
            "\"phone\""
        );
    }
}
