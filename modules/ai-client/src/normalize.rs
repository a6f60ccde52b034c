//! Turns a raw backend reply into a validated [`AnalysisResult`].
//!
//! Backends are untrusted: prompt-following quality drifts, formats drift,
//! and some models answer in prose. Normalization therefore has two tiers
//! (a strict structured parse, then a bounded keyword-scan fallback) and it
//! never fails. A reply we cannot read becomes a conservative best-effort
//! classification, not an error.

use serde::Deserialize;
use tracing::warn;

use scamsignal_common::{AnalysisResult, RiskLevel, Urgency};

use crate::util::{carve_json_object, strip_code_fences, truncate_to_char_boundary};

/// Confidence when the structured reply omits the field.
const MISSING_CONFIDENCE: u8 = 60;

/// Confidence assigned by the keyword fallback: the backend responded, but
/// unstructured, so the classification is weaker than a parsed one.
const FALLBACK_CONFIDENCE: u8 = 70;

/// Max bytes of raw reply quoted into the fallback narrative.
const EXCERPT_BYTES: usize = 280;

/// Lenient mirror of the reply contract. Every field optional so a reply
/// missing half the contract still takes the structured path.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    risk_level: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    reasons: Vec<String>,
    narrative: Option<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    urgency: Option<String>,
    #[serde(default)]
    similar_patterns: Vec<String>,
    #[serde(default)]
    prevention_tips: Vec<String>,
}

/// Normalize a raw backend reply. Always returns a complete result.
pub fn normalize(raw: &str) -> AnalysisResult {
    match parse_structured(raw) {
        Some(parsed) => validate(parsed),
        None => keyword_fallback(raw),
    }
}

fn parse_structured(raw: &str) -> Option<RawAnalysis> {
    let stripped = strip_code_fences(raw);
    if let Ok(parsed) = serde_json::from_str(stripped) {
        return Some(parsed);
    }
    // Some models wrap the object in prose. Carve the outermost braces
    // before giving up on the structured path.
    let carved = carve_json_object(stripped)?;
    serde_json::from_str(carved).ok()
}

fn validate(raw: RawAnalysis) -> AnalysisResult {
    let risk_level = match raw.risk_level.as_deref() {
        Some("safe") | None => RiskLevel::Safe,
        Some("suspicious") => RiskLevel::Suspicious,
        Some("dangerous") => RiskLevel::Dangerous,
        Some(other) => {
            // An unrecognized level must never silently escalate risk.
            warn!(value = other, "Unknown risk_level in backend reply, collapsing to safe");
            RiskLevel::Safe
        }
    };

    let urgency = match raw.urgency.as_deref() {
        Some("low") | None => Urgency::Low,
        Some("medium") => Urgency::Medium,
        Some("high") => Urgency::High,
        Some("critical") => Urgency::Critical,
        Some(other) => {
            warn!(value = other, "Unknown urgency in backend reply, collapsing to low");
            Urgency::Low
        }
    };

    let confidence = match raw.confidence {
        Some(value) => value.clamp(0.0, 100.0) as u8,
        None => MISSING_CONFIDENCE,
    };

    let narrative = match raw.narrative {
        Some(text) if !text.trim().is_empty() => text,
        _ => "Analysis completed.".to_string(),
    };

    AnalysisResult {
        risk_level,
        confidence,
        reasons: raw.reasons,
        narrative,
        recommendations: raw.recommendations,
        urgency,
        similar_patterns: raw.similar_patterns,
        prevention_tips: raw.prevention_tips,
    }
}

const DANGER_TERMS: &[&str] = &[
    "scam",
    "fraud",
    "phishing",
    "dangerous",
    "malicious",
    "identity theft",
    "do not engage",
    "steal",
];

const SUSPICION_TERMS: &[&str] = &[
    "suspicious",
    "caution",
    "warning",
    "risky",
    "unusual",
    "unverified",
    "be careful",
];

/// Best-effort classification of an unstructured reply by keyword scan.
fn keyword_fallback(raw: &str) -> AnalysisResult {
    let lowered = raw.to_lowercase();

    let (risk_level, urgency) = if DANGER_TERMS.iter().any(|term| lowered.contains(term)) {
        (RiskLevel::Dangerous, Urgency::High)
    } else if SUSPICION_TERMS.iter().any(|term| lowered.contains(term)) {
        (RiskLevel::Suspicious, Urgency::Medium)
    } else {
        (RiskLevel::Safe, Urgency::Low)
    };

    warn!(%risk_level, "Backend reply was not valid JSON, classified by keyword scan");

    let excerpt = truncate_to_char_boundary(raw.trim(), EXCERPT_BYTES);
    let narrative = if excerpt.is_empty() {
        "The analysis backend returned an empty reply.".to_string()
    } else {
        format!("Automated reading of the backend reply: {excerpt}")
    };

    AnalysisResult {
        risk_level,
        confidence: FALLBACK_CONFIDENCE,
        reasons: vec![
            "The analysis backend replied in an unstructured format; verdict derived from its wording".to_string(),
        ],
        narrative,
        recommendations: vec![
            "Do not share personal or financial information until the identifier is verified".to_string(),
            "Verify through an official channel before responding".to_string(),
        ],
        urgency,
        similar_patterns: Vec::new(),
        prevention_tips: vec![
            "Treat unsolicited requests for money, codes, or credentials as hostile".to_string(),
        ],
    }
}
