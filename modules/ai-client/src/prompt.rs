//! The shared prompt contract every backend adapter speaks.
//!
//! This is a data contract, not prose wording: adapters may restyle the
//! instruction text, but the requested field set and the enumerated value
//! sets must stay exactly as the normalizer expects them on the happy path.

use scamsignal_common::AnalysisRequest;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a fraud and scam analyst. You are given a single identifier a user wants checked — a phone number, URL, email address, or a piece of free text such as a message they received.

Assess how likely the identifier is to be involved in a scam, fraud, or phishing operation, using only the information in the request.

Reply with a single JSON object and nothing else. The object must contain exactly these fields:

- "risk_level": one of "safe", "suspicious", "dangerous"
- "confidence": integer from 0 to 100
- "reasons": array of short strings explaining the verdict
- "narrative": one plain-language paragraph a non-technical user can read
- "recommendations": array of short, concrete next steps for the user
- "urgency": one of "low", "medium", "high", "critical"
- "similar_patterns": array of known scam patterns this resembles
- "prevention_tips": array of general tips to avoid this class of scam

Do not invent facts about the identifier. If the request notes prior community reports, weigh them as corroborating evidence. When in doubt between two levels, prefer the more cautious one and say why in "reasons"."#;

/// Build the per-call user prompt from the request and the reply language.
pub fn analysis_user_prompt(request: &AnalysisRequest, language: &str) -> String {
    format!(
        "Identifier to analyze: {query}\n\
         Identifier type: {kind}\n\
         Prior community reports for this identifier: {reports}\n\
         Context: {context}\n\
         Reply language: {language}",
        query = request.query,
        kind = request.kind,
        reports = request.prior_report_count,
        context = request.context,
        language = language,
    )
}

/// User prompt for image analysis (screenshots of messages, QR codes, ads).
pub fn image_user_prompt(language: &str) -> String {
    format!(
        "The attached image was submitted by a user who suspects it shows a scam \
         (for example a screenshot of a message, an ad, or a QR code). Analyze it \
         for scam indicators.\n\
         Reply language: {language}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamsignal_common::IdentifierKind;

    #[test]
    fn user_prompt_carries_request_fields() {
        let request = AnalysisRequest {
            query: "+1 (612) 555-0134".to_string(),
            kind: IdentifierKind::Phone,
            prior_report_count: 3,
            context: "User safety check".to_string(),
        };
        let prompt = analysis_user_prompt(&request, "en");
        assert!(prompt.contains("+1 (612) 555-0134"));
        assert!(prompt.contains("Identifier type: phone"));
        assert!(prompt.contains("reports for this identifier: 3"));
        assert!(prompt.contains("Reply language: en"));
    }

    #[test]
    fn system_prompt_names_every_contract_field() {
        for field in [
            "risk_level",
            "confidence",
            "reasons",
            "narrative",
            "recommendations",
            "urgency",
            "similar_patterns",
            "prevention_tips",
        ] {
            assert!(
                ANALYSIS_SYSTEM_PROMPT.contains(field),
                "missing field {field}"
            );
        }
    }
}
