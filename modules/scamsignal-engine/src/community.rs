//! The community report store: read side consumed by signal fusion, write
//! side for user-submitted reports. The analysis core treats any
//! implementation of [`CommunityStore`] as an external collaborator.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scamsignal_common::{CommunitySignal, IdentifierKind, ReportSummary, RiskLevel};

/// Confidence of the default signal when no entity exists for an identifier.
pub const NO_REPORTS_CONFIDENCE: u8 = 60;

/// Max verified report summaries returned with a signal.
const MAX_REPORT_SUMMARIES: usize = 5;

/// A new user-submitted report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub target_value: String,
    pub target_kind: IdentifierKind,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub report_id: Option<Uuid>,
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Look up the community signal for an identifier. None when the store
    /// has never seen it.
    async fn lookup(
        &self,
        identifier: &str,
        kind: IdentifierKind,
    ) -> Result<Option<CommunitySignal>>;

    /// Verified report summaries for an identifier, newest first.
    async fn list_verified_reports(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ReportSummary>>;

    async fn submit_report(&self, report: NewReport) -> Result<SubmitOutcome>;
}

/// The signal used when the store has no entry (or the lookup failed):
/// neutral, with a reason the fusion step surfaces verbatim.
pub fn default_signal() -> CommunitySignal {
    CommunitySignal {
        risk_level: RiskLevel::Safe,
        report_count: 0,
        confidence: NO_REPORTS_CONFIDENCE,
        reasons: vec!["No prior community reports for this identifier".to_string()],
        verified_reports: Vec::new(),
    }
}

// =============================================================================
// File-backed store
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    id: Uuid,
    category: String,
    description: String,
    verified: bool,
    reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntity {
    identifier: String,
    kind: IdentifierKind,
    /// Aggregate risk score 0..=100 maintained on write.
    risk_score: u8,
    reports: Vec<StoredReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReportFile {
    #[serde(default)]
    entities: Vec<StoredEntity>,
}

impl StoredEntity {
    fn signal(&self) -> CommunitySignal {
        let report_count = self.reports.len() as u32;
        let risk_level = if self.risk_score >= 70 {
            RiskLevel::Dangerous
        } else if self.risk_score >= 40 {
            RiskLevel::Suspicious
        } else {
            RiskLevel::Safe
        };

        // More corroboration, more confidence, capped well below certainty.
        let confidence = (NO_REPORTS_CONFIDENCE as u32 + report_count * 5).min(95) as u8;

        let mut reasons = vec![format!(
            "Reported {report_count} time(s) by the community"
        )];
        if let Some(category) = self.top_category() {
            reasons.push(format!("Most common report category: {category}"));
        }

        CommunitySignal {
            risk_level,
            report_count,
            confidence,
            reasons,
            verified_reports: self.verified_summaries(MAX_REPORT_SUMMARIES),
        }
    }

    fn top_category(&self) -> Option<String> {
        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for report in &self.reports {
            *counts.entry(report.category.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(category, _)| category.to_string())
    }

    fn verified_summaries(&self, limit: usize) -> Vec<ReportSummary> {
        let mut verified: Vec<&StoredReport> =
            self.reports.iter().filter(|r| r.verified).collect();
        verified.sort_by_key(|r| std::cmp::Reverse(r.reported_at));
        verified
            .into_iter()
            .take(limit)
            .map(|r| ReportSummary {
                id: r.id,
                category: r.category.clone(),
                summary: r.description.clone(),
                reported_at: r.reported_at,
            })
            .collect()
    }
}

/// JSON-file community store. Enough to run the CLI end-to-end; a real
/// deployment substitutes its own [`CommunityStore`].
pub struct FileCommunityStore {
    path: PathBuf,
}

impl FileCommunityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<ReportFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ReportFile::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write(&self, file: &ReportFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[async_trait]
impl CommunityStore for FileCommunityStore {
    async fn lookup(
        &self,
        identifier: &str,
        kind: IdentifierKind,
    ) -> Result<Option<CommunitySignal>> {
        let file = self.read().await?;
        Ok(file
            .entities
            .iter()
            .find(|e| e.identifier == identifier && e.kind == kind)
            .map(StoredEntity::signal))
    }

    async fn list_verified_reports(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ReportSummary>> {
        let file = self.read().await?;
        Ok(file
            .entities
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| e.verified_summaries(limit))
            .unwrap_or_default())
    }

    async fn submit_report(&self, report: NewReport) -> Result<SubmitOutcome> {
        let mut file = self.read().await?;

        let index = match file
            .entities
            .iter()
            .position(|e| e.identifier == report.target_value && e.kind == report.target_kind)
        {
            Some(index) => index,
            None => {
                file.entities.push(StoredEntity {
                    identifier: report.target_value.clone(),
                    kind: report.target_kind,
                    risk_score: 0,
                    reports: Vec::new(),
                });
                file.entities.len() - 1
            }
        };
        let entity = &mut file.entities[index];

        let report_id = Uuid::new_v4();
        entity.reports.push(StoredReport {
            id: report_id,
            category: report.category,
            description: report.description,
            verified: false,
            reported_at: Utc::now(),
        });
        // Each report raises the aggregate score; five unanswered reports
        // reach the dangerous band.
        entity.risk_score = (entity.reports.len() as u8).saturating_mul(20).min(100);

        self.write(&file).await?;
        Ok(SubmitOutcome {
            success: true,
            report_id: Some(report_id),
        })
    }
}
