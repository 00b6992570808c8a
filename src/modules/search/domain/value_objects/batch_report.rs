use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::search_outcome::{SearchOutcome, SearchStatus};

/// Summary of one title searched across many sites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub query: String,
    pub total: usize,
    pub accepted: usize,
    pub low_confidence: usize,
    pub failed: usize,
    pub outcomes: Vec<SearchOutcome>,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(
        query: &str,
        mut outcomes: Vec<SearchOutcome>,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        outcomes.sort_by(|a, b| a.site_id.cmp(&b.site_id));

        let count = |status: SearchStatus| outcomes.iter().filter(|o| o.status == status).count();
        let accepted = count(SearchStatus::Accepted);
        let low_confidence = count(SearchStatus::LowConfidence);
        let failed = count(SearchStatus::Error) + count(SearchStatus::Cancelled);

        Self {
            query: query.to_string(),
            total: outcomes.len(),
            accepted,
            low_confidence,
            failed,
            outcomes,
            elapsed,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn outcome_for(&self, site_id: &str) -> Option<&SearchOutcome> {
        self.outcomes.iter().find(|o| o.site_id == site_id)
    }

    /// Site id and URL of every confident match, highest score first
    pub fn accepted_urls(&self) -> Vec<(&str, &str)> {
        let mut accepted: Vec<&SearchOutcome> =
            self.outcomes.iter().filter(|o| o.is_accepted()).collect();
        accepted.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        accepted
            .into_iter()
            .filter_map(|o| o.url.as_deref().map(|url| (o.site_id.as_str(), url)))
            .collect()
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("=== Batch Report: {} ===", self.query),
            format!("Sites: {}", self.total),
            format!("Accepted: {}", self.accepted),
            format!("Low Confidence: {}", self.low_confidence),
            format!("Failed: {}", self.failed),
            format!("Elapsed: {}ms", self.elapsed.as_millis()),
            String::new(),
            "Per Site:".to_string(),
        ];

        for outcome in &self.outcomes {
            lines.push(format!(
                "  {}: {} score={} attempts={}",
                outcome.site_id,
                outcome.status.as_str(),
                outcome
                    .score
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_else(|| "-".to_string()),
                outcome.attempts
            ));
        }

        lines.join("\n")
    }
}
