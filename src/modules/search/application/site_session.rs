use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::orchestrator::SearchOrchestrator;
use super::ports::PageQuery;
use crate::modules::search::domain::config::SiteConfig;
use crate::modules::search::domain::value_objects::SearchOutcome;
use crate::shared::utils::logger::TimedOperation;

/// Search capability of one storefront
#[async_trait]
pub trait StorefrontSearch: Send + Sync {
    fn site_id(&self) -> &str;

    async fn search(&self, title: &str) -> SearchOutcome;

    /// Re-read the product page at `url` and check it is really `title`
    async fn verify_candidate(&self, url: &str, title: &str) -> bool;
}

/// A site configuration bound to its own page and the shared orchestrator
pub struct SiteSession {
    config: SiteConfig,
    page: Box<dyn PageQuery>,
    orchestrator: Arc<SearchOrchestrator>,
    cancel: CancellationToken,
}

impl SiteSession {
    pub fn new(
        config: SiteConfig,
        page: Box<dyn PageQuery>,
        orchestrator: Arc<SearchOrchestrator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            page,
            orchestrator,
            cancel,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }
}

#[async_trait]
impl StorefrontSearch for SiteSession {
    fn site_id(&self) -> &str {
        &self.config.site_id
    }

    async fn search(&self, title: &str) -> SearchOutcome {
        self.orchestrator
            .find_best_match(self.page.as_ref(), title, &self.config, &self.cancel)
            .await
    }

    async fn verify_candidate(&self, url: &str, title: &str) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let timer = TimedOperation::new(&format!("verify {} on {}", url, self.config.site_id));
        let deadline = Instant::now() + self.config.retry.book_budget();
        let threshold = self.orchestrator.threshold_for(&self.config);
        let verdict = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            verdict = self.orchestrator.verify(self.page.as_ref(), &self.config, url, title, deadline) => verdict,
        };
        timer.finish();

        match verdict {
            Ok(Some(score)) => score.meets(threshold),
            Ok(None) => false,
            Err(error) => {
                log::warn!(
                    "SESSION: [{}] verification of {} failed: {}",
                    self.config.site_id,
                    url,
                    error
                );
                false
            }
        }
    }
}
