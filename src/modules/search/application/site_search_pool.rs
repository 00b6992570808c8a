use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use super::orchestrator::SearchOrchestrator;
use super::ports::PageFactory;
use super::site_session::{SiteSession, StorefrontSearch};
use crate::modules::search::domain::config::{SearchSettings, SiteCatalog, SiteConfig};
use crate::modules::search::domain::value_objects::{BatchReport, SearchOutcome};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_debug, log_info, log_warn};

/// Searches one title on every catalogued site, a bounded number at a time.
///
/// Each site search gets its own page from the factory and owns it until the
/// search ends.
pub struct SiteSearchPool {
    factory: Arc<dyn PageFactory>,
    orchestrator: Arc<SearchOrchestrator>,
    settings: SearchSettings,
}

impl SiteSearchPool {
    pub fn new(
        factory: Arc<dyn PageFactory>,
        orchestrator: Arc<SearchOrchestrator>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            factory,
            orchestrator,
            settings,
        }
    }

    /// Pool with an orchestrator built from `settings`
    pub fn from_settings(factory: Arc<dyn PageFactory>, settings: SearchSettings) -> Self {
        let orchestrator = Arc::new(SearchOrchestrator::from_settings(&settings));
        Self::new(factory, orchestrator, settings)
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub async fn search_all_sites(
        &self,
        title: &str,
        catalog: &SiteCatalog,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let timer = TimedOperation::new(&format!("batch search '{}'", title));
        let concurrency = self.settings.max_concurrent_sites.max(1);

        log_info!(
            "Searching '{}' on {} sites ({} at a time)",
            title,
            catalog.len(),
            concurrency
        );

        let outcomes = stream::iter(catalog.sites().cloned())
            .map(|site| self.search_site(site, title, cancel))
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        let report = BatchReport::new(title, outcomes, started_at, clock.elapsed());
        timer.finish_with_info(&format!(
            "{}/{} accepted, {} failed",
            report.accepted, report.total, report.failed
        ));
        report
    }

    /// Titles are searched one after another; sites run concurrently per title
    pub async fn search_books(
        &self,
        titles: &[String],
        catalog: &SiteCatalog,
        cancel: &CancellationToken,
    ) -> Vec<BatchReport> {
        let mut reports = Vec::with_capacity(titles.len());

        for (index, title) in titles.iter().enumerate() {
            if cancel.is_cancelled() {
                log_warn!("Batch cancelled with {} titles left", titles.len() - index);
                break;
            }
            LogContext::batch_progress(index + 1, titles.len(), title);
            reports.push(self.search_all_sites(title, catalog, cancel).await);
        }

        log_info!("{}", self.orchestrator.metrics().report());
        reports
    }

    async fn search_site(
        &self,
        site: SiteConfig,
        title: &str,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        if cancel.is_cancelled() {
            log_debug!("[{}] skipped, batch already cancelled", site.site_id);
            let outcome = SearchOutcome::cancelled(&site.site_id, title, 0);
            self.orchestrator.metrics().record_outcome(&outcome);
            return outcome;
        }

        let page = match self.factory.open_page(&site).await {
            Ok(page) => page,
            Err(error) => {
                LogContext::error_with_context(&error, &format!("opening page for {}", site.site_id));
                let outcome = SearchOutcome::error(&site.site_id, title, 0, error.to_string());
                self.orchestrator.metrics().record_outcome(&outcome);
                return outcome;
            }
        };

        let session = SiteSession::new(site, page, self.orchestrator.clone(), cancel.clone());
        session.search(title).await
    }
}
