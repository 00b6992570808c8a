use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ports::{ElementHandle, IdleState, Interaction, PageError, PageQuery};
use super::selector_fallback::SelectorFallbackMatcher;
use crate::modules::search::domain::config::{SearchMode, SearchSettings, SiteConfig};
use crate::modules::search::domain::services::{QueryVariantGenerator, SearchMetrics};
use crate::modules::search::domain::value_objects::{
    CandidateResult, QueryVariant, ScoredCandidate, SearchFailure, SearchOutcome,
};
use crate::modules::search::infrastructure::politeness::SitePoliteness;
use crate::modules::search::infrastructure::retry_util::{RetryOutcome, RetryUtil};
use crate::modules::search::infrastructure::url_normalizer::{is_on_domain, normalize_candidate_url};
use crate::modules::title::domain::services::SimilarityScorer;
use crate::modules::title::{MatchScore, NormalizedTitle};
use crate::shared::utils::logger::{LogContext, TimedOperation};

/// What happened to one submission of one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    Success,
    Empty,
    TransientError,
    FatalError,
}

/// Working memory entry; dropped with the run
#[derive(Debug, Clone)]
struct SearchAttempt {
    variant: QueryVariant,
    selector_used: Option<String>,
    outcome: AttemptOutcome,
}

/// Explicit search state machine
enum SearchState {
    Init,
    VariantSelected(QueryVariant),
    SearchExecuted(QueryVariant),
    CandidatesExtracted {
        variant: QueryVariant,
        candidates: Vec<CandidateResult>,
    },
    Scored {
        variant: QueryVariant,
        best: ScoredCandidate,
    },
    Accepted(ScoredCandidate),
    VariantExhausted,
    Done(SearchOutcome),
}

impl SearchState {
    fn name(&self) -> &'static str {
        match self {
            SearchState::Init => "Init",
            SearchState::VariantSelected(_) => "VariantSelected",
            SearchState::SearchExecuted(_) => "SearchExecuted",
            SearchState::CandidatesExtracted { .. } => "CandidatesExtracted",
            SearchState::Scored { .. } => "Scored",
            SearchState::Accepted(_) => "Accepted",
            SearchState::VariantExhausted => "VariantExhausted",
            SearchState::Done(_) => "Done",
        }
    }
}

/// Whether the query reached the site's search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submission {
    Submitted,
    NoSearchBox,
}

/// Per-search bookkeeping owned by one `find_best_match` call
struct SearchRun<'a> {
    page: &'a dyn PageQuery,
    site: &'a SiteConfig,
    query: &'a str,
    normalized_query: NormalizedTitle,
    threshold: f64,
    cancel: &'a CancellationToken,
    deadline: Instant,
    variants: VecDeque<QueryVariant>,
    history: Vec<SearchAttempt>,
    submissions: u32,
    best_seen: Option<ScoredCandidate>,
    last_transient: Option<PageError>,
    saw_candidates: bool,
}

impl SearchRun<'_> {
    fn record(&mut self, variant: &QueryVariant, selector_used: Option<String>, outcome: AttemptOutcome) {
        self.history.push(SearchAttempt {
            variant: variant.clone(),
            selector_used,
            outcome,
        });
    }

    /// Domain every result must live on when the site carries a filter hint
    fn site_filter(&self) -> Option<&str> {
        self.site
            .hints
            .site_filter
            .as_deref()
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
    }

    /// Per-call limit, never past the book budget
    fn call_limit(&self) -> Duration {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        self.site.retry.attempt_timeout().min(remaining)
    }

    fn consider(&mut self, candidate: ScoredCandidate) {
        let replace = match &self.best_seen {
            Some(best) => candidate.beats(best),
            None => true,
        };
        if replace {
            self.best_seen = Some(candidate);
        }
    }

    fn site_id(&self) -> &str {
        &self.site.site_id
    }

    fn summarize_history(&self) -> String {
        let count = |wanted: AttemptOutcome| {
            self.history
                .iter()
                .filter(|attempt| attempt.outcome == wanted)
                .count()
        };
        for attempt in &self.history {
            log::trace!(
                "ORCHESTRATOR: [{}] {:?} '{}' via {} -> {:?}",
                self.site_id(),
                attempt.variant.strategy,
                attempt.variant.text,
                attempt.selector_used.as_deref().unwrap_or("-"),
                attempt.outcome
            );
        }
        format!(
            "{} with results, {} empty, {} transient, {} fatal",
            count(AttemptOutcome::Success),
            count(AttemptOutcome::Empty),
            count(AttemptOutcome::TransientError),
            count(AttemptOutcome::FatalError)
        )
    }
}

/// Drives one page through query variants until a candidate is accepted.
///
/// All collaborator failures come back as values; `find_best_match` always
/// returns a `SearchOutcome`.
pub struct SearchOrchestrator {
    scorer: Arc<SimilarityScorer>,
    default_threshold: f64,
    politeness: Option<Arc<SitePoliteness>>,
    metrics: Arc<SearchMetrics>,
}

impl SearchOrchestrator {
    pub fn new(scorer: Arc<SimilarityScorer>) -> Self {
        Self {
            scorer,
            default_threshold: crate::modules::search::domain::config::DEFAULT_ACCEPT_THRESHOLD,
            politeness: None,
            metrics: Arc::new(SearchMetrics::new()),
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(Arc::new(SimilarityScorer::default()))
            .with_default_threshold(settings.accept_threshold)
            .with_politeness(Arc::new(SitePoliteness::from_settings(settings)))
    }

    pub fn with_default_threshold(mut self, threshold: f64) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn with_politeness(mut self, politeness: Arc<SitePoliteness>) -> Self {
        self.politeness = Some(politeness);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SearchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn threshold_for(&self, site: &SiteConfig) -> f64 {
        site.effective_threshold(self.default_threshold)
    }

    /// Search one site for `query_title` and return the best match found
    pub async fn find_best_match(
        &self,
        page: &dyn PageQuery,
        query_title: &str,
        site: &SiteConfig,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let timer = TimedOperation::new(&format!("search '{}' on {}", query_title, site.name()));
        LogContext::search_operation(query_title, Some(site.name()), None);

        let mut run = SearchRun {
            page,
            site,
            query: query_title,
            normalized_query: self.scorer.normalize(query_title),
            threshold: self.threshold_for(site),
            cancel,
            deadline: Instant::now() + site.retry.book_budget(),
            variants: VecDeque::new(),
            history: Vec::new(),
            submissions: 0,
            best_seen: None,
            last_transient: None,
            saw_candidates: false,
        };

        let mut state = SearchState::Init;
        let outcome = loop {
            if let SearchState::Done(outcome) = state {
                break outcome;
            }

            if run.cancel.is_cancelled() {
                log::info!(
                    "ORCHESTRATOR: [{}] cancelled in state {}",
                    run.site_id(),
                    state.name()
                );
                state = SearchState::Done(SearchOutcome::cancelled(
                    run.site_id(),
                    run.query,
                    run.submissions,
                ));
                continue;
            }

            log::trace!("ORCHESTRATOR: [{}] {}", run.site_id(), state.name());
            state = self.step(state, &mut run).await;
        };

        self.metrics.record_outcome(&outcome);
        log::info!(
            "ORCHESTRATOR: [{}] '{}' finished {} after {} attempts ({})",
            site.site_id,
            query_title,
            outcome.status.as_str(),
            outcome.attempts,
            run.summarize_history()
        );
        timer.finish_with_info(outcome.status.as_str());
        outcome
    }

    async fn step(&self, state: SearchState, run: &mut SearchRun<'_>) -> SearchState {
        match state {
            SearchState::Init => {
                let generator = QueryVariantGenerator::new(run.site.retry.max_variants);
                run.variants = generator
                    .generate_variants(run.query, Some(&run.site.hints))
                    .into();
                self.next_variant(run)
            }
            SearchState::VariantSelected(variant) => self.execute_search(variant, run).await,
            SearchState::SearchExecuted(variant) => self.extract_candidates(variant, run).await,
            SearchState::CandidatesExtracted {
                variant,
                candidates,
            } => self.score_candidates(variant, candidates, run),
            SearchState::Scored { variant, best } => self.judge(variant, best, run).await,
            SearchState::Accepted(best) => SearchState::Done(SearchOutcome::accepted(
                run.site_id(),
                run.query,
                run.submissions,
                best,
            )),
            SearchState::VariantExhausted => SearchState::Done(self.exhausted_outcome(run)),
            SearchState::Done(outcome) => SearchState::Done(outcome),
        }
    }

    fn next_variant(&self, run: &mut SearchRun<'_>) -> SearchState {
        if Instant::now() >= run.deadline {
            log::warn!(
                "ORCHESTRATOR: [{}] search budget spent with {} variants left",
                run.site_id(),
                run.variants.len()
            );
            return SearchState::VariantExhausted;
        }

        match run.variants.pop_front() {
            Some(variant) => {
                log::debug!(
                    "ORCHESTRATOR: [{}] trying {:?} variant '{}'",
                    run.site_id(),
                    variant.strategy,
                    variant.text
                );
                SearchState::VariantSelected(variant)
            }
            None => SearchState::VariantExhausted,
        }
    }

    async fn execute_search(&self, variant: QueryVariant, run: &mut SearchRun<'_>) -> SearchState {
        let operation_name = format!("search '{}' on {}", variant.text, run.site_id());
        let (page, site, deadline) = (run.page, run.site, run.deadline);

        let (outcome, tries) = RetryUtil::with_retry(
            |_| self.submit_once(page, site, &variant.text, deadline),
            &site.retry,
            run.cancel,
            deadline,
            &operation_name,
        )
        .await;

        run.submissions += tries;
        let transient_tries = match &outcome {
            RetryOutcome::Succeeded(_) | RetryOutcome::Fatal(_) | RetryOutcome::Cancelled => {
                tries.saturating_sub(1)
            }
            RetryOutcome::Exhausted(_) => tries,
        };
        for _ in 0..transient_tries {
            self.metrics.record_transient_failure();
            run.record(&variant, None, AttemptOutcome::TransientError);
        }

        match outcome {
            RetryOutcome::Succeeded(Submission::Submitted) => SearchState::SearchExecuted(variant),
            RetryOutcome::Succeeded(Submission::NoSearchBox) => {
                log::warn!(
                    "ORCHESTRATOR: [{}] no search input selector matched",
                    run.site_id()
                );
                run.record(&variant, None, AttemptOutcome::Empty);
                self.next_variant(run)
            }
            RetryOutcome::Exhausted(error) => {
                log::warn!(
                    "ORCHESTRATOR: [{}] giving up on '{}': {}",
                    run.site_id(),
                    variant.text,
                    error
                );
                run.last_transient = Some(error);
                self.next_variant(run)
            }
            RetryOutcome::Fatal(error) => self.fail(run, &variant, error),
            RetryOutcome::Cancelled => SearchState::Done(SearchOutcome::cancelled(
                run.site_id(),
                run.query,
                run.submissions,
            )),
        }
    }

    /// One search submission; waits for the site's politeness quota first
    async fn submit_once(
        &self,
        page: &dyn PageQuery,
        site: &SiteConfig,
        text: &str,
        deadline: Instant,
    ) -> Result<Submission, PageError> {
        if let Some(politeness) = &self.politeness {
            let remaining = deadline.saturating_duration_since(Instant::now());
            RetryUtil::bounded(
                remaining,
                async {
                    politeness.until_ready(&site.site_id).await;
                    Ok(())
                },
                "politeness",
            )
            .await?;
        }

        let limit = || {
            site.retry
                .attempt_timeout()
                .min(deadline.saturating_duration_since(Instant::now()))
        };

        match &site.search {
            SearchMode::UrlTemplate { .. } => {
                let url = site.search_url_for(text).ok_or_else(|| {
                    PageError::SiteUnavailable(format!("{} has no search URL", site.site_id))
                })?;
                RetryUtil::bounded(limit(), page.navigate(&url), "navigate").await?;
            }
            SearchMode::Form {
                input_selectors,
                submit_selectors,
                search_page_url,
            } => {
                let start = search_page_url.as_deref().unwrap_or(&site.base_url);
                RetryUtil::bounded(limit(), page.navigate(start), "navigate").await?;

                let mut input_used = None;
                for selector in input_selectors {
                    let typed =
                        RetryUtil::bounded(limit(), page.type_into(selector, text), "type_into")
                            .await?;
                    if typed == Interaction::Done {
                        input_used = Some(selector);
                        break;
                    }
                }
                let Some(input) = input_used else {
                    return Ok(Submission::NoSearchBox);
                };

                let mut submitted = false;
                for selector in submit_selectors {
                    let clicked =
                        RetryUtil::bounded(limit(), page.submit(selector), "submit").await?;
                    if clicked == Interaction::Done {
                        submitted = true;
                        break;
                    }
                }
                if !submitted {
                    RetryUtil::bounded(limit(), page.submit(input), "submit").await?;
                }
            }
        }

        let idle_timeout = Duration::from_millis(site.idle_timeout_ms);
        let idle =
            RetryUtil::bounded(limit(), page.wait_for_idle(idle_timeout), "wait_for_idle").await?;
        if idle == IdleState::TimedOut {
            log::debug!(
                "ORCHESTRATOR: [{}] page still busy after {:?}, reading results anyway",
                site.site_id,
                idle_timeout
            );
        }

        Ok(Submission::Submitted)
    }

    async fn extract_candidates(&self, variant: QueryVariant, run: &mut SearchRun<'_>) -> SearchState {
        let matcher = SelectorFallbackMatcher::new(run.call_limit());
        let scan = matcher
            .find_first_match(run.page, &run.site.result_selectors)
            .await;
        let found = match scan {
            Ok(found) => found,
            Err(error) => return self.fail(run, &variant, error),
        };

        let Some(found) = found else {
            LogContext::search_operation(&variant.text, Some(run.site.name()), Some(0));
            run.record(&variant, None, AttemptOutcome::Empty);
            return self.next_variant(run);
        };

        let read = self.read_candidates(run, &found.elements).await;
        let candidates = match read {
            Ok(candidates) => candidates,
            Err(error) => return self.fail(run, &variant, error),
        };

        LogContext::search_operation(&variant.text, Some(run.site.name()), Some(candidates.len()));
        if candidates.is_empty() {
            run.record(&variant, Some(found.selector), AttemptOutcome::Empty);
            return self.next_variant(run);
        }

        run.saw_candidates = true;
        run.record(&variant, Some(found.selector), AttemptOutcome::Success);
        SearchState::CandidatesExtracted {
            variant,
            candidates,
        }
    }

    /// Title text and absolute link of each result element
    async fn read_candidates(
        &self,
        run: &SearchRun<'_>,
        elements: &[ElementHandle],
    ) -> Result<Vec<CandidateResult>, PageError> {
        let mut candidates = Vec::new();

        for element in elements.iter().take(run.site.max_candidates) {
            let title = match RetryUtil::bounded(run.call_limit(), run.page.text_of(element), "text_of").await {
                Ok(text) => text.trim().to_string(),
                Err(error) if error.is_transient() => continue,
                Err(error) => return Err(error),
            };
            if title.is_empty() {
                continue;
            }

            let link = match RetryUtil::bounded(
                run.call_limit(),
                run.page.attribute_of(element, &run.site.link_attribute),
                "attribute_of",
            )
            .await
            {
                Ok(link) => link,
                Err(error) if error.is_transient() => continue,
                Err(error) => return Err(error),
            };

            let Some(url) = link.and_then(|raw| normalize_candidate_url(&raw, &run.site.base_url))
            else {
                log::trace!("ORCHESTRATOR: [{}] '{}' has no usable link", run.site_id(), title);
                continue;
            };

            if let Some(domain) = run.site_filter() {
                if !is_on_domain(&url, domain) {
                    log::trace!("ORCHESTRATOR: [{}] dropping off-site link {}", run.site_id(), url);
                    continue;
                }
            }

            candidates.push(CandidateResult {
                raw_title: title,
                url,
                site_id: run.site.site_id.clone(),
            });
        }

        Ok(candidates)
    }

    fn score_candidates(
        &self,
        variant: QueryVariant,
        candidates: Vec<CandidateResult>,
        run: &mut SearchRun<'_>,
    ) -> SearchState {
        let mut best: Option<ScoredCandidate> = None;

        for candidate in candidates {
            let score = self
                .scorer
                .score_normalized(&run.normalized_query, &self.scorer.normalize(&candidate.raw_title));
            LogContext::candidate_scored(run.site_id(), &candidate.raw_title, score.value, score.tier.as_str());

            let scored = ScoredCandidate { candidate, score };
            let replace = best.as_ref().map(|b| scored.beats(b)).unwrap_or(true);
            if replace {
                best = Some(scored);
            }
        }

        match best {
            Some(best) => SearchState::Scored { variant, best },
            None => self.next_variant(run),
        }
    }

    async fn judge(&self, variant: QueryVariant, best: ScoredCandidate, run: &mut SearchRun<'_>) -> SearchState {
        if !best.score.meets(run.threshold) {
            log::debug!(
                "ORCHESTRATOR: [{}] best for '{}' is {} below {:.2}",
                run.site_id(),
                variant.text,
                best.score,
                run.threshold
            );
            run.consider(best);
            return self.next_variant(run);
        }

        if !run.site.verify_matches {
            return SearchState::Accepted(best);
        }

        let verdict = self
            .verify(run.page, run.site, &best.candidate.url, run.query, run.deadline)
            .await;
        match verdict {
            Ok(Some(detail)) if detail.meets(run.threshold) => SearchState::Accepted(best),
            Ok(Some(detail)) => {
                log::info!(
                    "ORCHESTRATOR: [{}] detail page of {} scored {}, rejecting",
                    run.site_id(),
                    best.candidate.url,
                    detail
                );
                run.consider(ScoredCandidate {
                    candidate: best.candidate,
                    score: detail,
                });
                self.next_variant(run)
            }
            Ok(None) => {
                log::info!(
                    "ORCHESTRATOR: [{}] could not read detail title of {}",
                    run.site_id(),
                    best.candidate.url
                );
                self.next_variant(run)
            }
            Err(error) => self.fail(run, &variant, error),
        }
    }

    /// Open `url` and score its product title against `title`.
    ///
    /// `Ok(None)` when the title could not be read in time.
    pub async fn verify(
        &self,
        page: &dyn PageQuery,
        site: &SiteConfig,
        url: &str,
        title: &str,
        deadline: Instant,
    ) -> Result<Option<MatchScore>, PageError> {
        let limit = || {
            site.retry
                .attempt_timeout()
                .min(deadline.saturating_duration_since(Instant::now()))
        };

        match RetryUtil::bounded(limit(), page.navigate(url), "navigate").await {
            Ok(()) => {}
            Err(error) if error.is_transient() => return Ok(None),
            Err(error) => return Err(error),
        }

        let idle_timeout = Duration::from_millis(site.idle_timeout_ms);
        match RetryUtil::bounded(limit(), page.wait_for_idle(idle_timeout), "wait_for_idle").await {
            Ok(_) => {}
            Err(error) if error.is_transient() => return Ok(None),
            Err(error) => return Err(error),
        }

        let matcher = SelectorFallbackMatcher::new(limit());
        let Some(found) = matcher
            .find_first_match(page, &site.detail_title_selectors)
            .await?
        else {
            return Ok(None);
        };
        let Some(element) = found.elements.first() else {
            return Ok(None);
        };

        let detail_title = match RetryUtil::bounded(limit(), page.text_of(element), "text_of").await {
            Ok(text) => text,
            Err(error) if error.is_transient() => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(Some(self.scorer.score(title, &detail_title)))
    }

    fn fail(&self, run: &mut SearchRun<'_>, variant: &QueryVariant, error: PageError) -> SearchState {
        log::warn!(
            "ORCHESTRATOR: [{}] fatal error on '{}': {}",
            run.site_id(),
            variant.text,
            error
        );
        run.record(variant, None, AttemptOutcome::FatalError);
        SearchState::Done(SearchOutcome::error(
            run.site_id(),
            run.query,
            run.submissions,
            error.to_string(),
        ))
    }

    fn exhausted_outcome(&self, run: &mut SearchRun<'_>) -> SearchOutcome {
        if let Some(best) = run.best_seen.take() {
            return SearchOutcome::low_confidence(
                run.site_id(),
                run.query,
                run.submissions,
                best,
                run.threshold,
            );
        }

        let failure = match (&run.last_transient, run.saw_candidates) {
            (Some(error), false) => SearchFailure::TransientNetworkFailure(error.to_string()),
            _ => SearchFailure::NoCandidatesFound,
        };
        SearchOutcome::no_results(run.site_id(), run.query, run.submissions, failure)
    }
}
