use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::retry_policy::RetryPolicy;
use crate::shared::errors::{AppError, AppResult};

pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MAX_CONCURRENT_SITES: usize = 4;
pub const DEFAULT_SITE_REQUESTS_PER_MINUTE: u32 = 20;
const QUERY_PLACEHOLDER: &str = "{query}";

/// How a storefront's search endpoint wants its queries phrased
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteHints {
    /// Endpoint honours `"quoted phrase"` matching
    pub supports_exact_phrase: bool,
    /// Appended to the stripped title as a last-resort broadening query
    pub genre_suffix: Option<String>,
    /// Domain for `site:` operator queries on search-engine style endpoints
    pub site_filter: Option<String>,
}

/// How a query reaches the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    /// Type into the search box and submit it
    Form {
        input_selectors: Vec<String>,
        #[serde(default)]
        submit_selectors: Vec<String>,
        /// Page holding the search box, `base_url` when absent
        #[serde(default)]
        search_page_url: Option<String>,
    },
    /// Navigate straight to a results URL; `{query}` is replaced percent-encoded
    UrlTemplate { search_url_template: String },
}

/// Everything the orchestrator needs to search one storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub base_url: String,
    pub search: SearchMode,
    /// Result elements, tried in order until one yields anything
    pub result_selectors: Vec<String>,
    /// Attribute carrying the product link on a result element
    #[serde(default = "default_link_attribute")]
    pub link_attribute: String,
    /// Title elements on a product page, used when verifying matches
    #[serde(default)]
    pub detail_title_selectors: Vec<String>,
    /// Falls back to the process-wide threshold when absent
    #[serde(default)]
    pub accept_threshold: Option<f64>,
    #[serde(default)]
    pub verify_matches: bool,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default)]
    pub hints: SiteHints,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_link_attribute() -> String {
    "href".to_string()
}

fn default_max_candidates() -> usize {
    20
}

fn default_idle_timeout_ms() -> u64 {
    10_000
}

impl SiteConfig {
    pub fn builder(site_id: &str, base_url: &str) -> SiteConfigBuilder {
        SiteConfigBuilder::new(site_id, base_url)
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.site_id)
    }

    pub fn effective_threshold(&self, fallback: f64) -> f64 {
        self.accept_threshold.unwrap_or(fallback)
    }

    /// Validates the configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.site_id.trim().is_empty() {
            return Err(AppError::ValidationError("site_id must not be empty".to_string()));
        }

        Url::parse(&self.base_url).map_err(|e| {
            AppError::ValidationError(format!("{}: invalid base_url: {}", self.site_id, e))
        })?;

        match &self.search {
            SearchMode::Form { input_selectors, .. } if input_selectors.is_empty() => {
                return Err(AppError::ValidationError(format!(
                    "{}: form search needs at least one input selector",
                    self.site_id
                )));
            }
            SearchMode::UrlTemplate {
                search_url_template,
            } if !search_url_template.contains(QUERY_PLACEHOLDER) => {
                return Err(AppError::ValidationError(format!(
                    "{}: search_url_template must contain {}",
                    self.site_id, QUERY_PLACEHOLDER
                )));
            }
            _ => {}
        }

        if self.result_selectors.is_empty() {
            return Err(AppError::ValidationError(format!(
                "{}: at least one result selector is required",
                self.site_id
            )));
        }

        if let Some(threshold) = self.accept_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(AppError::ValidationError(format!(
                    "{}: accept_threshold must be between 0.0 and 1.0, got {}",
                    self.site_id, threshold
                )));
            }
        }

        if self.verify_matches && self.detail_title_selectors.is_empty() {
            return Err(AppError::ValidationError(format!(
                "{}: verify_matches needs detail_title_selectors",
                self.site_id
            )));
        }

        if self.max_candidates == 0 {
            return Err(AppError::ValidationError(format!(
                "{}: max_candidates must be > 0",
                self.site_id
            )));
        }

        self.retry
            .validate()
            .map_err(|e| AppError::ValidationError(format!("{}: {}", self.site_id, e)))
    }

    /// Results URL for URL-template sites
    pub fn search_url_for(&self, query: &str) -> Option<String> {
        match &self.search {
            SearchMode::UrlTemplate {
                search_url_template,
            } => Some(search_url_template.replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))),
            SearchMode::Form { .. } => None,
        }
    }
}

/// Builder for site configurations, mostly used by tests and embedders
pub struct SiteConfigBuilder {
    config: SiteConfig,
}

impl SiteConfigBuilder {
    pub fn new(site_id: &str, base_url: &str) -> Self {
        Self {
            config: SiteConfig {
                site_id: site_id.to_string(),
                display_name: None,
                base_url: base_url.to_string(),
                search: SearchMode::Form {
                    input_selectors: vec!["input[name='q']".to_string()],
                    submit_selectors: Vec::new(),
                    search_page_url: None,
                },
                result_selectors: Vec::new(),
                link_attribute: default_link_attribute(),
                detail_title_selectors: Vec::new(),
                accept_threshold: None,
                verify_matches: false,
                max_candidates: default_max_candidates(),
                idle_timeout_ms: default_idle_timeout_ms(),
                hints: SiteHints::default(),
                retry: RetryPolicy::default(),
            },
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.config.display_name = Some(name.to_string());
        self
    }

    pub fn form_search(mut self, input_selectors: &[&str], submit_selectors: &[&str]) -> Self {
        self.config.search = SearchMode::Form {
            input_selectors: to_strings(input_selectors),
            submit_selectors: to_strings(submit_selectors),
            search_page_url: None,
        };
        self
    }

    pub fn url_template(mut self, template: &str) -> Self {
        self.config.search = SearchMode::UrlTemplate {
            search_url_template: template.to_string(),
        };
        self
    }

    pub fn result_selectors(mut self, selectors: &[&str]) -> Self {
        self.config.result_selectors = to_strings(selectors);
        self
    }

    pub fn link_attribute(mut self, attribute: &str) -> Self {
        self.config.link_attribute = attribute.to_string();
        self
    }

    pub fn verify_with(mut self, detail_title_selectors: &[&str]) -> Self {
        self.config.verify_matches = true;
        self.config.detail_title_selectors = to_strings(detail_title_selectors);
        self
    }

    pub fn accept_threshold(mut self, threshold: f64) -> Self {
        self.config.accept_threshold = Some(threshold);
        self
    }

    pub fn max_candidates(mut self, max: usize) -> Self {
        self.config.max_candidates = max;
        self
    }

    pub fn hints(mut self, hints: SiteHints) -> Self {
        self.config.hints = hints;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build and validate
    pub fn build(self) -> AppResult<SiteConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Site id → configuration, as loaded by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteCatalog {
    sites: BTreeMap<String, SiteConfig>,
}

impl SiteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object keyed by site id, then validate every entry
    pub fn from_json(json: &str) -> AppResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        let mut catalog: SiteCatalog = serde_json::from_value(value)?;
        for (id, site) in catalog.sites.iter_mut() {
            if site.site_id.is_empty() {
                site.site_id = id.clone();
            }
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn insert(&mut self, site: SiteConfig) {
        self.sites.insert(site.site_id.clone(), site);
    }

    pub fn get(&self, site_id: &str) -> Option<&SiteConfig> {
        self.sites.get(site_id)
    }

    pub fn require(&self, site_id: &str) -> AppResult<&SiteConfig> {
        self.get(site_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown site: {}", site_id)))
    }

    pub fn sites(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn validate(&self) -> AppResult<()> {
        for (id, site) in &self.sites {
            if &site.site_id != id {
                return Err(AppError::ValidationError(format!(
                    "Catalog key '{}' does not match site_id '{}'",
                    id, site.site_id
                )));
            }
            site.validate()?;
        }
        Ok(())
    }
}

impl FromIterator<SiteConfig> for SiteCatalog {
    fn from_iter<I: IntoIterator<Item = SiteConfig>>(iter: I) -> Self {
        let mut catalog = SiteCatalog::new();
        for site in iter {
            catalog.insert(site);
        }
        catalog
    }
}

/// Process-wide search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Used for sites that do not set their own `accept_threshold`
    pub accept_threshold: f64,
    pub max_concurrent_sites: usize,
    /// Politeness quota shared by all concurrent searches against one site
    pub site_requests_per_minute: u32,
    pub site_burst: u32,
    /// Upper bound of the random wait added when the quota is exhausted
    pub politeness_jitter_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
            max_concurrent_sites: DEFAULT_MAX_CONCURRENT_SITES,
            site_requests_per_minute: DEFAULT_SITE_REQUESTS_PER_MINUTE,
            site_burst: 2,
            politeness_jitter_ms: 500,
        }
    }
}

impl SearchSettings {
    /// Defaults overridden by `TITLE_LOCATOR_*` variables; a `.env` file is honoured
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let settings = Self::from_lookup(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup("TITLE_LOCATOR_ACCEPT_THRESHOLD") {
            settings.accept_threshold = value.trim().parse()?;
        }
        if let Some(value) = lookup("TITLE_LOCATOR_MAX_CONCURRENT_SITES") {
            settings.max_concurrent_sites = value.trim().parse()?;
        }
        if let Some(value) = lookup("TITLE_LOCATOR_SITE_REQUESTS_PER_MINUTE") {
            settings.site_requests_per_minute = value.trim().parse()?;
        }
        if let Some(value) = lookup("TITLE_LOCATOR_SITE_BURST") {
            settings.site_burst = value.trim().parse()?;
        }
        if let Some(value) = lookup("TITLE_LOCATOR_POLITENESS_JITTER_MS") {
            settings.politeness_jitter_ms = value.trim().parse()?;
        }

        Ok(settings)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(AppError::ValidationError(format!(
                "accept_threshold must be between 0.0 and 1.0, got {}",
                self.accept_threshold
            )));
        }
        if self.max_concurrent_sites == 0 {
            return Err(AppError::ValidationError(
                "max_concurrent_sites must be > 0".to_string(),
            ));
        }
        if self.site_requests_per_minute == 0 || self.site_burst == 0 {
            return Err(AppError::ValidationError(
                "site_requests_per_minute and site_burst must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
