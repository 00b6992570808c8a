/// Site configuration factories with sensible test defaults
use title_locator::modules::search::domain::{RetryPolicy, SiteConfig, SiteHints};

use super::fake_page::DETAIL_TITLE_SELECTOR;

pub const RESULT_SELECTOR: &str = ".result a";

pub struct SiteFactory {
    site_id: String,
    result_selectors: Vec<String>,
    form_inputs: Option<Vec<String>>,
    verify: bool,
    threshold: Option<f64>,
    hints: SiteHints,
    retry: RetryPolicy,
}

impl SiteFactory {
    pub fn new(site_id: &str) -> Self {
        Self {
            site_id: site_id.to_string(),
            result_selectors: vec![RESULT_SELECTOR.to_string()],
            form_inputs: None,
            verify: false,
            threshold: None,
            hints: SiteHints::default(),
            retry: RetryPolicy::immediate(),
        }
    }

    pub fn result_selectors(mut self, selectors: &[&str]) -> Self {
        self.result_selectors = selectors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn form(mut self, inputs: &[&str]) -> Self {
        self.form_inputs = Some(inputs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn verified(mut self) -> Self {
        self.verify = true;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn hints(mut self, hints: SiteHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.example.com", self.site_id)
    }

    pub fn build(self) -> SiteConfig {
        let base_url = self.base_url();
        let selectors: Vec<&str> = self.result_selectors.iter().map(String::as_str).collect();
        let mut builder = SiteConfig::builder(&self.site_id, &base_url)
            .result_selectors(&selectors)
            .hints(self.hints)
            .retry(self.retry);

        builder = match &self.form_inputs {
            Some(inputs) => {
                let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
                builder.form_search(&inputs, &["button[type='submit']"])
            }
            None => builder.url_template(&format!("{}/search?q={{query}}", base_url)),
        };
        if self.verify {
            builder = builder.verify_with(&[DETAIL_TITLE_SELECTOR]);
        }
        if let Some(threshold) = self.threshold {
            builder = builder.accept_threshold(threshold);
        }

        builder.build().expect("test site config is valid")
    }
}

/// Base URL the factory gives `site_id`
pub fn base_url(site_id: &str) -> String {
    format!("https://{}.example.com", site_id)
}
