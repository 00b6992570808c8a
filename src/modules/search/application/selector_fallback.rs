use std::time::Duration;

use super::ports::{ElementHandle, PageError, PageQuery};
use crate::modules::search::infrastructure::retry_util::RetryUtil;

/// Elements found by the first selector that matched anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMatch {
    pub selector: String,
    pub elements: Vec<ElementHandle>,
}

/// Tries an ordered selector list until one yields elements.
///
/// A selector that matches nothing or times out is skipped; only fatal
/// collaborator failures stop the scan.
pub struct SelectorFallbackMatcher {
    call_timeout: Duration,
}

impl SelectorFallbackMatcher {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    pub async fn find_first_match(
        &self,
        page: &dyn PageQuery,
        selectors: &[String],
    ) -> Result<Option<SelectorMatch>, PageError> {
        for selector in selectors {
            let found = RetryUtil::bounded(
                self.call_timeout,
                page.query_all(selector),
                "query_all",
            )
            .await;

            match found {
                Ok(elements) if !elements.is_empty() => {
                    log::debug!(
                        "SELECTOR: '{}' matched {} elements",
                        selector,
                        elements.len()
                    );
                    return Ok(Some(SelectorMatch {
                        selector: selector.clone(),
                        elements,
                    }));
                }
                Ok(_) => log::trace!("SELECTOR: '{}' matched nothing", selector),
                Err(error) if error.is_transient() => {
                    log::debug!("SELECTOR: '{}' timed out, trying next ({})", selector, error)
                }
                Err(error) => return Err(error),
            }
        }

        Ok(None)
    }
}

pub async fn find_first_match(
    page: &dyn PageQuery,
    selectors: &[String],
    call_timeout: Duration,
) -> Result<Option<SelectorMatch>, PageError> {
    SelectorFallbackMatcher::new(call_timeout)
        .find_first_match(page, selectors)
        .await
}
