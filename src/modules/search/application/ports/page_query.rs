//! Page collaborator port
//!
//! The browser automation layer implements these traits; the search core only
//! ever talks to a page through them.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::modules::search::domain::config::SiteConfig;

/// Opaque reference to an element on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Result of an interaction that targets a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Done,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Idle,
    TimedOut,
}

/// Failures a page collaborator may report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    /// Slow page or network hiccup; worth another try
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Blocked, captcha, maintenance page
    #[error("Site unavailable: {0}")]
    SiteUnavailable(String),

    /// Browser session or driver failure
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl PageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PageError::Timeout(_))
    }
}

/// One browser page, used by exactly one search at a time
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageQuery: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    async fn type_into(&self, selector: &str, text: &str) -> Result<Interaction, PageError>;

    async fn submit(&self, selector: &str) -> Result<Interaction, PageError>;

    /// Every element matching `selector`; empty when nothing matches
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;

    async fn text_of(&self, element: &ElementHandle) -> Result<String, PageError>;

    async fn attribute_of(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError>;

    async fn wait_for_idle(&self, timeout: Duration) -> Result<IdleState, PageError>;
}

/// Opens a fresh page for one site search
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open_page(&self, site: &SiteConfig) -> Result<Box<dyn PageQuery>, PageError>;
}
