/// Scripted in-memory storefront page for integration tests
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use title_locator::modules::search::application::ports::{
    ElementHandle, IdleState, Interaction, PageError, PageFactory, PageQuery,
};
use title_locator::SiteConfig;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const DETAIL_TITLE_SELECTOR: &str = "h1.product-title";

#[derive(Debug, Clone)]
pub struct Listing {
    pub title: String,
    pub href: Option<String>,
}

impl Listing {
    pub fn new(title: &str, href: &str) -> Self {
        Self {
            title: title.to_string(),
            href: Some(href.to_string()),
        }
    }
}

#[derive(Default)]
struct FakeState {
    current_url: Option<String>,
    current_query: Option<String>,
    elements: HashMap<String, Listing>,
    navigate_failures: VecDeque<PageError>,
    navigations: usize,
    calls: Vec<String>,
}

/// Answers like a storefront whose results depend on the last query
#[derive(Default)]
pub struct FakePage {
    search_inputs: HashSet<String>,
    submit_buttons: HashSet<String>,
    listings: HashMap<String, Vec<Listing>>,
    query_listings: HashMap<String, HashMap<String, Vec<Listing>>>,
    detail_titles: HashMap<String, String>,
    timeout_selectors: HashSet<String>,
    idle: Option<IdleState>,
    latency: Option<Duration>,
    cancel_on_navigation: Option<(usize, CancellationToken)>,
    open_pages: Option<Arc<AtomicUsize>>,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_input(mut self, selector: &str) -> Self {
        self.search_inputs.insert(selector.to_string());
        self
    }

    pub fn with_submit_button(mut self, selector: &str) -> Self {
        self.submit_buttons.insert(selector.to_string());
        self
    }

    /// Results for `selector` whatever the query
    pub fn with_listing(mut self, selector: &str, listings: Vec<Listing>) -> Self {
        self.listings.insert(selector.to_string(), listings);
        self
    }

    /// Results for `selector` only after searching exactly `query`; once any
    /// query is scripted, unscripted queries find nothing
    pub fn with_listing_for_query(mut self, query: &str, selector: &str, listings: Vec<Listing>) -> Self {
        self.query_listings
            .entry(query.to_string())
            .or_default()
            .insert(selector.to_string(), listings);
        self
    }

    pub fn with_detail_page(mut self, url: &str, title: &str) -> Self {
        self.detail_titles.insert(url.to_string(), title.to_string());
        self
    }

    pub fn with_timeout_selector(mut self, selector: &str) -> Self {
        self.timeout_selectors.insert(selector.to_string());
        self
    }

    pub fn with_idle_state(mut self, idle: IdleState) -> Self {
        self.idle = Some(idle);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The next `count` navigations fail with `error`
    pub fn failing_navigations(self, count: usize, error: PageError) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.navigate_failures.extend(std::iter::repeat(error).take(count));
        }
        self
    }

    /// Cancel `token` while serving navigation number `count`
    pub fn cancelling_on_navigation(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_on_navigation = Some((count, token));
        self
    }

    fn tracked_by(mut self, open_pages: Arc<AtomicUsize>) -> Self {
        self.open_pages = Some(open_pages);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("navigate ").map(str::to_string))
            .collect()
    }

    pub fn queried_selectors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("query_all ").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn listing_for(&self, selector: &str) -> Vec<Listing> {
        let state = self.state.lock().unwrap();
        let scripted = state
            .current_query
            .as_ref()
            .and_then(|query| self.query_listings.get(query));

        match scripted {
            Some(by_selector) => by_selector.get(selector).cloned().unwrap_or_default(),
            None if self.query_listings.is_empty() => {
                self.listings.get(selector).cloned().unwrap_or_default()
            }
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl PageQuery for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.record(format!("navigate {}", url));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        if let Some((count, token)) = &self.cancel_on_navigation {
            if state.navigations == *count {
                token.cancel();
            }
        }
        if let Some(error) = state.navigate_failures.pop_front() {
            return Err(error);
        }

        state.current_url = Some(url.to_string());
        if let Ok(parsed) = Url::parse(url) {
            if let Some((_, query)) = parsed.query_pairs().find(|(name, _)| name == "q") {
                state.current_query = Some(query.into_owned());
            }
        }
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<Interaction, PageError> {
        self.record(format!("type_into {} {}", selector, text));
        if !self.search_inputs.contains(selector) {
            return Ok(Interaction::NotFound);
        }
        self.state.lock().unwrap().current_query = Some(text.to_string());
        Ok(Interaction::Done)
    }

    async fn submit(&self, selector: &str) -> Result<Interaction, PageError> {
        self.record(format!("submit {}", selector));
        if self.submit_buttons.contains(selector) || self.search_inputs.contains(selector) {
            Ok(Interaction::Done)
        } else {
            Ok(Interaction::NotFound)
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.record(format!("query_all {}", selector));
        if self.timeout_selectors.contains(selector) {
            return Err(PageError::Timeout(format!("{} never appeared", selector)));
        }

        let detail_title = {
            let state = self.state.lock().unwrap();
            state
                .current_url
                .as_ref()
                .and_then(|url| self.detail_titles.get(url))
                .cloned()
        };
        if let Some(title) = detail_title {
            if selector != DETAIL_TITLE_SELECTOR {
                return Ok(Vec::new());
            }
            let handle = ElementHandle::new("detail");
            self.state.lock().unwrap().elements.insert(
                handle.id().to_string(),
                Listing {
                    title,
                    href: None,
                },
            );
            return Ok(vec![handle]);
        }

        let listings = self.listing_for(selector);
        let mut state = self.state.lock().unwrap();
        let handles = listings
            .into_iter()
            .enumerate()
            .map(|(index, listing)| {
                let handle = ElementHandle::new(format!("{}#{}", selector, index));
                state.elements.insert(handle.id().to_string(), listing);
                handle
            })
            .collect();
        Ok(handles)
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<String, PageError> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(element.id())
            .map(|listing| listing.title.clone())
            .ok_or_else(|| PageError::Transport(format!("stale element {}", element.id())))
    }

    async fn attribute_of(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, PageError> {
        let state = self.state.lock().unwrap();
        let listing = state
            .elements
            .get(element.id())
            .ok_or_else(|| PageError::Transport(format!("stale element {}", element.id())))?;
        Ok(if name == "href" { listing.href.clone() } else { None })
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<IdleState, PageError> {
        Ok(self.idle.unwrap_or(IdleState::Idle))
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        if let Some(open_pages) = &self.open_pages {
            open_pages.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

type PageBuilder = Box<dyn Fn() -> FakePage + Send + Sync>;

/// Builds a fresh `FakePage` per site and tracks how many are open at once
#[derive(Default)]
pub struct FakePageFactory {
    builders: HashMap<String, PageBuilder>,
    unavailable: HashSet<String>,
    open_pages: Arc<AtomicUsize>,
    peak_open_pages: AtomicUsize,
    opened: AtomicUsize,
}

impl FakePageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site<F>(mut self, site_id: &str, builder: F) -> Self
    where
        F: Fn() -> FakePage + Send + Sync + 'static,
    {
        self.builders.insert(site_id.to_string(), Box::new(builder));
        self
    }

    pub fn with_unavailable_site(mut self, site_id: &str) -> Self {
        self.unavailable.insert(site_id.to_string());
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn peak_open_pages(&self) -> usize {
        self.peak_open_pages.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFactory for FakePageFactory {
    async fn open_page(&self, site: &SiteConfig) -> Result<Box<dyn PageQuery>, PageError> {
        if self.unavailable.contains(&site.site_id) {
            return Err(PageError::SiteUnavailable(format!("{} refused the browser", site.site_id)));
        }

        let page = self
            .builders
            .get(&site.site_id)
            .map(|build| build())
            .unwrap_or_default()
            .tracked_by(self.open_pages.clone());

        self.opened.fetch_add(1, Ordering::SeqCst);
        let open = self.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open_pages.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(page))
    }
}
