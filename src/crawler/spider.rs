//! Recursive traversal engine
//!
//! A run starts from a seed URL and proceeds as a tree of tasks:
//!
//! 1. Claim the URL in the visited set; stop if another branch already did
//! 2. Fetch it through the transport with the run's cancellation token
//! 3. Decode the body into a [`Page`] and hand it to the page handler
//! 4. Discover outbound links and spawn one task per link
//! 5. Join every child before the branch is considered finished
//!
//! Fan-out is unbounded; the only limit on in-flight requests is the transport's own
//! connection limit.

use crate::config::SpiderConfig;
use crate::crawler::encoding::decode;
use crate::crawler::fetcher::{FetchResponse, ReqwestTransport, Transport};
use crate::crawler::page::Page;
use crate::crawler::parser::find_outbound_links;
use crate::state::{History, Progress};
use crate::SpiderError;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Called once per successfully fetched page
pub type PageHandler = Arc<dyn Fn(Page) + Send + Sync>;

/// Called once per failed fetch attempt or failed link discovery
pub type ErrorHandler = Arc<dyn Fn(&Url, &SpiderError) + Send + Sync>;

/// Produces the follow-up links of a page
pub type LinkFinder = Arc<dyn Fn(&Page) -> Result<Vec<Url>, SpiderError> + Send + Sync>;

/// Callbacks and link-discovery strategy used by a [`Spider`]
///
/// Defaults: pages and errors are ignored and links come from
/// [`find_outbound_links`].
///
/// # Example
///
/// ```
/// use spider_engine::Traversal;
///
/// let traversal = Traversal::new()
///     .on_page(|page| println!("{}\t{}", page.url(), page.title()))
///     .on_error(|url, error| eprintln!("{}: {}", url, error));
/// ```
#[derive(Clone)]
pub struct Traversal {
    on_page: PageHandler,
    find_links: LinkFinder,
    on_error: ErrorHandler,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            on_page: Arc::new(|_: Page| {}),
            find_links: Arc::new(find_outbound_links),
            on_error: Arc::new(|_: &Url, _: &SpiderError| {}),
        }
    }
}

impl Traversal {
    /// Creates a traversal with the default strategy and no-op handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion handler
    pub fn on_page<F>(mut self, handler: F) -> Self
    where
        F: Fn(Page) + Send + Sync + 'static,
    {
        self.on_page = Arc::new(handler);
        self
    }

    /// Replaces the link-discovery strategy
    pub fn find_links<F>(mut self, finder: F) -> Self
    where
        F: Fn(&Page) -> Result<Vec<Url>, SpiderError> + Send + Sync + 'static,
    {
        self.find_links = Arc::new(finder);
        self
    }

    /// Sets the error handler
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Url, &SpiderError) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }
}

impl fmt::Debug for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal").finish_non_exhaustive()
    }
}

/// State shared by every branch of a run
struct Shared {
    transport: Arc<dyn Transport>,
    traversal: Traversal,
    history: History,
    progress: Progress,
    running: AtomicBool,
}

/// Recursive, concurrent site crawler
///
/// One spider supports one run at a time. Cloning is cheap and yields a handle to the
/// same spider.
#[derive(Clone)]
pub struct Spider {
    shared: Arc<Shared>,
}

impl Spider {
    /// Creates a spider backed by a [`ReqwestTransport`] built from `config`
    ///
    /// # Errors
    ///
    /// Returns `SpiderError::Client` if the HTTP client cannot be built.
    pub fn new(config: &SpiderConfig, traversal: Traversal) -> Result<Self, SpiderError> {
        let transport = ReqwestTransport::new(config)?;
        tracing::debug!(
            "Transport configured: timeout {:?}, connection limit {}, {} default headers",
            config.timeout,
            config.connection_limit,
            config.default_headers.len()
        );
        Ok(Self::with_transport(Arc::new(transport), traversal))
    }

    /// Creates a spider using a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>, traversal: Traversal) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                traversal,
                history: History::new(),
                progress: Progress::new(),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Live progress of the current or last run
    pub fn progress(&self) -> &Progress {
        &self.shared.progress
    }

    /// URLs claimed in the current or last run
    pub fn history(&self) -> &History {
        &self.shared.history
    }

    /// Returns true while a run, or any branch spawned by it, is still active
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Crawls everything reachable from `seed`
    ///
    /// Completes once every reachable URL has been attempted, or once `cancel` fires and
    /// all in-flight branches have unwound. A cancelled run still returns `Ok(())`;
    /// cancelled fetches are reported through the error handler.
    ///
    /// # Errors
    ///
    /// Returns `SpiderError::AlreadyRunning` without touching any state if a run is
    /// already active on this spider.
    pub async fn run(&self, seed: Url, cancel: CancellationToken) -> Result<(), SpiderError> {
        let guard = RunGuard::acquire(&self.shared)?;

        self.shared.history.reset();
        self.shared.progress.reset();

        // Dropping this future cancels branches still running in the background
        let run_token = cancel.child_token();
        let _cancel_on_drop = run_token.clone().drop_guard();

        tracing::info!("Starting crawl from {}", seed);
        let start_time = Instant::now();

        let branch = Branch {
            shared: self.shared.clone(),
            cancel: run_token,
            _run: Arc::new(guard),
        };
        if let Err(e) = tokio::spawn(branch.crawl(seed)).await {
            tracing::error!("Crawl task failed: {}", e);
        }

        if cancel.is_cancelled() {
            tracing::info!(
                "Crawl cancelled after {:?} ({})",
                start_time.elapsed(),
                self.shared.progress
            );
        } else {
            tracing::info!(
                "Crawl completed in {:?} ({})",
                start_time.elapsed(),
                self.shared.progress
            );
        }

        Ok(())
    }

    /// Crawls everything reachable from `seed` without external cancellation
    pub async fn run_to_end(&self, seed: Url) -> Result<(), SpiderError> {
        self.run(seed, CancellationToken::new()).await
    }
}

impl fmt::Debug for Spider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spider")
            .field("running", &self.is_running())
            .field("progress", &self.shared.progress)
            .field("history", &self.shared.history.len())
            .finish()
    }
}

/// Holds the spider's running flag until the last branch of the run has finished
struct RunGuard {
    shared: Arc<Shared>,
}

impl RunGuard {
    fn acquire(shared: &Arc<Shared>) -> Result<Self, SpiderError> {
        shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SpiderError::AlreadyRunning)?;
        Ok(Self {
            shared: shared.clone(),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
    }
}

/// Pairs one `raise_created` with exactly one `raise_completed`
struct InFlight<'a> {
    progress: &'a Progress,
}

impl<'a> InFlight<'a> {
    fn start(progress: &'a Progress) -> Self {
        progress.raise_created();
        Self { progress }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.progress.raise_completed();
    }
}

/// Per-task view of a run
#[derive(Clone)]
struct Branch {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    _run: Arc<RunGuard>,
}

impl Branch {
    /// Crawls `url` and, recursively, every unseen link below it
    fn crawl(self, url: Url) -> BoxFuture<'static, ()> {
        async move {
            if self.cancel.is_cancelled() {
                tracing::trace!("Skipping {}: run cancelled", url);
                return;
            }

            if !self.shared.history.claim(url.as_str()) {
                tracing::trace!("Skipping {}: already claimed", url);
                return;
            }

            let Some(links) = self.visit(&url).await else {
                return;
            };

            let children: Vec<_> = links
                .into_iter()
                .filter(|link| !self.shared.history.contains(link.as_str()))
                .map(|link| tokio::spawn(self.clone().crawl(link)))
                .collect();

            for result in join_all(children).await {
                if let Err(e) = result {
                    tracing::error!("Branch below {} failed: {}", url, e);
                }
            }
        }
        .boxed()
    }

    /// Fetches and processes a claimed URL, returning the links to follow
    async fn visit(&self, url: &Url) -> Option<Vec<Url>> {
        let in_flight = InFlight::start(&self.shared.progress);
        tracing::debug!("Fetching {}", url);

        let response = match self.fetch(url).await {
            Ok(response) => response,
            Err(error) => {
                drop(in_flight);
                self.report_error(url, &error);
                return None;
            }
        };

        let html = decode(&response.body, response.content_type());
        let page = Page::new(url.clone(), html);
        drop(in_flight);

        let links = self.discover_links(&page);
        (self.shared.traversal.on_page)(page);
        Some(links)
    }

    async fn fetch(&self, url: &Url) -> Result<FetchResponse, SpiderError> {
        let response = self.shared.transport.fetch(url, &self.cancel).await?;
        if !response.is_success() {
            return Err(SpiderError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        tracing::debug!(
            "Fetched {} ({}, {} bytes)",
            url,
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    fn discover_links(&self, page: &Page) -> Vec<Url> {
        match (self.shared.traversal.find_links)(page) {
            Ok(links) => {
                tracing::debug!("Found {} links on {}", links.len(), page.url());
                links
            }
            Err(error) => {
                self.report_error(page.url(), &error);
                Vec::new()
            }
        }
    }

    fn report_error(&self, url: &Url, error: &SpiderError) {
        if error.is_cancelled() {
            tracing::debug!("Fetch of {} cancelled", url);
        } else {
            tracing::warn!("Failed to crawl {}: {}", url, error);
        }
        (self.shared.traversal.on_error)(url, error);
    }
}
