//! The per-lookup icon finder.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::cancel::CancellationToken;
use crate::config::FinderConfig;
use crate::discovery::find_candidates;
use crate::fetch::{fetch_all, FetchOptions};
use crate::hooks::{apply_host_only, OverrideFinder};
use crate::http_client::{HttpClient, HttpResponse, Transport};
use crate::selection::select_icon;
use crate::size_range::SizeRange;
use crate::types::{BesticonError, BesticonResult, Icon};
use crate::url_util::normalize_url;

/// Finds, fetches and ranks the icons of one site.
///
/// Build one per lookup: configure it, call [`IconFinder::fetch_icons`]
/// once, then optionally ask for the best match with
/// [`IconFinder::icon_in_size_range`]. The transport can be shared between
/// finders.
pub struct IconFinder {
    transport: Arc<dyn Transport>,
    host_only_domains: Vec<String>,
    override_finder: Option<Arc<dyn OverrideFinder>>,
    options: FetchOptions,
    cancel: Option<CancellationToken>,
    icons: Vec<Icon>,
}

impl fmt::Debug for IconFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconFinder")
            .field("host_only_domains", &self.host_only_domains)
            .field("has_override", &self.override_finder.is_some())
            .field("options", &self.options)
            .field("icons", &self.icons.len())
            .finish()
    }
}

impl IconFinder {
    /// A finder with default fetch options and no hooks.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            host_only_domains: Vec::new(),
            override_finder: None,
            options: FetchOptions::default(),
            cancel: None,
            icons: Vec::new(),
        }
    }

    /// A finder with its own [`HttpClient`] built from `config`.
    pub fn from_config(config: &FinderConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpClient::new(config)?);
        Ok(Self::new(transport)
            .with_options(FetchOptions::from(config))
            .with_host_only_domains(config.host_only_domains.clone()))
    }

    pub fn with_host_only_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_only_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_override(mut self, finder: impl OverrideFinder + 'static) -> Self {
        self.override_finder = Some(Arc::new(finder));
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Icons found by the last call to [`IconFinder::fetch_icons`].
    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    /// Discover, fetch and decode the icons of the page at `url`.
    ///
    /// Fails with [`BesticonError::NotFound`] when the page cannot be
    /// retrieved and [`BesticonError::EmptyResponse`] when its body is
    /// empty. Individual icon failures never fail the call.
    pub async fn fetch_icons(&mut self, url: &str) -> BesticonResult<Vec<Icon>> {
        self.icons.clear();

        let candidates = match self.override_candidates(url) {
            Some(urls) => {
                tracing::info!(url, count = urls.len(), "using icon override");
                urls
            }
            None => self.discover(url).await?,
        };

        tracing::debug!(url, candidates = candidates.len(), "fetching icon candidates");
        let icons = fetch_all(
            self.transport.as_ref(),
            &candidates,
            &self.options,
            self.cancel.as_ref(),
        )
        .await;

        tracing::info!(url, icons = icons.len(), "icon lookup finished");
        self.icons = icons.clone();
        Ok(icons)
    }

    /// The best icon for `range` among the fetched icons.
    pub fn icon_in_size_range(&self, range: SizeRange) -> Option<&Icon> {
        select_icon(&self.icons, &range)
    }

    fn override_candidates(&self, url: &str) -> Option<Vec<String>> {
        let urls = self.override_finder.as_ref()?.find_icons(url);
        (!urls.is_empty()).then_some(urls)
    }

    async fn discover(&self, url: &str) -> BesticonResult<Vec<String>> {
        let start = apply_host_only(&normalize_url(url)?, &self.host_only_domains);
        let page = self.fetch_page(&start).await?;

        let page_url = Url::parse(&page.final_url).unwrap_or(start);
        let html = String::from_utf8_lossy(&page.body);
        Ok(find_candidates(&html, &page_url))
    }

    async fn fetch_page(&self, url: &Url) -> BesticonResult<HttpResponse> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(BesticonError::Cancelled);
        }

        let request = self.transport.get(url.as_str());
        let result = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(BesticonError::Cancelled),
                result = request => result,
            },
            None => request.await,
        };

        let page = match result {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                tracing::warn!(url = %url, status = page.status, "page fetch returned non-success status");
                return Err(BesticonError::NotFound);
            }
            Err(e) => {
                tracing::warn!(url = %url, "page fetch failed: {e}");
                return Err(BesticonError::NotFound);
            }
        };

        if page.body.is_empty() {
            tracing::warn!(url = %url, "page body is empty");
            return Err(BesticonError::EmptyResponse);
        }
        if !page.is_html() {
            tracing::debug!(
                url = %url,
                content_type = page.content_type.as_deref().unwrap_or_default(),
                "page is not HTML, only the root favicon will be found"
            );
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requested URLs and answers every request with `status`.
    struct RecordingTransport {
        status: u16,
        body: Vec<u8>,
        final_url: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.as_bytes().to_vec(),
                final_url: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(HttpResponse {
                final_url: self.final_url.clone().unwrap_or_else(|| url.to_string()),
                status: self.status,
                content_type: Some("text/html".to_string()),
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_not_found_page() {
        let transport = Arc::new(RecordingTransport::new(404, "gone"));
        let mut finder = IconFinder::new(transport);
        let err = finder
            .fetch_icons("http://wikipedia.org/does-not-exist")
            .await
            .unwrap_err();
        assert!(matches!(err, BesticonError::NotFound));
        assert!(finder.icons().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_reports_empty_response() {
        let transport = Arc::new(RecordingTransport::new(200, ""));
        let mut finder = IconFinder::new(transport.clone());
        let err = finder.fetch_icons("http://foobar.com").await.unwrap_err();
        assert!(matches!(err, BesticonError::EmptyResponse));
        // No root favicon fallback for empty pages.
        assert_eq!(transport.requests(), vec!["http://foobar.com/"]);
    }

    #[tokio::test]
    async fn test_scheme_is_added_and_host_only_applied() {
        let transport = Arc::new(RecordingTransport::new(200, "<html></html>"));
        let mut finder = IconFinder::new(transport.clone()).with_host_only_domains(["youtube.com"]);
        let icons = finder.fetch_icons("youtube.com/does-not-exist").await.unwrap();
        // The favicon request got HTML back: kept, but marked undecodable.
        assert_eq!(icons.len(), 1);
        assert!(icons[0].error.is_some());
        assert_eq!(
            transport.requests(),
            vec!["http://youtube.com/", "http://youtube.com/favicon.ico"]
        );
    }

    #[tokio::test]
    async fn test_relative_links_resolve_against_final_url() {
        let mut transport = RecordingTransport::new(200, r#"<link rel="icon" href="img/icon.png">"#);
        transport.final_url = Some("https://www.example.com/home/".to_string());
        let transport = Arc::new(transport);
        let mut finder = IconFinder::new(transport.clone());
        finder.fetch_icons("http://example.com").await.unwrap();
        let mut requests = transport.requests();
        requests.sort();
        assert_eq!(
            requests,
            vec![
                "http://example.com/",
                "https://www.example.com/favicon.ico",
                "https://www.example.com/home/img/icon.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_override_bypasses_discovery() {
        let transport = Arc::new(RecordingTransport::new(404, ""));
        let mut finder = IconFinder::new(transport.clone()).with_override(|url: &str| {
            if url.contains("dpa.com") {
                vec!["https://static.feedercdn.com/logo/dpa.png".to_string()]
            } else {
                Vec::new()
            }
        });
        let icons = finder.fetch_icons("https://dpa.com").await.unwrap();
        assert!(icons.is_empty());
        assert_eq!(
            transport.requests(),
            vec!["https://static.feedercdn.com/logo/dpa.png"]
        );
    }

    #[tokio::test]
    async fn test_empty_override_falls_through() {
        let transport = Arc::new(RecordingTransport::new(404, ""));
        let mut finder = IconFinder::new(transport.clone()).with_override(|_: &str| Vec::new());
        let err = finder.fetch_icons("https://example.com").await.unwrap_err();
        assert!(matches!(err, BesticonError::NotFound));
        assert_eq!(transport.requests(), vec!["https://example.com/"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_page_fetch() {
        let transport = Arc::new(RecordingTransport::new(200, "<html></html>"));
        let token = CancellationToken::new();
        token.cancel();
        let mut finder = IconFinder::new(transport.clone()).with_cancellation(token);
        // The transport answers instantly, so cancellation must win every time.
        for _ in 0..200 {
            let err = finder.fetch_icons("http://example.com").await.unwrap_err();
            assert!(matches!(err, BesticonError::Cancelled));
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_while_page_in_flight() {
        struct PendingTransport;

        #[async_trait]
        impl Transport for PendingTransport {
            async fn get(&self, _url: &str) -> anyhow::Result<HttpResponse> {
                std::future::pending().await
            }
        }

        let token = CancellationToken::new();
        let mut finder = IconFinder::new(Arc::new(PendingTransport)).with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = finder.fetch_icons("http://example.com").await.unwrap_err();
        canceller.await.unwrap();
        assert!(matches!(err, BesticonError::Cancelled));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let transport = Arc::new(RecordingTransport::new(200, "<html></html>"));
        let mut finder = IconFinder::new(transport.clone());
        let err = finder.fetch_icons("   ").await.unwrap_err();
        assert!(matches!(err, BesticonError::InvalidUrl(_)));
        assert!(transport.requests().is_empty());
    }
}
