// ABOUTME: The Client that orchestrates one fetch followed by field and table extraction.
// ABOUTME: Fetch and parse failures become per-descriptor sentinels; spawn() runs a page load off the caller's task.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::descriptor::DescriptorSet;
use crate::document::{decode_body, Document};
use crate::error::ScrapeError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::field::extract_field;
use crate::options::{ClientBuilder, Options};
use crate::result::{Failure, FieldEntry, Outcome, PageExtraction, TableEntry};
use crate::selectors::precompile_selectors;
use crate::table::extract_table;

/// Entry point for loading pages and extracting descriptors from them.
///
/// Cloning is cheap; clones share the same fetcher.
#[derive(Clone)]
pub struct Client {
    fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed (e.g. no TLS backend).
    pub fn new(opts: Options) -> Self {
        Self::try_new(opts).expect("failed to build HTTP client")
    }

    /// Create a new Client, returning an error if the HTTP client cannot be built.
    pub fn try_new(opts: Options) -> Result<Self, ScrapeError> {
        if let Some(fetcher) = opts.fetcher {
            return Ok(Self { fetcher });
        }

        let http_client = match opts.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    ScrapeError::fetch("", "Build", Some(anyhow::anyhow!("http client: {}", e)))
                })?,
        };

        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new(http_client, opts.headers)),
        })
    }

    /// Create a Client around an existing fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `url` once and apply every descriptor in `set` to it.
    ///
    /// Never fails as a whole: fetch and parse errors are reported as a
    /// [`Failure`] in every entry.
    pub async fn extract_page(&self, url: &str, set: &DescriptorSet) -> PageExtraction {
        let start = Instant::now();
        precompile_selectors(set.selectors());

        let page = match self.fetcher.fetch(url).await {
            Ok(markup) => extract_markup(&markup, url, set),
            Err(err) => {
                warn!(url, error = %err, "page fetch failed");
                failed_page(url, set, &err)
            }
        };

        info!(
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            failed = page.is_failed(),
            "page load finished"
        );
        page
    }

    /// Apply every descriptor in `set` to markup that was obtained elsewhere.
    pub fn extract_html(&self, markup: &str, url: &str, set: &DescriptorSet) -> PageExtraction {
        extract_markup(markup, url, set)
    }

    /// Like [`Client::extract_html`] for undecoded bytes, e.g. a saved page.
    ///
    /// The charset comes from `content_type` when given, else it is detected.
    pub fn extract_bytes(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        url: &str,
        set: &DescriptorSet,
    ) -> PageExtraction {
        extract_markup(&decode_body(body, content_type), url, set)
    }

    /// Run [`Client::extract_page`] on a background task.
    ///
    /// Dropping the returned handle discards the result once it arrives.
    pub fn spawn(&self, url: impl Into<String>, set: DescriptorSet) -> PageLoad {
        let client = self.clone();
        let url = url.into();
        let handle = tokio::spawn(async move { client.extract_page(&url, &set).await });
        PageLoad { handle }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

/// A page load running in the background.
#[derive(Debug)]
pub struct PageLoad {
    handle: JoinHandle<PageExtraction>,
}

impl PageLoad {
    /// Wait for the extraction. Returns `None` if the load was aborted.
    ///
    /// A panic inside the load is resumed on the caller.
    pub async fn wait(self) -> Option<PageExtraction> {
        match self.handle.await {
            Ok(page) => Some(page),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => None,
        }
    }

    /// Stop the load; a later `wait` returns `None` unless it already finished.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

fn extract_markup(markup: &str, url: &str, set: &DescriptorSet) -> PageExtraction {
    let doc = match Document::parse(markup) {
        Ok(doc) => doc,
        Err(mut err) => {
            err.url = url.to_string();
            warn!(url, error = %err, "page parse failed");
            return failed_page(url, set, &err);
        }
    };

    PageExtraction {
        url: url.to_string(),
        failure: None,
        fields: set
            .fields
            .iter()
            .map(|fd| FieldEntry {
                name: fd.name.clone(),
                outcome: Outcome::Extracted(extract_field(&doc, fd)),
            })
            .collect(),
        tables: set
            .tables
            .iter()
            .map(|td| TableEntry {
                name: td.name.clone(),
                outcome: Outcome::Extracted(extract_table(&doc, td)),
            })
            .collect(),
    }
}

fn failed_page(url: &str, set: &DescriptorSet, err: &ScrapeError) -> PageExtraction {
    let failure = Failure::from(err);
    PageExtraction {
        url: url.to_string(),
        failure: Some(failure.clone()),
        fields: set
            .fields
            .iter()
            .map(|fd| FieldEntry {
                name: fd.name.clone(),
                outcome: Outcome::Failed(failure.clone()),
            })
            .collect(),
        tables: set
            .tables
            .iter()
            .map(|td| TableEntry {
                name: td.name.clone(),
                outcome: Outcome::Failed(failure.clone()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, TableDescriptor};
    use crate::fetch::StaticFetcher;
    use crate::result::{FailureKind, ScalarResult};
    use pretty_assertions::assert_eq;

    const URL: &str = "https://investidor10.com.br/acoes/mult3/";

    const PAGE: &str = r#"
        <div class="_card cotacao"><div class="_card-body"><span class="value">R$ 5,42</span></div></div>
        <table id="table-dividends-history">
            <tbody>
                <tr><td>Dividendo</td><td>01/01</td><td>15/01</td><td>0,50</td></tr>
            </tbody>
        </table>
    "#;

    fn set() -> DescriptorSet {
        DescriptorSet::new()
            .field(FieldDescriptor::new(
                "quote",
                "div._card.cotacao div._card-body span.value",
            ))
            .field(FieldDescriptor::new("pl", "div._card.pl span.value"))
            .table(TableDescriptor::new(
                "dividends",
                "#table-dividends-history",
                "tbody tr",
                ["Tipo", "Data Com", "Pagamento", "Valor"],
            ))
    }

    fn client(fetcher: StaticFetcher) -> Client {
        Client::with_fetcher(Arc::new(fetcher))
    }

    struct PanickingFetcher;

    #[async_trait::async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
            panic!("fetcher blew up");
        }
    }

    #[tokio::test]
    async fn test_extract_page_success() {
        let page = client(StaticFetcher::new().page(URL, PAGE))
            .extract_page(URL, &set())
            .await;

        assert!(!page.is_failed());
        assert_eq!(
            page.field("quote"),
            Some(&Outcome::Extracted(ScalarResult::Present("R$ 5,42".into())))
        );
        assert_eq!(page.field("pl"), Some(&Outcome::Extracted(ScalarResult::Absent)));
        let record = page.table("dividends").and_then(|o| o.extracted()).unwrap();
        assert_eq!(record.rows, vec![vec!["Dividendo", "01/01", "15/01", "0,50"]]);
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_every_descriptor() {
        let page = client(StaticFetcher::new().status(URL, 503))
            .extract_page(URL, &set())
            .await;

        assert_eq!(page.fields.len(), 2);
        assert_eq!(page.tables.len(), 1);
        for entry in &page.fields {
            let failure = entry.outcome.failure().expect("field should be failed");
            assert_eq!(failure.kind, FailureKind::Fetch);
            assert!(failure.message.contains("503"));
        }
        for entry in &page.tables {
            assert!(entry.outcome.is_failed());
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_without_descriptors_is_reported() {
        let page = client(StaticFetcher::new().status(URL, 503))
            .extract_page(URL, &DescriptorSet::new())
            .await;

        assert!(page.fields.is_empty() && page.tables.is_empty());
        assert!(page.is_failed());
        assert_eq!(page.failure().map(|f| f.kind), Some(FailureKind::Fetch));
        assert!(page.format_text().contains("fetch failed"));
    }

    #[test]
    fn test_extract_bytes_honours_charset() {
        let body = b"<div class=\"_card cotacao\"><div class=\"_card-body\"><span class=\"value\">Cota\xe7\xe3o</span></div></div>";
        let page = client(StaticFetcher::new()).extract_bytes(
            body,
            Some("text/html; charset=iso-8859-1"),
            URL,
            &set(),
        );
        assert_eq!(
            page.field("quote"),
            Some(&Outcome::Extracted(ScalarResult::Present("Cotação".into())))
        );
    }

    #[test]
    fn test_parse_failure_marks_every_descriptor() {
        let page = client(StaticFetcher::new()).extract_html("\0\0\0binary", URL, &set());
        assert!(page.is_failed());
        assert_eq!(page.failure().map(|f| f.kind), Some(FailureKind::Parse));
        assert_eq!(page.fields.len() + page.tables.len(), 3);
    }

    #[test]
    fn test_entries_follow_descriptor_order() {
        let page = client(StaticFetcher::new()).extract_html(PAGE, URL, &set());
        let names: Vec<&str> = page.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["quote", "pl"]);
    }

    #[tokio::test]
    async fn test_spawn_resolves_to_extraction() {
        let c = client(StaticFetcher::new().page(URL, PAGE));
        let load = c.spawn(URL, set());
        let page = load.wait().await.expect("load should complete");
        assert_eq!(page.url, URL);
        assert!(!page.is_failed());
    }

    #[tokio::test]
    async fn test_dropped_load_does_not_disturb_others() {
        let c = client(StaticFetcher::new().page(URL, PAGE));
        drop(c.spawn(URL, set()));
        let page = c.extract_page(URL, &set()).await;
        assert!(!page.is_failed());
    }

    #[tokio::test]
    #[should_panic(expected = "fetcher blew up")]
    async fn test_wait_resumes_panic_from_load() {
        let c = Client::with_fetcher(Arc::new(PanickingFetcher));
        let _ = c.spawn(URL, set()).wait().await;
    }
}
