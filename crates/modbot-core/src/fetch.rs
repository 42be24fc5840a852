//! Remote retrieval of authored content.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{BotError, Result};
use crate::http_client::build_http_client;
use crate::manifest::TextFile;

/// Extensions accepted by `botmsg fetch`.
pub const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];
/// Extensions accepted by `botmsg load`.
pub const MANIFEST_EXTENSIONS: &[&str] = &["json"];

/// Parse `raw` as an http(s) URL whose path ends in one of `extensions`.
pub fn parse_http_url_with_ext(raw: &str, extensions: &[&str]) -> Result<Url> {
    let invalid = || BotError::InvalidUrl(raw.to_string());

    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }

    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return Err(invalid());
    };
    if stem.is_empty()
        || !extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    {
        return Err(invalid());
    }
    Ok(url)
}

#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Download a text document.
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Fetch and validate a message manifest.
pub async fn fetch_manifest(fetcher: &dyn RemoteFetcher, url: &Url) -> Result<TextFile> {
    let raw = fetcher.fetch_text(url).await?;
    let manifest = TextFile::parse(&raw)?;
    debug!(
        "Loaded manifest for channel {} with {} message(s)",
        manifest.channel_id,
        manifest.messages.len()
    );
    Ok(manifest)
}

/// [`RemoteFetcher`] backed by reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!("Fetching {}", url);
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("Fetching {} failed with {}", url, status);
            return Err(BotError::Upstream(format!("{url} returned {status}")));
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_accepts_allowed_extensions() {
        assert!(parse_http_url_with_ext("https://example.com/a/welcome.md", TEXT_EXTENSIONS).is_ok());
        assert!(parse_http_url_with_ext("http://example.com/rules.MARKDOWN", TEXT_EXTENSIONS).is_ok());
        assert!(parse_http_url_with_ext("https://example.com/x.txt?raw=1", TEXT_EXTENSIONS).is_ok());
        assert!(parse_http_url_with_ext("https://example.com/msgs.json", MANIFEST_EXTENSIONS).is_ok());
    }

    #[test]
    fn test_rejects_other_extensions_and_schemes() {
        for raw in [
            "https://example.com/file.pdf",
            "https://example.com/file",
            "https://example.com/.md",
            "ftp://example.com/file.md",
            "file:///etc/notes.md",
            "not a url.md",
        ] {
            let err = parse_http_url_with_ext(raw, TEXT_EXTENSIONS).unwrap_err();
            assert!(matches!(err, BotError::InvalidUrl(_)), "{raw}");
        }
        assert!(parse_http_url_with_ext("https://example.com/msgs.md", MANIFEST_EXTENSIONS).is_err());
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/notes.md", server.uri())).unwrap();
        assert_eq!(fetcher.fetch_text(&url).await.unwrap(), "# Hello");
    }

    #[tokio::test]
    async fn test_http_fetcher_maps_status_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/missing.json", server.uri())).unwrap();
        let err = fetcher.fetch_text(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_fetch_manifest_rejects_garbage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/broken.json", server.uri())).unwrap();
        let err = fetch_manifest(&fetcher, &url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
