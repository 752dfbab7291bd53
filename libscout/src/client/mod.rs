//! HTTP client for registry communication.
//!
//! This module provides a thin async client built on reqwest for the three
//! Distribution API v2 calls a search needs: the catalog, a repository's tag
//! list and a tag's manifest. Catalog and tag lists follow `Link: rel="next"`
//! pagination. Every call translates transport and status failures into
//! [`ScoutError`] values.

use crate::auth::Credentials;
use crate::config::SearchConfig;
use crate::error::{Result, ScoutError};
use crate::image::TagRecord;
use crate::oci::{MANIFEST_ACCEPT, ManifestDocument};
use crate::pool::{ManifestJob, ManifestRunner};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest as Sha2Digest, Sha256};
use std::time::Duration;
use url::Url;

#[cfg(test)]
mod tests;

/// Response from the catalog API endpoint.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Vec<String>,
}

/// Response from the tags list API endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    name: String,
    /// Registries send `null` for a repository without tags.
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// A fetched manifest and the digest identifying it.
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub document: ManifestDocument,
    /// `Docker-Content-Digest` header, or the sha256 of the body when absent
    pub digest: String,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libscout::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// Resolves `path` against the registry base URL.
///
/// The base must be an absolute `http` or `https` URL with a host; anything
/// else is [`ScoutError::InvalidUrl`].
///
/// # Examples
///
/// ```
/// use libscout::client::endpoint;
///
/// let url = endpoint("http://localhost:5000", "/v2/_catalog").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:5000/v2/_catalog");
///
/// assert!(endpoint("not a url", "/v2/_catalog").is_err());
/// ```
pub fn endpoint(server_url: &str, path: &str) -> Result<Url> {
    let base = parse_server_url(server_url)?;
    base.join(path)
        .map_err(|_| ScoutError::invalid_url(format!("{}{}", server_url, path)))
}

/// Parses and checks a registry base URL.
pub fn parse_server_url(server_url: &str) -> Result<Url> {
    let trimmed = server_url.trim();
    let url = Url::parse(trimmed).map_err(|_| ScoutError::invalid_url(server_url))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ScoutError::invalid_url(server_url));
    }

    Ok(url)
}

/// HTTP client for registry operations.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    server_url: Url,
    timeout: Duration,
}

impl Client {
    /// Creates a client for the search's registry with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::client::Client;
    /// use libscout::config::SearchConfig;
    /// use libscout::render::OutputFormat;
    ///
    /// let config = SearchConfig::new("http://localhost:5000", true, OutputFormat::Text);
    /// let client = Client::new(&config).unwrap();
    /// assert_eq!(client.server_url().as_str(), "http://localhost:5000/");
    /// ```
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Self::with_config(config, ClientConfig::default())
    }

    /// Creates a client with custom connection settings.
    ///
    /// TLS certificate verification follows `config.verify_tls`.
    pub fn with_config(config: &SearchConfig, client_config: ClientConfig) -> Result<Self> {
        let server_url = parse_server_url(&config.server_url)?;
        let timeout = Duration::from_secs(client_config.timeout_seconds);

        let http_client = ReqwestClient::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(client_config.max_idle_per_host)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ScoutError::network_with_source("Failed to create HTTP client", e))?;

        if !config.verify_tls {
            tracing::warn!(url = %server_url, "TLS certificate verification is disabled");
        }

        Ok(Self {
            http_client,
            server_url,
            timeout,
        })
    }

    /// Returns the registry base URL.
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Resolves `path` against this client's registry.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.server_url
            .join(path)
            .map_err(|_| ScoutError::invalid_url(format!("{}{}", self.server_url, path)))
    }

    /// Fetches every repository name in the catalog, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry is unreachable
    /// - Authentication is required but not provided
    /// - The response cannot be parsed as valid JSON
    pub async fn fetch_catalog(&self, credentials: &Credentials) -> Result<Vec<String>> {
        self.fetch_catalog_paginated(credentials, None).await
    }

    /// Fetches the catalog with an optional page size.
    pub async fn fetch_catalog_paginated(
        &self,
        credentials: &Credentials,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut url = self.endpoint("/v2/_catalog")?;
        if let Some(n) = limit {
            url.query_pairs_mut().append_pair("n", &n.to_string());
        }

        let mut repositories = Vec::new();
        loop {
            let response = self.get(&url, credentials, None).await?;
            let next = Self::extract_next_link(response.headers());

            let page: CatalogResponse = response.json().await.map_err(|e| {
                ScoutError::validation_with_source("Failed to parse catalog response", e)
            })?;
            repositories.extend(page.repositories);

            match next {
                Some(path) => url = self.endpoint(&path)?,
                None => break,
            }
        }

        tracing::debug!(count = repositories.len(), "fetched catalog");
        Ok(repositories)
    }

    /// Fetches every tag of `repository`, following pagination.
    ///
    /// A `null` tag list is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry is unreachable
    /// - The repository does not exist
    /// - The response names a different repository
    pub async fn fetch_tags(&self, credentials: &Credentials, repository: &str) -> Result<Vec<String>> {
        self.fetch_tags_paginated(credentials, repository, None).await
    }

    /// Fetches a repository's tags with an optional page size.
    pub async fn fetch_tags_paginated(
        &self,
        credentials: &Credentials,
        repository: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut url = self.endpoint(&format!("/v2/{}/tags/list", repository))?;
        if let Some(n) = limit {
            url.query_pairs_mut().append_pair("n", &n.to_string());
        }

        let mut tags = Vec::new();
        loop {
            let response = self.get(&url, credentials, None).await?;
            let next = Self::extract_next_link(response.headers());

            let page: TagsResponse = response.json().await.map_err(|e| {
                ScoutError::validation_with_source("Failed to parse tags response", e)
            })?;

            if page.name != repository {
                return Err(ScoutError::validation(format!(
                    "Registry returned tags for '{}' but expected '{}'",
                    page.name, repository
                )));
            }

            tags.extend(page.tags.unwrap_or_default());

            match next {
                Some(path) => url = self.endpoint(&path)?,
                None => break,
            }
        }

        tracing::debug!(repository, count = tags.len(), "fetched tags");
        Ok(tags)
    }

    /// Fetches and parses the manifest at `url`.
    ///
    /// The digest comes from the `Docker-Content-Digest` header; registries
    /// that omit it get the sha256 of the body instead.
    pub async fn fetch_manifest(&self, url: &Url, credentials: &Credentials) -> Result<FetchedManifest> {
        let response = self.get(url, credentials, Some(MANIFEST_ACCEPT)).await?;

        let header_digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| ScoutError::network_with_source("Failed to read manifest response", e))?;

        let document = ManifestDocument::from_bytes(&body)?;

        let digest = header_digest.unwrap_or_else(|| {
            let mut hasher = Sha256::new();
            hasher.update(&body);
            format!("sha256:{:x}", hasher.finalize())
        });

        Ok(FetchedManifest { document, digest })
    }

    /// Fetches a job's manifest and builds its tag record.
    pub async fn fetch_tag_record(&self, job: &ManifestJob) -> Result<TagRecord> {
        let manifest = self.fetch_manifest(&job.url, &job.credentials).await?;
        Ok(TagRecord::new(
            job.tag.clone(),
            &manifest.digest,
            manifest.document.total_size(),
        ))
    }

    /// Issues a GET with the credentials' Authorization header and checks the status.
    async fn get(&self, url: &Url, credentials: &Credentials, accept: Option<&str>) -> Result<Response> {
        let mut request = self.http_client.get(url.clone());

        if let Some(auth_header) = credentials.to_header_value() {
            request = request.header(AUTHORIZATION, auth_header);
        }
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e))?;

        Self::check_response_status(response).await
    }

    /// Extracts the next page path from the Link header.
    ///
    /// Format: `</v2/_catalog?n=100&last=repo99>; rel="next"`
    fn extract_next_link(headers: &HeaderMap) -> Option<String> {
        let link_str = headers.get(LINK)?.to_str().ok()?;

        for link_part in link_str.split(',') {
            let link_part = link_part.trim();

            if (link_part.contains("rel=\"next\"") || link_part.contains("rel='next'"))
                && let Some(start) = link_part.find('<')
                && let Some(end) = link_part.find('>')
                && start < end
            {
                return Some(link_part[start + 1..end].to_string());
            }
        }

        None
    }

    /// Translates a reqwest error into a ScoutError.
    fn translate_reqwest_error(&self, error: reqwest::Error) -> ScoutError {
        if error.is_timeout() {
            ScoutError::network(format!(
                "Request to {} timed out after {} seconds",
                self.server_url,
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            ScoutError::network_with_source(
                format!("Failed to connect to registry at {}", self.server_url),
                error,
            )
        } else if error.is_request() {
            ScoutError::network_with_source(
                format!("Failed to send request to {}", self.server_url),
                error,
            )
        } else {
            ScoutError::network_with_source(
                format!("Network error communicating with {}", self.server_url),
                error,
            )
        }
    }

    /// Checks the HTTP response status and translates errors to ScoutError.
    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let retry_after = Self::parse_retry_after(response.headers());
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(ScoutError::authentication(
                format!("Authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(ScoutError::authentication(
                format!("Access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            StatusCode::NOT_FOUND => Err(ScoutError::not_found("endpoint", &url)),
            StatusCode::TOO_MANY_REQUESTS => Err(ScoutError::rate_limit(
                format!("Rate limit exceeded for {}", url),
                retry_after,
            )),
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Err(ScoutError::server(
                format!("Server error from {}: {}", url, error_body),
                status.as_u16(),
            )),
            _ => Err(ScoutError::network(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_body
            ))),
        }
    }

    /// Reads a delay-seconds `Retry-After` header. HTTP dates are ignored.
    fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
        headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl ManifestRunner for Client {
    async fn run(&self, job: &ManifestJob) -> Result<TagRecord> {
        self.fetch_tag_record(job).await
    }
}
