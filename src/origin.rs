//! Origin Module
//!
//! The backing source the proxy fills its cache from: a plain HTTP server
//! that answers `GET <base>/<key>` with the value as the response body.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use reqwest::Url;
use tracing::{debug, info};

use crate::config::Config;

/// How long fetched values live, and when to stop hitting a failing origin.
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    pub value_ttl: Duration,
    /// Consecutive failures after which the placeholder is served
    pub placeholder_after: u32,
    pub placeholder_ttl: Duration,
}

impl LoadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            value_ttl: Duration::from_secs(config.value_ttl),
            placeholder_after: config.placeholder_after,
            placeholder_ttl: Duration::from_secs(config.placeholder_ttl),
        }
    }
}

/// HTTP client for the origin.
#[derive(Debug, Clone)]
pub struct Origin {
    client: reqwest::Client,
    base_url: Url,
    policy: LoadPolicy,
}

impl Origin {
    pub fn new(base_url: impl Into<String>, timeout: Duration, policy: LoadPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build origin HTTP client")?;

        let base_url: String = base_url.into();
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("invalid origin URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("origin URL {base_url} cannot carry a key path");
        }

        Ok(Self {
            client,
            base_url,
            policy,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            config.origin_url.clone(),
            Duration::from_secs(config.origin_timeout),
            LoadPolicy::from_config(config),
        )
    }

    /// URL of `key` on the origin. The key always lands in a single,
    /// percent-encoded path segment, so `/`, `?` or `#` in a key cannot
    /// address another resource.
    fn key_url(&self, key: &str) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("origin URL {} cannot carry a key path", self.base_url))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    // == Load ==
    /// Loader for [`Cache::get`](crate::cache::Cache::get).
    ///
    /// Once `fail_count` reaches the policy threshold the origin is left
    /// alone and a `None` placeholder is returned with the short placeholder
    /// TTL. A successful fill resets the count, so the origin is tried again
    /// once the placeholder expires.
    pub async fn load(&self, key: &str, fail_count: u32) -> anyhow::Result<(Option<String>, Duration)> {
        if fail_count >= self.policy.placeholder_after {
            info!(key, fail_count, "Origin keeps failing, caching placeholder");
            return Ok((None, self.policy.placeholder_ttl));
        }

        let url = self.key_url(key)?;
        debug!(%url, fail_count, "Fetching from origin");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("origin answered {status} for {url}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body from {url}"))?;

        Ok((Some(body), self.policy.value_ttl))
    }
}
