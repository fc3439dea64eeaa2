use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use url::Url;

/// Client for the generic pass-through proxy.
///
/// The proxy forwards a `url` query parameter to an arbitrary upstream host
/// and relays the JSON body (or the upstream's error status). Every external
/// call in this crate goes through it, so the fetchers only ever build the
/// target URL and hand it over here.
///
/// The underlying client deliberately sets no request timeout: a hung
/// upstream degrades the one chain waiting on it, nothing else.
#[derive(Clone)]
pub struct ProxyClient {
    base_url: String,
    client: reqwest::Client,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch `target` through the proxy and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        let mut url = Url::parse(&format!("{}/api/proxy", self.base_url))
            .context("Invalid proxy base URL")?;
        // query_pairs_mut percent-encodes the target, which the proxy
        // decodes back before forwarding.
        url.query_pairs_mut().append_pair("url", target);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Proxy request failed for {target}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Proxy returned {status} for {target}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode JSON from {target}"))
    }
}
