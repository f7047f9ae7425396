use async_trait::async_trait;
use marquee_content_types::{ErrorResponse, QueryResponse};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, instrument};

use crate::{config::ContentSettings, infra::error::InfraError, query::QueryDescriptor};

use super::{ContentSource, FetchError};

/// HTTP client for the hosted content store's query endpoint.
///
/// One attempt per call, no timeout and no retry.
#[derive(Clone, Debug)]
pub struct ContentClient {
    http: Client,
    endpoint: Url,
}

impl ContentClient {
    pub fn new(settings: &ContentSettings) -> Result<Self, InfraError> {
        let endpoint = settings.query_endpoint().map_err(|err| {
            InfraError::configuration(format!("invalid content query endpoint: {err}"))
        })?;
        Self::with_endpoint(endpoint)
    }

    pub fn with_endpoint(endpoint: Url) -> Result<Self, InfraError> {
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build http client: {err}"))
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("marquee/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(
        &self,
        descriptor: &QueryDescriptor,
        now: OffsetDateTime,
    ) -> Result<Url, FetchError> {
        let stamp = now
            .format(&Rfc3339)
            .map_err(|err| FetchError::failed(format!("failed to format query time: {err}")))?;

        let mut url = self.endpoint.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &descriptor.to_groq());
            // Parameter values are JSON literals.
            for name in descriptor.params() {
                pairs.append_pair(&format!("${name}"), &format!("\"{stamp}\""));
            }
        }
        Ok(url)
    }

    async fn handle(resp: Response) -> Result<Vec<Value>, FetchError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorResponse>(&bytes)
                .ok()
                .and_then(|body| body.error.summary())
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(FetchError::failed(format!("status {status}: {detail}")));
        }

        let body: QueryResponse<Vec<Value>> = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::failed(format!("malformed response body: {err}")))?;
        if let Some(ms) = body.ms {
            debug!(server_ms = ms, "content store query executed");
        }
        Ok(body.result)
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    #[instrument(skip(self, descriptor), fields(entity = descriptor.entity_type()))]
    async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        now: OffsetDateTime,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.request_url(descriptor, now)?;
        let resp = self.http.get(url).send().await?;
        let rows = Self::handle(resp).await?;
        debug!(rows = rows.len(), "content store returned rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn request_url_binds_query_and_now() {
        let endpoint = Url::parse("https://p.apicdn.sanity.io/v2024-01-01/data/query/production")
            .expect("url");
        let client = ContentClient::with_endpoint(endpoint).expect("client");
        let url = client
            .request_url(
                &QueryDescriptor::upcoming_events(),
                datetime!(2030-01-01 12:00 UTC),
            )
            .expect("request url");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "query");
        assert_eq!(pairs[0].1, QueryDescriptor::upcoming_events().to_groq());
        assert_eq!(pairs[1].0, "$now");
        assert_eq!(pairs[1].1, "\"2030-01-01T12:00:00Z\"");
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(ContentClient::user_agent().starts_with("marquee/"));
    }
}
