//! HTTP implementation of [`TicketBackend`] on top of reqwest.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretBox};
use serde::Serialize;
use url::Url;

use crate::config::{Config, RouteConfig};
use crate::error::{Result, TicketDeskError};
use crate::filter::QueryPayload;
use crate::overlay::TicketPatch;
use crate::query::SortSpec;
use crate::types::{ListPage, TicketNumber};

use super::{CommitEnvelope, TicketBackend};

#[derive(Serialize)]
struct BulkUpdateBody<'a> {
    ids: &'a [TicketNumber],
    #[serde(flatten)]
    patch: &'a TicketPatch,
}

/// Ticket backend reached over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    routes: RouteConfig,
    api_token: Option<SecretBox<String>>,
    /// The schema is fetched once per session
    schema_cache: RwLock<Option<serde_json::Value>>,
}

impl HttpBackend {
    /// Create a backend from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.backend.base_url.as_deref().ok_or_else(|| {
            TicketDeskError::Config(
                "backend.base_url is not configured".to_string(),
            )
        })?;
        let mut backend =
            Self::new(base_url, config.timeout())?.with_routes(config.backend.routes.clone());
        if let Some(token) = config.api_token() {
            backend = backend.with_api_token(token);
        }
        Ok(backend)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            routes: RouteConfig::default(),
            api_token: None,
            schema_cache: RwLock::new(None),
        })
    }

    pub fn with_api_token(mut self, token: String) -> Self {
        self.api_token = Some(SecretBox::new(Box::new(token)));
        self
    }

    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Resolve a route (with `{id}` already substituted) against the base URL
    fn endpoint(&self, route: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let route = route.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{route}"))?)
    }

    /// The update route with `{id}` filled in as an encoded path segment
    fn ticket_endpoint(&self, id: &TicketNumber) -> Result<Url> {
        let mut url = self.endpoint("")?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TicketDeskError::Config(format!("base URL {} cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty();
            for part in self.routes.update.split('/').filter(|p| !p.is_empty()) {
                segments.push(&part.replace("{id}", id.as_str()));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_for_page(&self, url: Url) -> Result<ListPage> {
        let response = self.request(Method::GET, url).send().await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<ListPage>().await?)
    }

    async fn send_for_envelope(&self, builder: RequestBuilder) -> Result<CommitEnvelope> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<CommitEnvelope>().await?);
        }

        // Some backends reject with a proper envelope body; keep its message.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<CommitEnvelope>(&body) {
            Ok(envelope) if !envelope.success || envelope.message.is_some() => {
                Ok(CommitEnvelope {
                    success: false,
                    ..envelope
                })
            }
            _ => Err(TicketDeskError::Api(format!("HTTP {status}: {body}"))),
        }
    }
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TicketDeskError::Api(format!("HTTP {status}: {body}")))
}

impl TicketBackend for HttpBackend {
    async fn fetch_filter_schema(&self) -> Result<serde_json::Value> {
        let cached = self.schema_cache.read().clone();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let url = self.endpoint(&self.routes.filter_schema)?;
        let response = self.request(Method::GET, url).send().await?;
        let response = error_for_status(response).await?;
        let schema: serde_json::Value = response.json().await?;

        *self.schema_cache.write() = Some(schema.clone());
        Ok(schema)
    }

    async fn get_list(&self, page: u32, limit: u32, filters: &QueryPayload) -> Result<ListPage> {
        let mut url = self.endpoint(&self.routes.list)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            query.append_pair("limit", &limit.to_string());
            if !filters.is_empty() {
                query.append_pair("filters", &serde_json::to_string(filters)?);
            }
        }
        self.send_for_page(url).await
    }

    async fn get_sorted_list(&self, sort: &SortSpec, page: u32, limit: u32) -> Result<ListPage> {
        let mut url = self.endpoint(&self.routes.sorted_list)?;
        url.query_pairs_mut()
            .append_pair("type", &sort.field)
            .append_pair("order", sort.order.as_str())
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        self.send_for_page(url).await
    }

    async fn update_ticket(&self, id: &TicketNumber, patch: &TicketPatch) -> Result<CommitEnvelope> {
        let url = self.ticket_endpoint(id)?;
        self.send_for_envelope(self.request(Method::PATCH, url).json(patch))
            .await
    }

    async fn bulk_update(&self, ids: &[TicketNumber], patch: &TicketPatch) -> Result<CommitEnvelope> {
        let url = self.endpoint(&self.routes.bulk_update)?;
        let body = BulkUpdateBody { ids, patch };
        self.send_for_envelope(self.request(Method::POST, url).json(&body))
            .await
    }
}
