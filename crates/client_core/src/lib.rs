//! Typed HTTP client for the item view service.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::ItemId,
    error::{ApiError, ApiException},
    protocol::{
        InitialState, ItemPage, MessageResponse, MoveItemRequest, ResetOrderRequest,
        SaveOrderRequest, SaveSelectionRequest, SetActiveSearchTermRequest,
    },
};
use tracing::debug;

/// Which stored order a reset should clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetTarget {
    /// The unfiltered context, same as sending no body.
    Global,
    Term(String),
    All,
}

#[derive(Clone)]
pub struct ItemsClient {
    http: Client,
    server_url: String,
}

impl ItemsClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), server_url)
    }

    pub fn with_http(http: Client, server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/healthz", self.server_url))
            .send()
            .await
            .context("health request failed")?;
        Ok(check(response).await?.text().await?)
    }

    pub async fn fetch_page(&self, page: i64, limit: i64, search: &str) -> Result<ItemPage> {
        debug!(page, limit, search, "fetching page");
        let response = self
            .http
            .get(format!("{}/api/items", self.server_url))
            .query(&[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("search", search.to_string()),
            ])
            .send()
            .await
            .context("items request failed")?;
        decode(response).await
    }

    pub async fn initial_state(&self) -> Result<InitialState> {
        let response = self
            .http
            .get(format!("{}/api/initial-state", self.server_url))
            .send()
            .await
            .context("initial-state request failed")?;
        decode(response).await
    }

    pub async fn save_order(&self, search_term: &str, order: Vec<ItemId>) -> Result<String> {
        self.post(
            "save-order",
            &SaveOrderRequest {
                order,
                search_term: search_term.to_string(),
            },
        )
        .await
    }

    pub async fn move_item(
        &self,
        search_term: &str,
        dragged_id: ItemId,
        target_id: ItemId,
    ) -> Result<String> {
        self.post(
            "move-item",
            &MoveItemRequest {
                dragged_id,
                target_id,
                search_term: search_term.to_string(),
            },
        )
        .await
    }

    pub async fn reset_order(&self, target: ResetTarget) -> Result<String> {
        let body = match target {
            ResetTarget::Global => ResetOrderRequest::default(),
            ResetTarget::Term(term) => ResetOrderRequest {
                search_term: Some(term),
                all: false,
            },
            ResetTarget::All => ResetOrderRequest {
                search_term: None,
                all: true,
            },
        };
        self.post("reset-sort-order", &body).await
    }

    pub async fn save_selection(&self, selected_ids: Vec<ItemId>) -> Result<String> {
        self.post("save-selection", &SaveSelectionRequest { selected_ids })
            .await
    }

    pub async fn set_active_search_term(&self, search_term: &str) -> Result<String> {
        self.post(
            "set-active-search-term",
            &SetActiveSearchTermRequest {
                search_term: search_term.to_string(),
            },
        )
        .await
    }

    async fn post<B: Serialize>(&self, route: &str, body: &B) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/{route}", self.server_url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("{route} request failed"))?;
        let message: MessageResponse = decode(response).await?;
        Ok(message.message)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(check(response).await?.json().await?)
}

/// Turns non-success responses into errors, preferring the server's error envelope.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => Err(ApiException::from(error))
            .with_context(|| format!("server responded with {status}")),
        Err(_) => Err(anyhow::anyhow!("server responded with {status}: {body}")),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
