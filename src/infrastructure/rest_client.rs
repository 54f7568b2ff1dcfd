use futures::future::BoxFuture;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::{BoardError, Card, Column, ColumnId};
use crate::services::{BoardSource, CardColumnPersister};

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped { data } => data,
        }
    }
}

/// Stages and leads served by the CRM REST backend.
#[derive(Debug, Clone)]
pub struct RestBoardClient {
    http_client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    account_id: Option<i64>,
}

impl RestBoardClient {
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        token: Option<String>,
        account_id: Option<i64>,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            account_id,
        }
    }

    pub async fn fetch_columns(&self) -> Result<Vec<Column>, BoardError> {
        self.get_list("/stages").await
    }

    pub async fn fetch_cards(&self) -> Result<Vec<Card>, BoardError> {
        self.get_list("/leads").await
    }

    pub async fn update_card_column(&self, card_id: &str, column_id: ColumnId) -> Result<(), BoardError> {
        let path = match self.account_id {
            Some(account_id) => format!("/leads/{}", account_id),
            None => "/leads".to_string(),
        };
        let request = self
            .http_client
            .put(self.url(&path))
            .json(&json!({ "id": card_id, "stage_id": column_id }));

        self.send(request).await?;
        Ok(())
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BoardError> {
        let response = self.send(self.http_client.get(self.url(path))).await?;
        let listing = response.json::<Listing<T>>().await?;
        Ok(listing.into_vec())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BoardError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| {
                format!(
                    "Error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )
            });

        Err(BoardError::Persistence(message))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

impl BoardSource for RestBoardClient {
    fn get_columns(&self) -> BoxFuture<'_, Result<Vec<Column>, BoardError>> {
        Box::pin(self.fetch_columns())
    }

    fn get_cards(&self) -> BoxFuture<'_, Result<Vec<Card>, BoardError>> {
        Box::pin(self.fetch_cards())
    }
}

impl CardColumnPersister for RestBoardClient {
    fn persist_card_column<'a>(
        &'a self,
        card_id: &'a str,
        column_id: ColumnId,
    ) -> BoxFuture<'a, Result<(), BoardError>> {
        Box::pin(self.update_card_column(card_id, column_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_accepts_bare_and_wrapped_arrays() {
        let bare: Listing<Column> =
            serde_json::from_str(r#"[{"id":1,"name":"New","sequence":1}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: Listing<Column> = serde_json::from_str(
            r#"{"status":200,"message":"ok","count":1,"data":[{"id":2,"name":"Won","sequence":9,"isWinning":true}]}"#,
        )
        .unwrap();
        let columns = wrapped.into_vec();
        assert_eq!(columns[0].id, 2);
        assert!(columns[0].is_winning);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_api_url() {
        let client = RestBoardClient::new(reqwest::Client::new(), "http://crm.local/api/", None, Some(7));
        assert_eq!(client.url("/leads/7"), "http://crm.local/api/leads/7");
    }
}
