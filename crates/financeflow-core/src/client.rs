//! FinanceFlow REST API client
//!
//! [`TransactionApi`] is the seam the rest of the crate talks to;
//! [`ApiClient`] implements it over HTTP with reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    ApiMessage, BankAccount, BankAccountsResponse, GroupTotals, GroupTotalsResponse,
    TransactionKind, TransactionPage,
};

/// Parameters for one page of transactions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub group_id: Option<String>,
    pub user_id: Option<String>,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    pub fn group(mut self, group_id: Option<&str>) -> Self {
        self.group_id = group_id.map(str::to_string);
        self
    }

    pub fn user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(group_id) = &self.group_id {
            query.push(("groupId", group_id.clone()));
        }
        if let Some(user_id) = &self.user_id {
            query.push(("userId", user_id.clone()));
        }
        query
    }
}

/// A successful delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub message: String,
}

/// Operations the app needs from the FinanceFlow backend
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// One page of personal/group transactions
    async fn fetch_transactions(&self, request: &PageRequest) -> Result<TransactionPage>;

    /// The viewer's aggregate group balances
    async fn fetch_group_totals(&self, group_id: Option<&str>) -> Result<GroupTotals>;

    /// Delete a transaction through the endpoint for its kind
    async fn delete_transaction(&self, id: &str, kind: TransactionKind) -> Result<DeleteOutcome>;

    async fn fetch_bank_accounts(&self) -> Result<Vec<BankAccount>>;
}

/// User-facing copy for a failed delete.
///
/// 404, 403 and 401 get fixed wording; anything else shows the server's
/// message when it sent one.
pub fn describe_delete_failure(status: u16, server_message: Option<&str>) -> String {
    match status {
        404 => "Transaction not found. It may have already been deleted.".to_string(),
        403 => "You don't have permission to delete this transaction.".to_string(),
        401 => "Your session has expired. Please log in again.".to_string(),
        _ => server_message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("Failed to delete transaction.")
            .to_string(),
    }
}

/// API path for deleting a transaction of `kind`
pub fn delete_path(id: &str, kind: TransactionKind) -> String {
    match kind {
        TransactionKind::Group => format!("/api/group-transactions/{}", id),
        TransactionKind::Personal | TransactionKind::Contact => {
            format!("/api/personal-transactions/{}", id)
        }
    }
}

/// HTTP client for the FinanceFlow API
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client with reqwest defaults
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Create a client honoring the configured base URL and timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` on every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        debug!("GET {} {:?}", path, query);
        let response = self
            .authorize(self.http_client.get(self.url(path)))
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx response into `Error::Api`, keeping the server's message
async fn api_error(response: Response) -> Error {
    let status = response.status();
    let message = error_message(response).await;
    Error::Api {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| fallback_reason(status)),
    }
}

async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    serde_json::from_str::<ApiMessage>(&body)
        .ok()
        .and_then(|m| m.message)
}

fn fallback_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

fn unsuccessful(message: Option<String>, what: &str) -> Error {
    Error::Api {
        status: 200,
        message: message.unwrap_or_else(|| format!("Failed to load {}", what)),
    }
}

#[async_trait]
impl TransactionApi for ApiClient {
    async fn fetch_transactions(&self, request: &PageRequest) -> Result<TransactionPage> {
        let page: TransactionPage = self.get_json("/api/transactions", &request.query()).await?;
        if !page.success {
            return Err(unsuccessful(page.message, "transactions"));
        }
        debug!(
            page = page.pagination.current_page,
            total_pages = page.pagination.total_pages,
            count = page.transactions.len(),
            "Fetched transaction page"
        );
        Ok(page)
    }

    async fn fetch_group_totals(&self, group_id: Option<&str>) -> Result<GroupTotals> {
        let query: Vec<(&'static str, String)> = group_id
            .map(|g| vec![("groupId", g.to_string())])
            .unwrap_or_default();
        let response: GroupTotalsResponse = self
            .get_json("/api/group-transactions/totals", &query)
            .await?;
        if !response.success {
            return Err(unsuccessful(response.message, "group balances"));
        }
        Ok(response.totals)
    }

    async fn delete_transaction(&self, id: &str, kind: TransactionKind) -> Result<DeleteOutcome> {
        let path = delete_path(id, kind);
        debug!("DELETE {}", path);
        let response = self
            .authorize(self.http_client.delete(self.url(&path)))
            .send()
            .await?;

        let status = response.status();
        let body = read_message(response).await;

        if !status.is_success() || !body.success {
            let message = describe_delete_failure(status.as_u16(), body.message.as_deref());
            warn!("Delete of {} failed ({}): {}", id, status, message);
            return Err(Error::DeleteFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok(DeleteOutcome {
            message: body
                .message
                .unwrap_or_else(|| "Transaction deleted successfully".to_string()),
        })
    }

    async fn fetch_bank_accounts(&self) -> Result<Vec<BankAccount>> {
        let response: BankAccountsResponse = self.get_json("/api/bank-accounts", &[]).await?;
        if !response.success {
            return Err(unsuccessful(response.message, "bank accounts"));
        }
        Ok(response.bank_accounts)
    }
}

/// Parse a `{success, message}` body; an unreadable body counts as failure
async fn read_message(response: Response) -> ApiMessage {
    match response.text().await {
        Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
        Err(_) => ApiMessage::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_delete_failure_by_status() {
        assert!(describe_delete_failure(404, Some("gone")).contains("not found"));
        assert!(describe_delete_failure(403, None).contains("permission"));
        assert!(describe_delete_failure(401, None).contains("log in again"));
        assert_eq!(
            describe_delete_failure(500, Some("Database unavailable")),
            "Database unavailable"
        );
        assert_eq!(
            describe_delete_failure(500, Some("  ")),
            "Failed to delete transaction."
        );
        assert_eq!(describe_delete_failure(502, None), "Failed to delete transaction.");
    }

    #[test]
    fn test_delete_path_by_kind() {
        assert_eq!(
            delete_path("abc", TransactionKind::Group),
            "/api/group-transactions/abc"
        );
        assert_eq!(
            delete_path("abc", TransactionKind::Personal),
            "/api/personal-transactions/abc"
        );
        assert_eq!(
            delete_path("abc", TransactionKind::Contact),
            "/api/personal-transactions/abc"
        );
    }

    #[test]
    fn test_page_request_query() {
        let request = PageRequest::new(2, 20).group(Some("g1"));
        assert_eq!(
            request.query(),
            vec![
                ("page", "2".to_string()),
                ("limit", "20".to_string()),
                ("groupId", "g1".to_string()),
            ]
        );
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert!(!client.has_token());

        let client = client.with_token(Some("t0k3n".to_string()));
        assert!(client.has_token());
    }
}
