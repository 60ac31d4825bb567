//! Test utilities for financeflow-core
//!
//! A mock FinanceFlow API server for integration tests and the CLI tests.
//! Transactions are paged the way the real backend pages them, and a few
//! reserved transaction ids make deletes fail with specific statuses:
//!
//! | id          | status |
//! |-------------|--------|
//! | `missing`   | 404    |
//! | `forbidden` | 403    |
//! | `expired`   | 401    |
//! | `boom`      | 500 with a message |
//! | `silent`    | 500 with an empty body |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::{
    Datelike, FixedOffset, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Weekday,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::{
    BankAccount, BankAccountRef, DateDetails, GroupTotals, Pagination, Transaction,
    TransactionType, UserRef,
};

/// Bearer token the mock server accepts
pub const MOCK_TOKEN: &str = "test-token";
/// Viewer id the fixtures are written for
pub const MOCK_USER_ID: &str = "user-1";

#[derive(Default)]
struct MockState {
    transactions: Mutex<Vec<Transaction>>,
    deleted: Mutex<Vec<String>>,
    page_requests: AtomicUsize,
}

/// Mock FinanceFlow API server
pub struct MockApiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockApiServer {
    /// Start the mock server with [`sample_transactions`]
    pub async fn start() -> Self {
        Self::start_with(sample_transactions()).await
    }

    /// Start the mock server on an available port serving `transactions`
    pub async fn start_with(transactions: Vec<Transaction>) -> Self {
        let state = Arc::new(MockState {
            transactions: Mutex::new(transactions),
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/transactions", get(handle_transactions))
            .route("/api/group-transactions/totals", get(handle_totals))
            .route("/api/personal-transactions/:id", delete(handle_delete))
            .route("/api/group-transactions/:id", delete(handle_delete))
            .route("/api/bank-accounts", get(handle_bank_accounts))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of `GET /api/transactions` requests served
    pub fn page_requests(&self) -> usize {
        self.state.page_requests.load(Ordering::SeqCst)
    }

    /// Ids deleted so far, in order
    pub fn deleted(&self) -> Vec<String> {
        self.state.deleted.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", MOCK_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Not authorized, token failed" })),
    )
        .into_response()
}

async fn handle_transactions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.page_requests.fetch_add(1, Ordering::SeqCst);

    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let limit: u32 = params
        .get("limit")
        .and_then(|l| l.parse::<u32>().ok())
        .unwrap_or(20)
        .max(1);

    let transactions = state.transactions.lock().unwrap().clone();
    let transactions: Vec<Transaction> = match params.get("groupId") {
        Some(group_id) => transactions
            .into_iter()
            .filter(|tx| tx.group_id.as_deref() == Some(group_id.as_str()))
            .collect(),
        None => transactions,
    };

    let total = transactions.len() as u32;
    let total_pages = total.div_ceil(limit);
    let start = ((page - 1) * limit) as usize;
    let slice: Vec<Transaction> = transactions
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    let pagination = Pagination {
        current_page: page,
        total_pages,
        total_transactions: total as u64,
    };
    Json(json!({
        "success": true,
        "transactions": slice,
        "pagination": pagination,
    }))
    .into_response()
}

async fn handle_totals(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let totals = GroupTotals {
        you_owe: 12.5,
        owed_to_you: 40.0,
    };
    Json(json!({ "success": true, "totals": totals })).into_response()
}

async fn handle_delete(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Transaction not found" })),
        )
            .into_response(),
        "forbidden" => (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Not allowed" })),
        )
            .into_response(),
        "expired" => unauthorized(),
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Database unavailable" })),
        )
            .into_response(),
        "silent" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => {
            state
                .transactions
                .lock()
                .unwrap()
                .retain(|tx| tx.id != id);
            state.deleted.lock().unwrap().push(id.clone());
            Json(json!({ "success": true, "message": "Transaction deleted" })).into_response()
        }
    }
}

async fn handle_bank_accounts(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "success": true,
        "bankAccounts": sample_bank_accounts(),
    }))
    .into_response()
}

/// Two linked accounts; ids match the fixtures' `bankAccount` references
pub fn sample_bank_accounts() -> Vec<BankAccount> {
    vec![
        BankAccount {
            id: "acct-checking".into(),
            bank_name: Some("First Bank".into()),
            account_name: Some("Checking".into()),
            account_type: Some("checking".into()),
            last4: Some("1234".into()),
            balance: Some(2450.75),
        },
        BankAccount {
            id: "acct-card".into(),
            bank_name: Some("First Bank".into()),
            account_name: Some("Rewards Card".into()),
            account_type: Some("credit".into()),
            last4: Some("9876".into()),
            balance: Some(-310.2),
        },
    ]
}

/// Build a personal transaction owned by [`MOCK_USER_ID`]
pub fn personal(
    id: &str,
    amount: f64,
    transaction_type: TransactionType,
    date: &str,
    category: &str,
) -> Transaction {
    Transaction {
        id: id.into(),
        amount,
        transaction_type,
        category: Some(category.into()),
        title: Some(format!("{} {}", category, id)),
        date_details: Some(DateDetails {
            date: Some(date.into()),
        }),
        is_personal_transaction: true,
        user: Some(UserRef::from(MOCK_USER_ID)),
        ..Default::default()
    }
}

/// A month of March 2024 activity for [`MOCK_USER_ID`]
pub fn sample_transactions() -> Vec<Transaction> {
    use TransactionType::{Expense, Income};

    let mut transactions = vec![
        personal("t01", 3000.0, Income, "2024-03-01", "Salary"),
        personal("t02", 42.5, Expense, "2024-03-02", "Food"),
        personal("t03", 1200.0, Expense, "2024-03-03", "Rent"),
        personal("t04", 18.0, Expense, "2024-03-05", "Transport"),
        personal("t05", 64.3, Expense, "2024-03-09", "Food"),
        personal("t06", 250.0, Income, "2024-03-12", "Freelance"),
        personal("t07", 89.99, Expense, "2024-03-15", "Shopping"),
        personal("t08", 23.75, Expense, "2024-03-18", "Food"),
        personal("t09", 15.0, Expense, "2024-03-22", "Transport"),
        personal("t10", 120.0, Expense, "2024-03-28", "Utilities"),
    ];
    transactions[1].bank_account = Some(BankAccountRef::Id("acct-card".into()));
    transactions[2].bank_account = Some(BankAccountRef::Id("acct-checking".into()));

    let mut dinner = personal("t11", 60.0, Expense, "2024-03-20", "Food");
    dinner.is_personal_transaction = false;
    dinner.is_group_transaction = true;
    dinner.group_id = Some("group-1".into());
    dinner.title = Some("Team dinner".into());
    transactions.push(dinner);

    transactions
}

/// US Eastern time with its DST rules, for tests that need a zone whose
/// offset changes during the year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EasternTime;

impl EasternTime {
    /// EDT from 07:00 UTC on the second Sunday of March until 06:00 UTC on
    /// the first Sunday of November
    fn offset_at(utc: &NaiveDateTime) -> FixedOffset {
        let year = utc.year();
        let starts = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)
            .and_then(|d| d.and_hms_opt(7, 0, 0))
            .unwrap();
        let ends = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)
            .and_then(|d| d.and_hms_opt(6, 0, 0))
            .unwrap();
        let hours = if *utc >= starts && *utc < ends { 4 } else { 5 };
        FixedOffset::west_opt(hours * 3600).unwrap()
    }
}

impl TimeZone for EasternTime {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        EasternTime
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> MappedLocalTime<FixedOffset> {
        // Approximate within an hour of a switch; tests convert from UTC
        MappedLocalTime::Single(Self::offset_at(local))
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        Self::offset_at(utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiClient, PageRequest, TransactionApi};
    use crate::error::Error;
    use crate::models::TransactionKind;

    fn client(server: &MockApiServer) -> ApiClient {
        ApiClient::new(&server.url()).with_token(Some(MOCK_TOKEN.to_string()))
    }

    #[tokio::test]
    async fn test_mock_server_pages_transactions() {
        let server = MockApiServer::start().await;
        let client = client(&server);

        let first = client
            .fetch_transactions(&PageRequest::new(1, 4))
            .await
            .unwrap();
        assert_eq!(first.transactions.len(), 4);
        assert_eq!(first.pagination.total_pages, 3);
        assert_eq!(first.pagination.total_transactions, 11);

        let last = client
            .fetch_transactions(&PageRequest::new(3, 4))
            .await
            .unwrap();
        assert_eq!(last.transactions.len(), 3);
        assert!(!last.pagination.has_more());
        assert_eq!(server.page_requests(), 2);
    }

    #[tokio::test]
    async fn test_group_filter() {
        let server = MockApiServer::start().await;
        let page = client(&server)
            .fetch_transactions(&PageRequest::new(1, 20).group(Some("group-1")))
            .await
            .unwrap();
        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.transactions[0].kind(), TransactionKind::Group);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let server = MockApiServer::start().await;
        let result = ApiClient::new(&server.url())
            .fetch_transactions(&PageRequest::new(1, 20))
            .await;
        match result {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Not authorized, token failed");
            }
            other => panic!("expected 401, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_group_totals_and_accounts() {
        let server = MockApiServer::start().await;
        let client = client(&server);

        let totals = client.fetch_group_totals(None).await.unwrap();
        assert_eq!(totals.you_owe, 12.5);
        assert_eq!(totals.owed_to_you, 40.0);

        let accounts = client.fetch_bank_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].display_name(), "First Bank Checking ••1234");
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let server = MockApiServer::start().await;
        let client = client(&server);

        let outcome = client
            .delete_transaction("t02", TransactionKind::Personal)
            .await
            .unwrap();
        assert_eq!(outcome.message, "Transaction deleted");
        assert_eq!(server.deleted(), vec!["t02".to_string()]);

        let cases = [
            ("missing", 404, "Transaction not found. It may have already been deleted."),
            ("forbidden", 403, "You don't have permission to delete this transaction."),
            ("expired", 401, "Your session has expired. Please log in again."),
            ("boom", 500, "Database unavailable"),
            ("silent", 500, "Failed to delete transaction."),
        ];
        for (id, expected_status, expected_message) in cases {
            match client.delete_transaction(id, TransactionKind::Group).await {
                Err(Error::DeleteFailed { status, message }) => {
                    assert_eq!(status, expected_status, "{}", id);
                    assert_eq!(message, expected_message, "{}", id);
                }
                other => panic!("expected delete failure for {}, got {:?}", id, other),
            }
        }
    }
}
