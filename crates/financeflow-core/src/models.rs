//! Domain models for FinanceFlow
//!
//! These mirror the JSON shapes served by the FinanceFlow REST API. Field
//! names are camelCase on the wire; references to users and bank accounts may
//! arrive either as bare ids or as populated objects.

use serde::{Deserialize, Serialize};

/// Transaction type as recorded by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Income vs. expense relative to a specific viewing user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl From<TransactionType> for Direction {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Income => Self::Income,
            TransactionType::Expense => Self::Expense,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" | "in" => Ok(Self::Income),
            "expense" | "expenses" | "out" => Ok(Self::Expense),
            _ => Err(format!("Unknown direction: {} (valid: income, expense)", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relational context of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// The user's own income or spending
    Personal,
    /// Shared with a group and split between members
    Group,
    /// Money moving between the user and a contact
    Contact,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Group => "group",
            Self::Contact => "contact",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "group" => Ok(Self::Group),
            "contact" => Ok(Self::Contact),
            _ => Err(format!(
                "Unknown transaction kind: {} (valid: personal, group, contact)",
                s
            )),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A populated user object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Reference to a user: either a bare id or a populated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    User(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::User(user) => &user.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::User(user) => user.name.as_deref(),
        }
    }

    pub fn is(&self, user_id: &str) -> bool {
        self.id() == user_id
    }
}

impl From<&str> for UserRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// Counterparty of a contact transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactRef {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// The contact's own account, when the contact is a registered user
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// A linked bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default, alias = "lastFourDigits")]
    pub last4: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}

impl BankAccount {
    /// Human-readable label, e.g. "Chase Checking ••1234"
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(bank) = &self.bank_name {
            parts.push(bank.clone());
        }
        if let Some(name) = &self.account_name {
            parts.push(name.clone());
        }
        if parts.is_empty() {
            parts.push(self.id.clone());
        }
        let mut label = parts.join(" ");
        if let Some(last4) = &self.last4 {
            label.push_str(&format!(" ••{}", last4));
        }
        label
    }
}

/// Reference to a bank account: either a bare id or a populated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BankAccountRef {
    Id(String),
    Account(BankAccount),
}

impl BankAccountRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Account(account) => &account.id,
        }
    }
}

/// Canonical local-date override attached to a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DateDetails {
    /// `YYYY-MM-DD` in the user's local calendar
    #[serde(default)]
    pub date: Option<String>,
}

/// A financial transaction as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Always non-negative; direction comes from the type and context
    pub amount: f64,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw timestamp; parsed lazily so one bad record never fails a page
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub date_details: Option<DateDetails>,
    #[serde(default)]
    pub is_personal_transaction: bool,
    #[serde(default)]
    pub is_group_transaction: bool,
    #[serde(default)]
    pub is_contact_transaction: bool,
    /// Owning (paying) user
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub contact: Option<ContactRef>,
    #[serde(default)]
    pub paid_by: Option<UserRef>,
    #[serde(default)]
    pub split_between: Vec<UserRef>,
    #[serde(default)]
    pub bank_account: Option<BankAccountRef>,
    #[serde(default, alias = "group")]
    pub group_id: Option<String>,
}

impl Transaction {
    /// Relational context derived from the flags.
    ///
    /// The flags are meant to be exclusive; when they disagree, contact wins
    /// over group, and group over personal.
    pub fn kind(&self) -> TransactionKind {
        if self.is_contact_transaction {
            TransactionKind::Contact
        } else if self.is_group_transaction {
            TransactionKind::Group
        } else {
            TransactionKind::Personal
        }
    }

    /// Best display label: title, then description, then category
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.description.as_deref().filter(|s| !s.trim().is_empty()))
            .or(self.category.as_deref())
            .unwrap_or("(untitled)")
    }

    pub fn bank_account_id(&self) -> Option<&str> {
        self.bank_account.as_ref().map(|b| b.id())
    }
}

/// Cached profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ========== API Envelopes ==========

/// Pagination block of a transaction page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_transactions: u64,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// `GET /api/transactions` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub success: bool,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate group balances for the viewing user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    /// What the viewer owes other group members
    #[serde(default)]
    pub you_owe: f64,
    /// What other group members owe the viewer
    #[serde(default)]
    pub owed_to_you: f64,
}

/// `GET /api/group-transactions/totals` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotalsResponse {
    pub success: bool,
    #[serde(default)]
    pub totals: GroupTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/bank-accounts` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountsResponse {
    pub success: bool,
    #[serde(default, alias = "accounts")]
    pub bank_accounts: Vec<BankAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Generic `{success, message}` envelope (delete, errors)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiMessage {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
