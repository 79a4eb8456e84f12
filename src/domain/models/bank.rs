use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Savings,
    Checking,
    Business,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "SAVINGS",
            Self::Checking => "CHECKING",
            Self::Business => "BUSINESS",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SAVINGS" => Some(Self::Savings),
            "CHECKING" => Some(Self::Checking),
            "BUSINESS" => Some(Self::Business),
            _ => None,
        }
    }
}

/// A bank account that can receive transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub account_type: Option<AccountType>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub state: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub state: Option<bool>,
}

impl BankInput {
    /// Trim the name and reject blank ones. `required` demands a name be present.
    pub fn normalize(mut self, required: bool) -> DomainResult<Self> {
        match self.name.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::validation("bank name is required")),
            Some(name) => self.name = Some(name.to_string()),
            None if required => return Err(DomainError::validation("bank name is required")),
            None => {}
        }
        Ok(self)
    }
}
