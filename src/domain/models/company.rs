use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PartyRef;

/// A business customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub id_user: Option<i64>,
    pub dni: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company fields accepted on create and update. Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyInput {
    #[serde(default)]
    pub id_user: Option<i64>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A company together with the clients linked to it.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyWithClients {
    #[serde(flatten)]
    pub company: Company,
    pub clients: Vec<PartyRef>,
}
