use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PartyRef;

/// An individual customer, optionally linked to companies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub id_user: Option<i64>,
    pub dni: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client fields accepted on create and update.
///
/// On update, absent fields are left untouched and a present `company_ids`
/// replaces the whole link set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    #[serde(default)]
    pub id_user: Option<i64>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_ids: Option<Vec<i64>>,
}

/// A client row in list results.
#[derive(Debug, Clone, Serialize)]
pub struct ClientWithCompanies {
    #[serde(flatten)]
    pub client: Client,
    pub companies: Vec<PartyRef>,
}

/// A single client with the ids of its linked companies.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub company_ids: Vec<i64>,
}
