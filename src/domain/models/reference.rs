use serde::{Deserialize, Serialize};

/// Minimal `{id, name}` projection used by directories and dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NamedRef {
    pub id: i64,
    pub name: Option<String>,
}

/// `{id, name, dni}` projection of a client or company linked to another party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PartyRef {
    pub id: i64,
    pub name: Option<String>,
    pub dni: Option<String>,
}
