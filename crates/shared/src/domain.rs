use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(DocumentId);

/// Correlates one submitted ingest or query with its completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Auto,
    Qa,
    List,
    Table,
}

impl QueryMode {
    pub const ALL: [QueryMode; 4] = [
        QueryMode::Auto,
        QueryMode::Qa,
        QueryMode::List,
        QueryMode::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QueryMode::Auto => "auto",
            QueryMode::Qa => "qa",
            QueryMode::List => "list",
            QueryMode::Table => "table",
        }
    }
}
