//! Backend commands queued from UI to backend worker.

use shared::{domain::OperationId, protocol::QueryRequest};

use crate::controller::session::SelectedFile;

pub enum BackendCommand {
    Ingest {
        id: OperationId,
        files: Vec<SelectedFile>,
    },
    Query {
        id: OperationId,
        request: QueryRequest,
    },
}

impl BackendCommand {
    pub fn id(&self) -> OperationId {
        match self {
            BackendCommand::Ingest { id, .. } | BackendCommand::Query { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Ingest { .. } => "ingest",
            BackendCommand::Query { .. } => "query",
        }
    }
}
