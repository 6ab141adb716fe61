//! State transitions of the session: guarded submits, drop filtering, and result reconciliation.

use shared::domain::OperationId;
use tracing::{info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::session::{
    FlightState, Notice, QueryResult, SelectedFile, SessionState,
};

/// Starts an ingest when files are selected and nothing is in flight.
pub fn begin_ingest(state: &mut SessionState) -> Option<BackendCommand> {
    if !state.can_ingest() {
        return None;
    }
    let id = OperationId::new();
    let files = state.selected_files.clone();
    state.flight = FlightState::IngestInFlight {
        id,
        files: files.len(),
    };
    Some(BackendCommand::Ingest { id, files })
}

/// Starts a query when the text is not blank and nothing is in flight.
pub fn begin_query(state: &mut SessionState) -> Option<BackendCommand> {
    if !state.can_query() {
        return None;
    }
    let id = OperationId::new();
    state.flight = FlightState::QueryInFlight { id };
    Some(BackendCommand::Query {
        id,
        request: state.retrieval.to_request(&state.query_text),
    })
}

/// Replaces the selection with dropped files; `strict` keeps only PDFs. Returns how many were
/// discarded.
pub fn accept_dropped_files(
    state: &mut SessionState,
    files: Vec<SelectedFile>,
    strict: bool,
) -> usize {
    let dropped = files.len();
    let kept: Vec<SelectedFile> = if strict {
        files.into_iter().filter(SelectedFile::is_pdf).collect()
    } else {
        files
    };
    let discarded = dropped - kept.len();
    if discarded > 0 {
        info!(discarded, kept = kept.len(), "drop: ignoring non-PDF files");
    }
    state.set_selected_files(kept);
    discarded
}

/// The command never reached the worker: release the slot and report why.
pub fn abandon_dispatch(state: &mut SessionState, err: &UiError) -> Notice {
    state.flight = FlightState::Idle;
    Notice::failure(err.title(), err.message())
}

pub fn apply_event(state: &mut SessionState, event: UiEvent, status: &mut String) -> Option<Notice> {
    match event {
        UiEvent::Info(message) => {
            *status = message;
            None
        }
        UiEvent::Error(err) => {
            tracing::error!(context = ?err.context(), "{}", err.message());
            *status = err.message().to_string();
            Some(Notice::failure(err.title(), err.message()))
        }
        UiEvent::IngestCompleted { id, response } => {
            finish_flight(state, id);
            let ids: Vec<String> = response.ingested.iter().map(ToString::to_string).collect();
            let mut message = format!("Ingested: {} (chunks={})", ids.join(", "), response.chunks);
            if !response.warnings.is_empty() {
                message.push_str("\n\nWarnings:");
                for warning in &response.warnings {
                    message.push_str("\n- ");
                    message.push_str(warning);
                }
            }
            *status = format!("Ingested {} document(s)", ids.len());
            Some(Notice::confirmation("Ingest complete", message))
        }
        UiEvent::QueryCompleted { id, response } => {
            finish_flight(state, id);
            let citations = response.citations.unwrap_or_default();
            *status = format!("Answer received with {} citation(s)", citations.len());
            state.last_result = Some(QueryResult {
                answer: response.answer.or(response.error).unwrap_or_default(),
                citations,
                meta: response.meta.unwrap_or_default(),
                reason: response.reason,
                received_at: chrono::Local::now(),
            });
            None
        }
        UiEvent::OperationFailed { id, error } => {
            finish_flight(state, id);
            warn!(operation_id = %id, category = ?error.category(), "operation failed");
            *status = error.title().to_string();
            Some(Notice::failure(error.title(), error.message()))
        }
    }
}

fn finish_flight(state: &mut SessionState, id: OperationId) {
    if state.flight.operation_id() != Some(id) {
        warn!(
            operation_id = %id,
            in_flight = ?state.flight,
            "completion does not match the in-flight operation"
        );
    }
    state.flight = FlightState::Idle;
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
