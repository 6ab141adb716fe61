//! Transient per-window session state owned by the controller.

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use shared::{
    domain::{OperationId, QueryMode},
    protocol::{Citation, QueryRequest},
};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub filename: String,
    pub media_type: String,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_path(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let media_type = guess_media_type(&filename);
        Self {
            filename,
            media_type,
            source: FileSource::Path(path),
        }
    }

    /// Builds a selection entry from a window drop payload. The declared type wins; the
    /// filename is only consulted when the platform did not declare one.
    pub fn dropped(
        name: &str,
        declared_mime: &str,
        path: Option<PathBuf>,
        bytes: Option<Arc<[u8]>>,
    ) -> Option<Self> {
        let filename = if name.is_empty() {
            path.as_ref()?.file_name()?.to_str()?.to_string()
        } else {
            name.to_string()
        };
        let media_type = if declared_mime.trim().is_empty() {
            guess_media_type(&filename)
        } else {
            declared_mime.trim().to_string()
        };
        let source = match (bytes, path) {
            (Some(bytes), _) => FileSource::Memory(bytes),
            (None, Some(path)) => FileSource::Path(path),
            (None, None) => return None,
        };
        Some(Self {
            filename,
            media_type,
            source,
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .map(str::trim)
            .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE))
    }
}

fn guess_media_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    pub top_k: u32,
    pub semantic: bool,
    pub use_rrf: bool,
    pub evidence_threshold: f64,
    pub evidence_top_k: u32,
    pub temperature: f64,
    pub mode: QueryMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 12,
            semantic: true,
            use_rrf: false,
            evidence_threshold: 0.28,
            evidence_top_k: 4,
            temperature: 0.1,
            mode: QueryMode::Auto,
        }
    }
}

impl RetrievalConfig {
    pub fn to_request(&self, query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            mode: self.mode,
            top_k: self.top_k,
            semantic: self.semantic,
            use_rrf: self.use_rrf,
            evidence_threshold: self.evidence_threshold,
            evidence_topk: self.evidence_top_k,
            temperature: self.temperature,
        }
    }
}

/// Single-slot guard over every network operation of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightState {
    #[default]
    Idle,
    IngestInFlight {
        id: OperationId,
        /// Number of files handed to the worker; the selection may change meanwhile.
        files: usize,
    },
    QueryInFlight {
        id: OperationId,
    },
}

impl FlightState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, FlightState::Idle)
    }

    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            FlightState::Idle => None,
            FlightState::IngestInFlight { id, .. } | FlightState::QueryInFlight { id } => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Server answer, or the server's logical error text when no answer was given.
    pub answer: String,
    pub citations: Vec<Citation>,
    pub meta: Map<String, Value>,
    pub reason: Option<String>,
    pub received_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Confirmation,
    Failure,
}

/// Blocking user notification. Lives beside the session state, never inside the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn confirmation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Confirmation,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selected_files: Vec<SelectedFile>,
    pub query_text: String,
    pub retrieval: RetrievalConfig,
    pub flight: FlightState,
    pub last_result: Option<QueryResult>,
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    pub fn can_ingest(&self) -> bool {
        !self.is_busy() && !self.selected_files.is_empty()
    }

    pub fn can_query(&self) -> bool {
        !self.is_busy() && !self.query_text.trim().is_empty()
    }

    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.query_text = text.into();
    }

    pub fn set_selected_files(&mut self, files: Vec<SelectedFile>) {
        self.selected_files = files;
    }

    pub fn set_top_k_text(&mut self, text: &str) {
        self.retrieval.top_k = parse_count_or_one(text);
    }

    pub fn set_evidence_top_k_text(&mut self, text: &str) {
        self.retrieval.evidence_top_k = parse_count_or_one(text);
    }

    pub fn set_evidence_threshold_text(&mut self, text: &str) {
        self.retrieval.evidence_threshold = parse_float_or_zero(text).clamp(0.0, 1.0);
    }

    pub fn set_temperature_text(&mut self, text: &str) {
        self.retrieval.temperature = parse_float_or_zero(text).max(0.0);
    }

    pub fn set_semantic(&mut self, semantic: bool) {
        self.retrieval.semantic = semantic;
    }

    pub fn set_use_rrf(&mut self, use_rrf: bool) {
        self.retrieval.use_rrf = use_rrf;
    }

    pub fn set_mode(&mut self, mode: QueryMode) {
        self.retrieval.mode = mode;
    }
}

/// Reads the leading integer of `text`; anything unusable or below one becomes `1`.
pub fn parse_count_or_one(text: &str) -> u32 {
    leading_number(text, false)
        .parse::<i64>()
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value >= 1)
        .unwrap_or(1)
}

/// Reads the leading decimal of `text`; anything unusable or non-finite becomes `0`.
pub fn parse_float_or_zero(text: &str) -> f64 {
    leading_number(text, true)
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn leading_number(text: &str, allow_fraction: bool) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        end
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if allow_fraction {
        if bytes.get(end) == Some(&b'.') {
            let frac_end = digits_from(end + 1);
            if has_digits || frac_end > end + 1 {
                has_digits = true;
                end = frac_end;
            }
        }
        if has_digits && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_start = end + 1;
            if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
                exp_start += 1;
            }
            let exp_end = digits_from(exp_start);
            if exp_end > exp_start {
                end = exp_end;
            }
        }
    }

    if has_digits {
        &text[..end]
    } else {
        ""
    }
}
