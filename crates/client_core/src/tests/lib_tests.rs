use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Multipart, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{DocumentId, QueryMode};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Debug, Clone, PartialEq)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct CaptureState<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<T>>>>,
    hits: Arc<AtomicUsize>,
}

impl<T> CaptureState<T> {
    fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
                hits: Arc::new(AtomicUsize::new(0)),
            },
            rx,
        )
    }

    async fn capture(&self, value: T) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.tx.lock().await.take() {
            let _ = tx.send(value);
        }
    }
}

async fn serve(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn handle_ingest(
    State(state): State<CaptureState<Vec<ReceivedPart>>>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes").to_vec();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    let ingested: Vec<String> = parts
        .iter()
        .filter_map(|part| part.file_name.clone())
        .collect();
    let chunks = parts.len() * 5;
    state.capture(parts).await;
    Json(json!({ "ingested": ingested, "chunks": chunks, "warnings": ["b.pdf: no text layer"] }))
}

async fn handle_query_capture(
    State(state): State<CaptureState<(HeaderMap, Value)>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.capture((headers, body)).await;
    Json(json!({
        "answer": "30 days",
        "citations": [{ "doc_id": "d1", "pages": "3-4", "heading": "Refunds", "score": 0.91 }],
        "meta": { "retrieval": "hybrid", "latency_ms": 42 }
    }))
}

fn upload(name: &str, media_type: &str, bytes: &[u8]) -> FileUpload {
    FileUpload {
        filename: name.to_string(),
        media_type: media_type.to_string(),
        bytes: bytes.to_vec(),
    }
}

fn refund_request() -> QueryRequest {
    QueryRequest {
        query: "What is the refund policy?".to_string(),
        mode: QueryMode::Qa,
        top_k: 12,
        semantic: true,
        use_rrf: false,
        evidence_threshold: 0.28,
        evidence_topk: 4,
        temperature: 0.1,
    }
}

#[tokio::test]
async fn ingest_sends_one_files_part_per_upload_in_order() {
    let (state, parts_rx) = CaptureState::new();
    let hits = state.hits.clone();
    let base = serve(
        Router::new()
            .route("/ingest", post(handle_ingest))
            .with_state(state),
    )
    .await;
    let client = TransferClient::new(&base).expect("client");

    let response = client
        .ingest(vec![
            upload("a.pdf", "application/pdf", b"%PDF-a"),
            upload("b.pdf", "application/pdf", b"%PDF-b"),
            upload("notes.txt", "text/plain", b"plain"),
        ])
        .await
        .expect("ingest");

    let parts = parts_rx.await.expect("parts");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(parts.len(), 3);
    assert!(parts.iter().all(|part| part.name == "files"));
    assert_eq!(
        parts
            .iter()
            .map(|part| part.file_name.as_deref().unwrap_or_default())
            .collect::<Vec<_>>(),
        vec!["a.pdf", "b.pdf", "notes.txt"]
    );
    assert_eq!(parts[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(parts[2].content_type.as_deref(), Some("text/plain"));
    assert_eq!(parts[1].bytes, b"%PDF-b".to_vec());

    assert_eq!(
        response.ingested,
        vec![
            DocumentId("a.pdf".to_string()),
            DocumentId("b.pdf".to_string()),
            DocumentId("notes.txt".to_string()),
        ]
    );
    assert_eq!(response.chunks, 15);
    assert_eq!(response.warnings, vec!["b.pdf: no text layer".to_string()]);
}

#[tokio::test]
async fn ingest_accepts_empty_file_list() {
    let (state, headers_rx) = CaptureState::<String>::new();
    let app = Router::new()
        .route(
            "/ingest",
            post(
                |State(state): State<CaptureState<String>>, headers: HeaderMap| async move {
                    let content_type = headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    state.capture(content_type).await;
                    Json(json!({ "ingested": [], "chunks": 0 }))
                },
            ),
        )
        .with_state(state);
    let base = serve(app).await;
    let client = TransferClient::new(&base).expect("client");

    let response = client.ingest(Vec::new()).await.expect("empty ingest");

    let content_type = headers_rx.await.expect("content type");
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(response.ingested.is_empty());
    assert_eq!(response.chunks, 0);
}

#[tokio::test]
async fn ingest_failure_surfaces_raw_body_text() {
    let raw = r#"{"detail":"Only PDF files are supported"}"#;
    let app = Router::new().route(
        "/ingest",
        post(move || async move { (StatusCode::UNPROCESSABLE_ENTITY, raw) }),
    );
    let base = serve(app).await;
    let client = TransferClient::new(&base).expect("client");

    let err = client
        .ingest(vec![upload("a.pdf", "application/pdf", b"%PDF")])
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), raw);
}

#[tokio::test]
async fn query_posts_json_with_exact_wire_keys() {
    let (state, captured_rx) = CaptureState::new();
    let base = serve(
        Router::new()
            .route("/query", post(handle_query_capture))
            .with_state(state),
    )
    .await;
    let client = TransferClient::new(&format!("{base}/")).expect("client");

    let response = client.query(&refund_request()).await.expect("query");

    let (headers, body) = captured_rx.await.expect("captured");
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("application/json"));

    let mut keys: Vec<&str> = body
        .as_object()
        .expect("object body")
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "evidence_threshold",
            "evidence_topk",
            "mode",
            "query",
            "semantic",
            "temperature",
            "top_k",
            "use_rrf",
        ]
    );
    assert_eq!(body["query"], "What is the refund policy?");
    assert_eq!(body["mode"], "qa");
    assert_eq!(body["top_k"], 12);
    assert_eq!(body["evidence_threshold"], 0.28);

    assert_eq!(response.answer.as_deref(), Some("30 days"));
    let citations = response.citations.expect("citations");
    assert_eq!(citations.len(), 1);
    assert_eq!(citations[0].doc_id, "d1");
    assert_eq!(citations[0].score, Some(0.91));
    assert_eq!(response.meta.expect("meta")["latency_ms"], 42);
}

#[tokio::test]
async fn query_logical_error_is_not_a_transfer_failure() {
    let app = Router::new().route(
        "/query",
        post(|| async {
            Json(json!({ "error": "insufficient evidence", "reason": "gate" }))
        }),
    );
    let base = serve(app).await;
    let client = TransferClient::new(&base).expect("client");

    let response = client.query(&refund_request()).await.expect("logical error is ok");
    assert_eq!(response.answer, None);
    assert_eq!(response.error.as_deref(), Some("insufficient evidence"));
    assert_eq!(response.reason.as_deref(), Some("gate"));
}

#[tokio::test]
async fn query_server_error_message_is_verbatim() {
    let app = Router::new().route(
        "/query",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "index not ready") }),
    );
    let base = serve(app).await;
    let client = TransferClient::new(&base).expect("client");

    let err = client.query(&refund_request()).await.expect_err("must fail");
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_transport());
    assert_eq!(err.to_string(), "index not ready");
}

#[tokio::test]
async fn query_unreachable_backend_is_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = TransferClient::new(&format!("http://{addr}")).expect("client");

    let err = client.query(&refund_request()).await.expect_err("must fail");
    assert!(err.is_transport());
    let TransferError::Request(inner) = &err else {
        panic!("expected request error");
    };
    let message = err.to_string();
    assert!(message.starts_with(&inner.to_string()));
    assert!(
        message.len() > inner.to_string().len(),
        "cause missing from {message:?}"
    );
}

#[tokio::test]
async fn query_undecodable_success_body_is_decode_error() {
    let app = Router::new().route("/query", post(|| async { "not json" }));
    let base = serve(app).await;
    let client = TransferClient::new(&base).expect("client");

    let err = client.query(&refund_request()).await.expect_err("must fail");
    assert!(matches!(err, TransferError::Decode { .. }));
}

#[test]
fn rejects_invalid_base_url() {
    let err = TransferClient::new("localhost:8000/api")
        .err()
        .expect("must fail");
    assert!(matches!(err, TransferError::InvalidBaseUrl { .. }));
}
