// 🌐 REST API over the session ledger (feature "server")
// One ledger per server process, shared behind a mutex.

use crate::ai::{extract_from_text, fallback_tips, get_financial_advice, summarize_recent, GenerativeModel};
use crate::config::DisplayConfig;
use crate::import::{apply_records, Importer};
use crate::ledger::{Ledger, NewTransaction, Transaction, TransactionType};
use crate::report::DashboardSummary;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<Ledger>>,
    model: Option<Arc<dyn GenerativeModel>>,
    currency_symbol: String,
    recent_count: usize,
}

impl AppState {
    pub fn new(
        ledger: Ledger,
        model: Option<Arc<dyn GenerativeModel>>,
        display: &DisplayConfig,
    ) -> Self {
        AppState {
            ledger: Arc::new(Mutex::new(ledger)),
            model,
            currency_symbol: display.currency_symbol.clone(),
            recent_count: display.recent_count,
        }
    }

    /// Lock the ledger. Ledger mutations can't leave it half-written, so a
    /// poisoned lock is still usable.
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct ImportTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub id: String,
    pub removed: bool,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/transactions - All transactions, newest first
async fn list_transactions(State(state): State<AppState>) -> impl IntoResponse {
    let transactions = state.ledger().transactions().to_vec();
    Json(ApiResponse::ok(transactions))
}

/// POST /api/transactions - Manual entry
async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<NewTransaction>,
) -> impl IntoResponse {
    let tx = state.ledger().add_transaction(input);
    (StatusCode::CREATED, Json(ApiResponse::ok(tx)))
}

/// DELETE /api/transactions/:id - Unknown ids are not an error
async fn remove_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let removed = state.ledger().remove_transaction(&id);
    Json(ApiResponse::ok(RemoveResponse { id, removed }))
}

/// GET /api/filters/:type - Filter transactions by type ("all" for everything)
async fn filter_transactions(
    State(state): State<AppState>,
    Path(filter_type): Path<String>,
) -> impl IntoResponse {
    let ledger = state.ledger();

    if filter_type.eq_ignore_ascii_case("all") {
        return (StatusCode::OK, Json(ApiResponse::ok(ledger.transactions().to_vec())));
    }

    match filter_type.parse::<TransactionType>() {
        Ok(kind) => {
            let filtered: Vec<Transaction> =
                ledger.filter_by_type(kind).into_iter().cloned().collect();
            (StatusCode::OK, Json(ApiResponse::ok(filtered)))
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    }
}

/// GET /api/summary - Totals, recent list, expense breakdown
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let summary =
        DashboardSummary::from_ledger(&state.ledger(), &state.currency_symbol, state.recent_count);
    Json(ApiResponse::ok(summary))
}

/// POST /api/savings/transfer - Move liquid balance into savings
async fn transfer_to_savings(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> impl IntoResponse {
    let result = state.ledger().try_transfer_to_savings(request.amount);

    match result {
        Ok(tx) => (StatusCode::OK, Json(ApiResponse::ok(tx))),
        Err(e) => {
            info!("Savings transfer refused: {}", e);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::err(e.to_string())))
        }
    }
}

/// POST /api/import/text - Pasted statement text → AI extraction → ledger
async fn import_text(
    State(state): State<AppState>,
    Json(request): Json<ImportTextRequest>,
) -> impl IntoResponse {
    let Some(model) = state.model.clone() else {
        warn!("Text import requested but no AI model is configured");
        return Json(ApiResponse::ok(Vec::<Transaction>::new()));
    };

    // no lock while the model is working
    let records = extract_from_text(model.as_ref(), &request.text).await;
    let added = apply_records(&mut state.ledger(), records);
    info!("Imported {} transaction(s) from text", added.len());

    Json(ApiResponse::ok(added))
}

/// POST /api/import/file - Multipart upload (pdf, image, csv, tsv, xlsx, txt)
async fn import_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let (file_name, bytes) = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::err("no file in upload")));
        }
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    };

    let Some(model) = state.model.clone() else {
        warn!("File import requested but no AI model is configured");
        return (StatusCode::OK, Json(ApiResponse::ok(Vec::<Transaction>::new())));
    };

    let records = Importer::new(model).extract_upload(&file_name, &bytes).await;
    let added = apply_records(&mut state.ledger(), records);
    info!("Imported {} transaction(s) from {}", added.len(), file_name);

    (StatusCode::OK, Json(ApiResponse::ok(added)))
}

/// First multipart field that carries a file name
async fn read_upload(
    multipart: &mut Multipart,
) -> Result<Option<(String, Vec<u8>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some((file_name, bytes.to_vec())));
    }
    Ok(None)
}

/// GET /api/advice - Tips for the newest transactions
async fn get_advice(State(state): State<AppState>) -> impl IntoResponse {
    let summary = {
        let ledger = state.ledger();
        if ledger.is_empty() {
            return Json(ApiResponse::ok(Vec::<String>::new()));
        }
        summarize_recent(ledger.transactions())
    };

    let tips = match state.model.clone() {
        Some(model) => get_financial_advice(model.as_ref(), &summary).await,
        None => fallback_tips(),
    };
    Json(ApiResponse::ok(tips))
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/:id", delete(remove_transaction))
        .route("/filters/:type", get(filter_transactions))
        .route("/summary", get(get_summary))
        .route("/savings/transfer", post(transfer_to_savings))
        .route("/import/text", post(import_text))
        .route("/import/file", post(import_file))
        .route("/advice", get(get_advice))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockModel;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state_with(model: Option<Arc<dyn GenerativeModel>>) -> AppState {
        AppState::new(Ledger::new(), model, &DisplayConfig::default())
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        send(router, builder.body(body).unwrap()).await
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(state_with(None));
        let (status, body) = call(&router, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_savings_scenario_over_http() {
        let router = build_router(state_with(None));

        let (status, _) = call(
            &router,
            Method::POST,
            "/api/transactions",
            Some(json!({"date":"2024-01-01","description":"Salary","amount":100,"category":"Salary","type":"INCOME"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, created) = call(
            &router,
            Method::POST,
            "/api/transactions",
            Some(json!({"date":"2024-01-02","description":"Lunch","amount":"£30,00","category":"Food","type":"EXPENSE"})),
        )
        .await;
        assert_eq!(created["data"]["amount"], 30.0);

        let (_, summary) = call(&router, Method::GET, "/api/summary", None).await;
        assert_eq!(summary["data"]["net_balance"], 70.0);
        assert_eq!(summary["data"]["expenses_by_category"][0]["category"], "Food");

        let (status, moved) = call(
            &router,
            Method::POST,
            "/api/savings/transfer",
            Some(json!({"amount": 70})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["data"]["type"], "SAVINGS");

        let (status, refused) = call(
            &router,
            Method::POST,
            "/api/savings/transfer",
            Some(json!({"amount": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(refused["success"], false);
        assert!(refused["error"].as_str().unwrap().contains("insufficient funds"));

        let (_, summary) = call(&router, Method::GET, "/api/summary", None).await;
        assert_eq!(summary["data"]["total_savings"], 70.0);
        assert_eq!(summary["data"]["net_balance"], 0.0);
        assert_eq!(summary["data"]["transaction_count"], 3);
    }

    #[tokio::test]
    async fn test_create_with_null_amount_is_added_as_zero() {
        let router = build_router(state_with(None));

        let (status, created) = call(
            &router,
            Method::POST,
            "/api/transactions",
            Some(json!({"date":"2024-01-03","description":"Refund?","amount":null,"category":"Misc","type":"INCOME"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["amount"], 0.0);

        let (_, all) = call(&router, Method::GET, "/api/transactions", None).await;
        assert_eq!(all["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_filter() {
        let router = build_router(state_with(None));
        let (_, created) = call(
            &router,
            Method::POST,
            "/api/transactions",
            Some(json!({"description":"Bus","amount":2.5,"category":"Transport","type":"EXPENSE"})),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (_, expenses) = call(&router, Method::GET, "/api/filters/expense", None).await;
        assert_eq!(expenses["data"].as_array().unwrap().len(), 1);

        let (status, _) = call(&router, Method::GET, "/api/filters/transfer", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, missing) = call(&router, Method::DELETE, "/api/transactions/nope", None).await;
        assert_eq!(missing["data"]["removed"], false);

        let (_, removed) = call(&router, Method::DELETE, &format!("/api/transactions/{}", id), None).await;
        assert_eq!(removed["data"]["removed"], true);

        let (_, all) = call(&router, Method::GET, "/api/filters/all", None).await;
        assert!(all["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_text_and_advice() {
        let model: Arc<dyn GenerativeModel> = Arc::new(MockModel::new(vec![
            Ok(r#"[{"date":"2024-02-01","description":"Tesco","amount":12.5,"category":"Supermarket","type":"EXPENSE"}]"#.to_string()),
            Ok(r#"["Plan meals ahead"]"#.to_string()),
        ]));
        let router = build_router(state_with(Some(model)));

        let (_, imported) = call(
            &router,
            Method::POST,
            "/api/import/text",
            Some(json!({"text": "01/02 TESCO 12,50 D"})),
        )
        .await;
        assert_eq!(imported["data"].as_array().unwrap().len(), 1);

        let (_, advice) = call(&router, Method::GET, "/api/advice", None).await;
        assert_eq!(advice["data"], json!(["Plan meals ahead"]));
    }

    fn multipart_request(file_name: &str, content: &str) -> Request<Body> {
        let boundary = "finance-dashboard-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
            b = boundary,
            f = file_name,
            c = content
        );
        Request::builder()
            .method(Method::POST)
            .uri("/api/import/file")
            .header("content-type", format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_import_file_upload() {
        let model: Arc<dyn GenerativeModel> = Arc::new(MockModel::replying(
            r#"[{"date":"2024-05-01","description":"Rent","amount":900,"category":"Housing","type":"EXPENSE"}]"#,
        ));
        let router = build_router(state_with(Some(model)));

        let (status, imported) = send(&router, multipart_request("may.csv", "Rent,900")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(imported["data"][0]["description"], "Rent");

        let (_, summary) = call(&router, Method::GET, "/api/summary", None).await;
        assert_eq!(summary["data"]["total_expenses"], 900.0);
    }

    #[tokio::test]
    async fn test_import_file_unsupported_type_adds_nothing() {
        let model: Arc<dyn GenerativeModel> = Arc::new(MockModel::new(vec![]));
        let router = build_router(state_with(Some(model)));

        let (status, imported) = send(&router, multipart_request("archive.zip", "PK")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(imported["data"], json!([]));
    }

    #[tokio::test]
    async fn test_without_model() {
        let router = build_router(state_with(None));

        let (_, advice) = call(&router, Method::GET, "/api/advice", None).await;
        assert_eq!(advice["data"], json!([]));

        let (_, imported) = call(
            &router,
            Method::POST,
            "/api/import/text",
            Some(json!({"text": "anything"})),
        )
        .await;
        assert_eq!(imported["data"], json!([]));

        call(
            &router,
            Method::POST,
            "/api/transactions",
            Some(json!({"description":"Gift","amount":5,"type":"INCOME"})),
        )
        .await;
        let (_, advice) = call(&router, Method::GET, "/api/advice", None).await;
        assert_eq!(advice["data"].as_array().unwrap().len(), 3);
    }
}
