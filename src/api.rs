// 🌐 HTTP API - JSON endpoints + server-rendered SVG charts
//
// Every request reloads the ledger file; a mutex serialises the writers of
// this process.

use crate::charts::{self, ChartKind};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::editor::merge_save;
use crate::entries::{record_entry, record_payday, EntryForm};
use crate::error::EntryError;
use crate::ledger::{load_ledger, save_ledger, Ledger, Transaction};
use crate::query::{available_years, parse_month, sort_for_display, Filter, Selection};
use anyhow::anyhow;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, ApiError> {
        self.write_lock
            .lock()
            .map_err(|_| ApiError::internal(anyhow!("ledger lock poisoned")))
    }

    fn load(&self) -> Result<Ledger, ApiError> {
        load_ledger(&self.config.data_file).map_err(ApiError::from)
    }
}

/// API Response wrapper
#[derive(Serialize)]
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

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{:#}", err),
        }
    }

    fn saving(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Error saving: {:#}", err),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<EntryError>().is_some() {
            Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            }
        } else {
            Self::internal(err)
        }
    }
}

impl From<EntryError> for ApiError {
    fn from(err: EntryError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{}", self.message);
        } else {
            log::warn!("Rejected request: {}", self.message);
        }
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// `Json` body whose rejections come back in the `ApiResponse` envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub year: Option<i32>,
    /// Month name or number; "All" or empty = every month
    pub month: Option<String>,
    pub q: Option<String>,
}

impl FilterParams {
    fn to_filter(&self, ledger: &Ledger) -> Result<Filter, EntryError> {
        let mut filter = Filter::default_for(ledger, Local::now().date_naive());
        if let Some(year) = self.year {
            filter.year = year;
        }

        let month = match self.month.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(m) if m.eq_ignore_ascii_case("all") => None,
            Some(m) => Some(parse_month(m)?),
        };

        Ok(filter
            .with_month(month)
            .with_text(self.q.as_deref().unwrap_or("")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    pub year: Option<i32>,
    pub month: Option<String>,
}

impl SelectionParams {
    fn to_selection(&self, ledger: &Ledger) -> Result<Selection, EntryError> {
        let mut selection = Selection::today(ledger);
        if let Some(year) = self.year {
            selection.year = year;
        }
        if let Some(month) = self.month.as_deref().filter(|m| !m.trim().is_empty()) {
            selection.month = parse_month(month)?;
        }
        Ok(selection)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/years - Years with data, ascending
async fn get_years(State(state): State<AppState>) -> ApiResult<Vec<i32>> {
    let ledger = state.load()?;
    Ok(Json(ApiResponse::ok(available_years(&ledger))))
}

#[derive(Serialize)]
pub struct StatementResponse {
    pub filter: Filter,
    pub month_options: Vec<Option<u32>>,
    pub count: usize,
    pub caption: String,
    pub rows: Vec<Transaction>,
}

/// GET /api/transactions - Filtered statement, newest first
async fn get_transactions(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<StatementResponse> {
    let ledger = state.load()?;
    let filter = params.to_filter(&ledger)?;

    let mut rows: Vec<Transaction> = filter
        .apply(&ledger)
        .into_iter()
        .map(|(_, tx)| tx.clone())
        .collect();
    sort_for_display(&mut rows);

    Ok(Json(ApiResponse::ok(StatementResponse {
        month_options: filter.month_options(&ledger),
        count: rows.len(),
        caption: format!("Showing {} records.", rows.len()),
        filter,
        rows,
    })))
}

/// POST /api/transactions - Manual entry form
async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<EntryForm>,
) -> Result<(StatusCode, Json<ApiResponse<usize>>), ApiError> {
    let _guard = state.lock()?;
    let ledger = record_entry(&state.config.data_file, &form)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ledger.len()))))
}

/// POST /api/payday - Salary + meal voucher dated today
async fn create_payday(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<usize>>), ApiError> {
    let _guard = state.lock()?;
    let today = Local::now().date_naive();
    let ledger = record_payday(&state.config.data_file, today, &state.config)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ledger.len()))))
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub filter: Filter,
    pub rows: Vec<Transaction>,
}

/// PUT /api/transactions - Replace the filtered rows with the edited grid
async fn merge_transactions(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MergeRequest>,
) -> ApiResult<usize> {
    let _guard = state.lock()?;
    let path = &state.config.data_file;

    let ledger = load_ledger(path).map_err(ApiError::saving)?;
    let merged = merge_save(&ledger, &request.filter, request.rows);
    save_ledger(path, &merged).map_err(ApiError::saving)?;

    Ok(Json(ApiResponse::ok(merged.len())))
}

/// GET /api/dashboard - KPIs, donut slices and monthly series
async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Dashboard> {
    let ledger = state.load()?;
    let selection = params.to_selection(&ledger)?;
    Ok(Json(ApiResponse::ok(Dashboard::build(
        &ledger,
        selection,
        &state.config,
    ))))
}

/// GET /charts/:name - donut.svg, monthly.svg, balance.svg
async fn get_chart(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<SelectionParams>,
) -> Result<Response, ApiError> {
    let kind = ChartKind::from_file_name(&name).ok_or_else(|| ApiError {
        status: StatusCode::NOT_FOUND,
        message: format!("no chart named {:?}", name),
    })?;

    let ledger = state.load()?;
    let selection = params.to_selection(&ledger)?;
    let dash = Dashboard::build(&ledger, selection, &state.config);
    let document = charts::render(kind, &dash, &state.config);

    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        document.to_string(),
    )
        .into_response())
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/years", get(get_years))
        .route(
            "/transactions",
            get(get_transactions)
                .post(create_transaction)
                .put(merge_transactions),
        )
        .route("/payday", post(create_payday))
        .route("/dashboard", get(get_dashboard))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/charts/:name", get(get_chart))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{temp_ledger_path, tx};
    use crate::ledger::{Category, TransactionType};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state_with(rows: Vec<Transaction>, tag: &str) -> AppState {
        let path = temp_ledger_path(tag);
        if !rows.is_empty() {
            save_ledger(&path, &Ledger::new(rows)).unwrap();
        }
        AppState::new(Config {
            data_file: path,
            ..Config::default()
        })
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("2024-01-05", Category::Salary, "Monthly Salary", 3800.0, TransactionType::Income),
            tx("2024-01-09", Category::Transport, "Uber", 25.0, TransactionType::Expense),
            tx("2024-02-02", Category::Food, "Market", 300.0, TransactionType::Expense),
        ]
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = state_with(vec![], "api-health");
        let (status, body) = send(&state, get_req("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_filtered_statement() {
        let state = state_with(sample(), "api-statement");
        let (status, body) = send(&state, get_req("/api/transactions?year=2024&month=January&q=uber")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["caption"], "Showing 1 records.");
        assert_eq!(body["data"]["rows"][0]["Description"], "Uber");
        assert_eq!(body["data"]["rows"][0]["Date"], "2024-01-09");

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_bad_month_is_bad_request() {
        let state = state_with(sample(), "api-badmonth");
        let (status, body) = send(&state, get_req("/api/transactions?month=Smarch")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_entry_form_and_payday() {
        let state = state_with(vec![], "api-entries");

        let form = json!({
            "date": "2024-03-10",
            "kind": "expense",
            "amount": 42.0,
            "category": "Food",
            "description": "Pizza"
        });
        let (status, body) = send(&state, json_req("POST", "/api/transactions", form)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"], 1);

        let (status, body) = send(&state, json_req("POST", "/api/payday", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"], 3);

        let too_small = json!({
            "date": "2024-03-10",
            "kind": "extra_income",
            "amount": 0.0,
            "category": "Other"
        });
        let (status, _) = send(&state, json_req("POST", "/api/transactions", too_small)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_merge_save_endpoint() {
        let state = state_with(sample(), "api-merge");

        let request = json!({
            "filter": { "year": 2024, "month": 1 },
            "rows": [
                { "Date": "2024-01-05", "Category": "Salary", "Description": "Monthly Salary", "Amount": 4000.0, "Type": "Income" }
            ]
        });
        let (status, body) = send(&state, json_req("PUT", "/api/transactions", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 2);

        let ledger = load_ledger(&state.config.data_file).unwrap();
        assert!(ledger.iter().any(|t| t.amount == 4000.0));
        assert!(ledger.iter().any(|t| t.description == "Market"));
        assert!(!ledger.iter().any(|t| t.description == "Uber"));

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_statement_rows_round_trip_through_merge() {
        let state = state_with(sample(), "api-roundtrip");

        let (_, body) = send(&state, get_req("/api/transactions?year=2024&month=January")).await;
        let data = &body["data"];
        assert_eq!(data["rows"][0]["Amount"], "25.00");
        assert_eq!(data["rows"][0]["Date"], "2024-01-09");
        assert_eq!(data["rows"][1]["Date"], "2024-01-05");

        let request = json!({ "filter": data["filter"], "rows": data["rows"] });
        let (status, body) = send(&state, json_req("PUT", "/api/transactions", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 3);

        let ledger = load_ledger(&state.config.data_file).unwrap();
        assert!(ledger.iter().any(|t| t.description == "Uber" && t.amount == 25.0));

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_index_page_keeps_statement_order() {
        let state = state_with(vec![], "api-index");
        let response = router(state).oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        // Loaded rows are appended in server order; only "Add row" prepends
        assert!(page.contains("addRow(row, false)"));
        assert!(page.contains("if (atTop) grid.prepend(tr); else grid.append(tr);"));
    }

    #[tokio::test]
    async fn test_bad_body_gets_json_error() {
        let state = state_with(sample(), "api-badbody");

        let request = json!({
            "filter": { "year": 2024 },
            "rows": [
                { "Date": "2024-01-05", "Category": "Salary", "Amount": "plenty", "Type": "Income" }
            ]
        });
        let (status, body) = send(&state, json_req("PUT", "/api/transactions", request)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Amount"));
        assert_eq!(load_ledger(&state.config.data_file).unwrap().len(), 3);

        let _ = std::fs::remove_file(&state.config.data_file);
    }

    #[tokio::test]
    async fn test_dashboard_and_chart() {
        let state = state_with(sample(), "api-dashboard");

        let (status, body) = send(&state, get_req("/api/dashboard?year=2024&month=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kpis"][0]["formatted"], "R$ 3,800.00");
        assert_eq!(body["data"]["monthly"][1]["cumulative"], 3475.0);

        let response = router(state.clone())
            .oneshot(get_req("/charts/donut.svg?year=2024&month=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");

        let (status, _) = send(&state, get_req("/charts/pie.svg")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let _ = std::fs::remove_file(&state.config.data_file);
    }
}
