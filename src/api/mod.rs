mod inputs;

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::core::{
    Affordability, Baseline, Comparison, GoalProgress, HouseholdIncome, PortfolioSummary,
    Preferences, PropertyDraft, RankedSimulation, RankingError, SimulationInput, SimulationResult,
    affordability, compare, compute_results, goal_progress, household_income, rank,
};
use crate::store::{PortfolioStore, StoreError, UserId};

pub use inputs::{
    CliPropertyType, InputError, PreferencesPayload, SimulateRequest, SimulatePayload,
    SimulationArgs, build_baseline, build_input, default_simulation_args, request_from_payload,
    require_name, validate_preferences, validate_property,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Header carrying the identity issued by the external auth provider.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to open record store: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP server failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or blank X-User-Id header")]
    Unauthenticated,

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] JsonRejection),

    #[error("invalid query string: {0}")]
    Query(#[from] QueryRejection),

    #[error("invalid path: {0}")]
    Path(#[from] PathRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::Ranking(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::PropertyNotFound(_) | StoreError::SimulationNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
            ApiError::Path(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {self}");
            return error_response(status, "internal storage error");
        }
        log::warn!("rejected request ({status}): {self}");
        error_response(status, &self.to_string())
    }
}

/// One evaluated scenario: what was entered, what it was stacked on, and
/// what came out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub input: SimulationInput,
    pub baseline: Baseline,
    pub results: SimulationResult,
    pub affordability: Affordability,
}

pub fn simulation_report(input: SimulationInput, baseline: Baseline) -> SimulationReport {
    let results = compute_results(&input, baseline);
    let affordability = affordability(input.down_payment, baseline.net_worth);
    SimulationReport {
        input,
        baseline,
        results,
        affordability,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioResponse {
    summary: PortfolioSummary,
    baseline: Baseline,
    rental_goal: f64,
    goal_progress: Option<GoalProgress>,
}

#[derive(Debug, Serialize)]
struct RankingResponse {
    ranking: Vec<RankedSimulation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesResponse {
    rental_goal: f64,
    monthly_salaries: Vec<f64>,
    household_income: HouseholdIncome,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HouseholdQuery {
    include_rental: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(store: Arc<PortfolioStore>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/portfolio", get(portfolio_handler))
        .route(
            "/api/properties",
            get(list_properties_handler).post(create_property_handler),
        )
        .route(
            "/api/properties/:id",
            put(update_property_handler).delete(delete_property_handler),
        )
        .route(
            "/api/simulations",
            get(list_simulations_handler).post(save_simulation_handler),
        )
        .route("/api/simulations/ranking", get(ranking_handler))
        .route("/api/simulations/compare", get(compare_handler))
        .route("/api/simulations/:id", delete(delete_simulation_handler))
        .route(
            "/api/preferences",
            get(get_preferences_handler).put(put_preferences_handler),
        )
        .fallback(not_found_handler)
        .with_state(store)
}

pub async fn run_http_server(config: ServerConfig) -> Result<(), ServeError> {
    let store = match &config.data_file {
        Some(path) => PortfolioStore::open(path).await?,
        None => {
            log::warn!("no --data-file given, records are kept in memory only");
            PortfolioStore::in_memory()
        }
    };

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    log::info!("Heritage HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, router(Arc::new(store))).await?;
    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    query: Result<Query<SimulatePayload>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(payload) = query?;
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(
    body: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = body?;
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Result<Response, ApiError> {
    let SimulateRequest { input, baseline } = request_from_payload(payload)?;
    let report = simulation_report(input, baseline.unwrap_or_default());
    Ok(json_response(StatusCode::OK, report))
}

async fn portfolio_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let summary = store.summary(&user).await;
    let preferences = store.preferences(&user).await;

    let response = PortfolioResponse {
        summary,
        baseline: summary.baseline(),
        rental_goal: preferences.rental_goal,
        goal_progress: goal_progress(summary.total_cashflow, preferences.rental_goal),
    };
    Ok(json_response(StatusCode::OK, response))
}

async fn list_properties_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    Ok(json_response(
        StatusCode::OK,
        store.list_properties(&user).await,
    ))
}

async fn create_property_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    body: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Json(draft) = body?;
    let property = store.add_property(&user, validate_property(draft)?).await?;
    Ok(json_response(StatusCode::CREATED, property))
}

async fn update_property_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Path(id) = id?;
    let Json(draft) = body?;
    let property = store
        .update_property(&user, id, validate_property(draft)?)
        .await?;
    Ok(json_response(StatusCode::OK, property))
}

async fn delete_property_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Path(id) = id?;
    store.delete_property(&user, id).await?;
    Ok(with_cache_control(StatusCode::NO_CONTENT))
}

async fn list_simulations_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    Ok(json_response(
        StatusCode::OK,
        store.list_simulations(&user).await,
    ))
}

/// Results are recomputed here against the user's current portfolio rather
/// than taken from the client.
async fn save_simulation_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    body: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Json(payload) = body?;
    let SimulateRequest { input, .. } = request_from_payload(payload)?;
    require_name(&input)?;

    let saved = store.save_simulation(&user, input).await?;
    Ok(json_response(StatusCode::CREATED, saved))
}

async fn delete_simulation_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Path(id) = id?;
    store.delete_simulation(&user, id).await?;
    Ok(with_cache_control(StatusCode::NO_CONTENT))
}

async fn ranking_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let ranking = rank(store.list_simulations(&user).await);
    Ok(json_response(StatusCode::OK, RankingResponse { ranking }))
}

async fn compare_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let comparison: Comparison = compare(store.list_simulations(&user).await)?;
    Ok(json_response(StatusCode::OK, comparison))
}

async fn get_preferences_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    query: Result<Query<HouseholdQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Query(query) = query?;
    let preferences = store.preferences(&user).await;
    let response = preferences_response(
        &store,
        &user,
        preferences,
        query.include_rental.unwrap_or(false),
    )
    .await;
    Ok(json_response(StatusCode::OK, response))
}

async fn put_preferences_handler(
    State(store): State<Arc<PortfolioStore>>,
    headers: HeaderMap,
    query: Result<Query<HouseholdQuery>, QueryRejection>,
    body: Result<Json<PreferencesPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = require_user(&headers)?;
    let Query(query) = query?;
    let Json(payload) = body?;
    validate_preferences(&payload)?;

    let preferences = store
        .update_preferences(&user, payload.rental_goal, payload.monthly_salaries)
        .await?;
    let response = preferences_response(
        &store,
        &user,
        preferences,
        query.include_rental.unwrap_or(false),
    )
    .await;
    Ok(json_response(StatusCode::OK, response))
}

async fn preferences_response(
    store: &PortfolioStore,
    user: &UserId,
    preferences: Preferences,
    include_rental: bool,
) -> PreferencesResponse {
    let properties = store.list_properties(user).await;
    let household_income =
        household_income(&preferences.monthly_salaries, &properties, include_rental);
    PreferencesResponse {
        rental_goal: preferences.rental_goal,
        monthly_salaries: preferences.monthly_salaries,
        household_income,
    }
}

fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(UserId::parse)
        .ok_or(ApiError::Unauthenticated)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
