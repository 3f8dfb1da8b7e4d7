use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core::{
    AgeSnapshot, CareerTrack, EducationLevel, LoanPreset, NationalBracket, PlanAdvice, PlanError,
    PlanInputs, PlanSettings, PlannerConfig, Projection, ProjectionMode, SalaryScore,
    TimelineEntry, adjusted_average, advise, monthly_payment, national_bracket, project, score,
    snapshot, timeline, total_repayment,
};
use crate::session::{SessionSnapshot, SessionStore};

pub struct AppState {
    config: PlannerConfig,
    store: SessionStore,
    session_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: PlannerConfig, store: SessionStore) -> Self {
        Self {
            config,
            store,
            session_lock: Mutex::new(()),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProjectionMode {
    Forward,
    #[serde(alias = "required", alias = "requiredEarningCurve", alias = "curve")]
    RequiredEarningCurve,
    #[serde(alias = "requiredFlat", alias = "flat")]
    RequiredFlat,
}

impl From<ApiProjectionMode> for ProjectionMode {
    fn from(value: ApiProjectionMode) -> Self {
        match value {
            ApiProjectionMode::Forward => ProjectionMode::Forward,
            ApiProjectionMode::RequiredEarningCurve => ProjectionMode::RequiredEarningCurve,
            ApiProjectionMode::RequiredFlat => ProjectionMode::RequiredFlat,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    #[serde(flatten)]
    plan: PlanInputs,
    mode: Option<ApiProjectionMode>,
    end_age: Option<u32>,
    target_monthly_surplus: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SnapshotPayload {
    #[serde(flatten)]
    plan: PlanPayload,
    age: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryScoreQuery {
    annual_income: f64,
    age: u32,
    education: Option<EducationLevel>,
    career: Option<CareerTrack>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SessionProjectionQuery {
    mode: Option<ApiProjectionMode>,
    end_age: Option<u32>,
    target_monthly_surplus: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    projection: Projection,
    advice: PlanAdvice,
    timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalaryScoreResponse {
    #[serde(flatten)]
    score: SalaryScore,
    national_bracket: NationalBracket,
    #[serde(skip_serializing_if = "Option::is_none")]
    adjusted_average: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanPresetResponse {
    #[serde(flatten)]
    preset: LoanPreset,
    monthly_payment: f64,
    total_repayment: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let session_path = state.store.path().display().to_string();
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    log::info!("lifeplan HTTP API listening on http://{addr} (session file {session_path})");

    axum::serve(listener, app).await
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/project", post(project_handler))
        .route("/api/snapshot", post(snapshot_handler))
        .route("/api/timeline", post(timeline_handler))
        .route("/api/salary-score", get(salary_score_handler))
        .route("/api/loan-presets", get(loan_presets_handler))
        .route(
            "/api/session",
            get(get_session_handler)
                .put(put_session_handler)
                .delete(delete_session_handler),
        )
        .route("/api/session/projection", get(session_projection_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlanPayload>,
) -> Response {
    match plan_from_payload(payload, &state.config) {
        Ok(inputs) => json_response(StatusCode::OK, build_project_response(&inputs, &state.config)),
        Err(err) => plan_error_response(&err),
    }
}

async fn snapshot_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SnapshotPayload>,
) -> Response {
    let inputs = match plan_from_payload(payload.plan, &state.config) {
        Ok(inputs) => inputs,
        Err(err) => return plan_error_response(&err),
    };
    let age = payload.age.unwrap_or(inputs.basic_info.current_age);
    let body: AgeSnapshot = snapshot(&inputs, &state.config, age);
    json_response(StatusCode::OK, body)
}

async fn timeline_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlanPayload>,
) -> Response {
    match plan_from_payload(payload, &state.config) {
        Ok(inputs) => json_response(StatusCode::OK, timeline(&inputs, &state.config)),
        Err(err) => plan_error_response(&err),
    }
}

async fn salary_score_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SalaryScoreQuery>,
) -> Response {
    if !query.annual_income.is_finite() {
        return error_response(StatusCode::BAD_REQUEST, "annualIncome must be a finite number");
    }
    json_response(StatusCode::OK, salary_score_response(&state.config, &query))
}

async fn loan_presets_handler(State(state): State<Arc<AppState>>) -> Response {
    let presets: Vec<LoanPresetResponse> = state
        .config
        .loan_presets
        .iter()
        .map(|preset| LoanPresetResponse {
            preset: preset.clone(),
            monthly_payment: monthly_payment(
                preset.principal,
                preset.annual_rate_percent,
                preset.term_years,
            ),
            total_repayment: total_repayment(
                preset.principal,
                preset.annual_rate_percent,
                preset.term_years,
            ),
        })
        .collect();
    json_response(StatusCode::OK, presets)
}

async fn get_session_handler(State(state): State<Arc<AppState>>) -> Response {
    match with_session_lock(&state, |store| Ok(store.load())) {
        Ok(session) => json_response(StatusCode::OK, session),
        Err(err) => plan_error_response(&err),
    }
}

async fn put_session_handler(
    State(state): State<Arc<AppState>>,
    Json(plan): Json<PlanInputs>,
) -> Response {
    if let Err(err) = plan.validate(&state.config) {
        return plan_error_response(&err);
    }
    let session = SessionSnapshot::from_inputs(&plan.sanitized());
    match with_session_lock(&state, |store| store.save(&session)) {
        Ok(()) => json_response(StatusCode::OK, session),
        Err(err) => plan_error_response(&err),
    }
}

async fn delete_session_handler(State(state): State<Arc<AppState>>) -> Response {
    match with_session_lock(&state, |store| store.clear()) {
        Ok(()) => with_cache_control(StatusCode::NO_CONTENT),
        Err(err) => plan_error_response(&err),
    }
}

async fn session_projection_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionProjectionQuery>,
) -> Response {
    let session = match with_session_lock(&state, |store| Ok(store.load())) {
        Ok(session) => session,
        Err(err) => return plan_error_response(&err),
    };
    let settings = PlanSettings {
        mode: query.mode.map(Into::into).unwrap_or_default(),
        end_age: query.end_age,
        target_monthly_surplus: query.target_monthly_surplus.unwrap_or(0.0),
    };
    let inputs = session.to_inputs(settings);
    if let Err(err) = inputs.validate(&state.config) {
        return plan_error_response(&err);
    }
    json_response(StatusCode::OK, build_project_response(&inputs, &state.config))
}

fn with_session_lock<T>(
    state: &AppState,
    f: impl FnOnce(&SessionStore) -> Result<T, PlanError>,
) -> Result<T, PlanError> {
    let _guard = state
        .session_lock
        .lock()
        .map_err(|_| PlanError::Io(std::io::Error::other("session lock poisoned")))?;
    f(&state.store)
}

fn plan_from_payload(payload: PlanPayload, config: &PlannerConfig) -> Result<PlanInputs, PlanError> {
    let mut inputs = payload.plan;
    if let Some(mode) = payload.mode {
        inputs.settings.mode = mode.into();
    }
    if let Some(end_age) = payload.end_age {
        inputs.settings.end_age = Some(end_age);
    }
    if let Some(surplus) = payload.target_monthly_surplus {
        inputs.settings.target_monthly_surplus = surplus;
    }
    inputs.validate(config)?;
    Ok(inputs)
}

fn build_project_response(inputs: &PlanInputs, config: &PlannerConfig) -> ProjectResponse {
    let projection = project(inputs, config);
    let advice = advise(inputs, config, &projection);
    ProjectResponse {
        timeline: timeline(inputs, config),
        advice,
        projection,
    }
}

fn salary_score_response(config: &PlannerConfig, query: &SalaryScoreQuery) -> SalaryScoreResponse {
    let adjusted = match (query.education, query.career) {
        (Some(education), Some(career)) => {
            Some(adjusted_average(config, query.age, education, career))
        }
        _ => None,
    };
    SalaryScoreResponse {
        score: score(config, query.annual_income, query.age),
        national_bracket: national_bracket(config, query.annual_income),
        adjusted_average: adjusted,
    }
}

fn plan_error_response(err: &PlanError) -> Response {
    let status = match err {
        PlanError::InvalidInput(_) | PlanError::UnknownLoanPreset { .. } => StatusCode::BAD_REQUEST,
        PlanError::Io(_) | PlanError::Serialization(_) | PlanError::UnsupportedVersion { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        log::warn!("request failed: {err}");
    }
    error_response(status, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
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

#[cfg(test)]
fn plan_from_json(json: &str, config: &PlannerConfig) -> Result<PlanInputs, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_from_payload(payload, config).map_err(|e| e.to_string())
}
