use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::{
    CalcError, CalculationResult, ContributionMode, ExistingPortfolioForm,
    ExistingPortfolioResult, PlanningForm, TableRow, TargetComparisonForm, TargetComparisonResult,
    calculate_plan, compare_target, project_existing, validate_existing, validate_planning,
    validate_target,
};
use crate::report::{
    ExistingReport, PlanReport, TargetReport, existing_report, plan_report, target_report,
};
use crate::rewrite::RewriteClient;

#[derive(Clone)]
pub struct AppState {
    rewrite: RewriteClient,
}

impl AppState {
    pub fn new(rewrite: RewriteClient) -> Self {
        Self { rewrite }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AllocationRowPayload {
    name: Option<String>,
    #[serde(alias = "weightPercent")]
    weight: Option<f64>,
    #[serde(rename = "return", alias = "annualReturn", alias = "annualReturnPercent")]
    annual_return: Option<f64>,
}

impl From<AllocationRowPayload> for TableRow {
    fn from(value: AllocationRowPayload) -> Self {
        TableRow {
            name: value.name,
            first: value.weight,
            second: value.annual_return,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HoldingRowPayload {
    name: Option<String>,
    amount: Option<f64>,
    #[serde(rename = "return", alias = "annualReturn", alias = "annualReturnPercent")]
    annual_return: Option<f64>,
}

impl From<HoldingRowPayload> for TableRow {
    fn from(value: HoldingRowPayload) -> Self {
        TableRow {
            name: value.name,
            first: value.amount,
            second: value.annual_return,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    current_age: Option<f64>,
    target_age: Option<f64>,
    monthly_expense: Option<f64>,
    #[serde(alias = "lifestyleIncrease")]
    lifestyle_increase_percent: Option<f64>,
    #[serde(alias = "inflationRate", alias = "inflation")]
    inflation_percent: Option<f64>,
    #[serde(alias = "swr")]
    safe_withdrawal_rate_percent: Option<f64>,
    #[serde(alias = "moneyInvested")]
    existing_invested: Option<f64>,
    #[serde(alias = "maxMonthlyInvest")]
    max_monthly_capacity: Option<f64>,
    #[serde(alias = "investmentType", alias = "contributionMode")]
    mode: Option<ContributionMode>,
    assets: Option<Vec<AllocationRowPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExistingPayload {
    #[serde(alias = "yearsExisting")]
    years: Option<f64>,
    holdings: Option<Vec<HoldingRowPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TargetPayload {
    #[serde(alias = "targetReturn", alias = "desiredReturnPercent")]
    desired_return: Option<f64>,
    #[serde(alias = "yearsTarget")]
    years: Option<f64>,
    assets: Option<Vec<AllocationRowPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RewritePayload {
    prompt: Option<String>,
}

#[derive(Serialize)]
struct PlanResponse {
    result: CalculationResult,
    #[serde(flatten)]
    report: PlanReport,
}

#[derive(Serialize)]
struct ExistingResponse {
    result: ExistingPortfolioResult,
    #[serde(flatten)]
    report: ExistingReport,
}

#[derive(Serialize)]
struct TargetResponse {
    result: TargetComparisonResult,
    #[serde(flatten)]
    report: TargetReport,
}

#[derive(Serialize)]
struct RewriteResponse {
    text: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route(
            "/api/existing",
            get(existing_get_handler).post(existing_post_handler),
        )
        .route(
            "/api/target",
            get(target_get_handler).post(target_post_handler),
        )
        .route("/api/rewrite", post(rewrite_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(config: AppConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let rewrite = RewriteClient::new(config.rewrite);
    if !rewrite.is_configured() {
        warn!("OPENAI_API_KEY is not set; /api/rewrite will answer 500");
    }
    let app = router(AppState::new(rewrite));

    let listener = TcpListener::bind(addr).await?;
    info!("goalplan HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{}/api/plan", config.port);

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload)
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload)
}

fn plan_handler_impl(payload: PlanPayload) -> Response {
    let form = plan_form_from_payload(payload);
    let inputs = match validate_planning(&form) {
        Ok(inputs) => inputs,
        Err(err) => return rejected("plan", err),
    };
    let result = match calculate_plan(&inputs) {
        Ok(result) => result,
        Err(err) => return rejected("plan", err),
    };
    let report = plan_report(&inputs, &result);
    json_response(StatusCode::OK, PlanResponse { result, report })
}

async fn existing_get_handler(Query(payload): Query<ExistingPayload>) -> Response {
    existing_handler_impl(payload)
}

async fn existing_post_handler(Json(payload): Json<ExistingPayload>) -> Response {
    existing_handler_impl(payload)
}

fn existing_handler_impl(payload: ExistingPayload) -> Response {
    let form = existing_form_from_payload(payload);
    let inputs = match validate_existing(&form) {
        Ok(inputs) => inputs,
        Err(err) => return rejected("existing", err),
    };
    let result = project_existing(&inputs);
    let report = existing_report(&result);
    json_response(StatusCode::OK, ExistingResponse { result, report })
}

async fn target_get_handler(Query(payload): Query<TargetPayload>) -> Response {
    target_handler_impl(payload)
}

async fn target_post_handler(Json(payload): Json<TargetPayload>) -> Response {
    target_handler_impl(payload)
}

fn target_handler_impl(payload: TargetPayload) -> Response {
    let form = target_form_from_payload(payload);
    let inputs = match validate_target(&form) {
        Ok(inputs) => inputs,
        Err(err) => return rejected("target", err),
    };
    let result = compare_target(&inputs);
    let report = target_report(&result);
    json_response(StatusCode::OK, TargetResponse { result, report })
}

async fn rewrite_handler(
    State(state): State<AppState>,
    Json(payload): Json<RewritePayload>,
) -> Response {
    let prompt = payload.prompt.unwrap_or_default();
    match state.rewrite.rewrite(&prompt).await {
        Ok(text) => json_response(StatusCode::OK, RewriteResponse { text }),
        Err(err) => {
            warn!(error = %err, "rewrite proxy failed");
            let status =
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
            error_response(status, &err.body())
        }
    }
}

fn rejected(module: &str, err: CalcError) -> Response {
    debug!(module, error = %err, "calculation rejected");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

pub(crate) fn default_allocation_rows() -> Vec<TableRow> {
    vec![
        TableRow::new("Equity", 60.0, 15.0),
        TableRow::new("Debt", 25.0, 7.0),
        TableRow::new("Gold", 15.0, 9.0),
    ]
}

pub(crate) fn default_holding_rows() -> Vec<TableRow> {
    vec![
        TableRow::new("Equity", 400_000.0, 14.0),
        TableRow::new("Debt", 300_000.0, 7.0),
        TableRow::new("Gold", 200_000.0, 9.0),
    ]
}

fn rows_or_default<P: Into<TableRow>>(
    rows: Option<Vec<P>>,
    default: fn() -> Vec<TableRow>,
) -> Vec<TableRow> {
    match rows {
        Some(rows) => rows.into_iter().map(Into::into).collect(),
        None => default(),
    }
}

fn plan_form_from_payload(payload: PlanPayload) -> PlanningForm {
    PlanningForm {
        current_age: payload.current_age.or(Some(30.0)),
        target_age: payload.target_age.or(Some(60.0)),
        monthly_expense: payload.monthly_expense,
        lifestyle_increase_percent: payload.lifestyle_increase_percent,
        inflation_percent: payload.inflation_percent.or(Some(6.0)),
        safe_withdrawal_rate_percent: payload.safe_withdrawal_rate_percent.or(Some(4.0)),
        existing_invested: payload.existing_invested,
        max_monthly_capacity: payload.max_monthly_capacity,
        mode: payload.mode.unwrap_or(ContributionMode::Periodic),
        assets: rows_or_default(payload.assets, default_allocation_rows),
    }
}

fn existing_form_from_payload(payload: ExistingPayload) -> ExistingPortfolioForm {
    ExistingPortfolioForm {
        years: payload.years.or(Some(10.0)),
        holdings: rows_or_default(payload.holdings, default_holding_rows),
    }
}

fn target_form_from_payload(payload: TargetPayload) -> TargetComparisonForm {
    TargetComparisonForm {
        desired_return_percent: payload.desired_return.or(Some(12.0)),
        years: payload.years.or(Some(10.0)),
        assets: rows_or_default(payload.assets, default_allocation_rows),
    }
}
