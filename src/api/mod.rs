use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BaselineConfig, DEFAULT_HORIZON_MONTHS, DashboardOptions, DashboardSnapshot, DataView,
    GeneratedSeries, Locale, MAX_HORIZON_MONTHS, RiskView, SeriesCache, SeriesConfig, SeriesPoint,
    SeriesRequest, SeriesShape, build_dashboard, delta_from_baseline, entropy_seed,
    first_of_month, format_delta, latest_value, risk_register,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliShape {
    Trend,
    DecliningCount,
    BoundedRandom,
}

impl From<CliShape> for SeriesShape {
    fn from(value: CliShape) -> Self {
        match value {
            CliShape::Trend => SeriesShape::Trend,
            CliShape::DecliningCount => SeriesShape::DecliningCount,
            CliShape::BoundedRandom => SeriesShape::BoundedRandom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLocale {
    Fr,
    En,
}

impl From<CliLocale> for Locale {
    fn from(value: CliLocale) -> Self {
        match value {
            CliLocale::Fr => Locale::Fr,
            CliLocale::En => Locale::En,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiShape {
    Trend,
    #[serde(alias = "decliningCount", alias = "declining_count", alias = "count")]
    DecliningCount,
    #[serde(alias = "boundedRandom", alias = "bounded_random", alias = "random")]
    BoundedRandom,
}

impl From<ApiShape> for CliShape {
    fn from(value: ApiShape) -> Self {
        match value {
            ApiShape::Trend => CliShape::Trend,
            ApiShape::DecliningCount => CliShape::DecliningCount,
            ApiShape::BoundedRandom => CliShape::BoundedRandom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiLocale {
    #[serde(alias = "fr-FR", alias = "fr_FR")]
    Fr,
    #[serde(alias = "en-US", alias = "en-GB", alias = "en_US")]
    En,
}

impl From<ApiLocale> for CliLocale {
    fn from(value: ApiLocale) -> Self {
        match value {
            ApiLocale::Fr => CliLocale::Fr,
            ApiLocale::En => CliLocale::En,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SeriesPayload {
    shape: Option<ApiShape>,
    start_date: Option<NaiveDate>,
    horizon_months: Option<u32>,
    initial_value: Option<f64>,
    target_value: Option<f64>,
    target_date: Option<NaiveDate>,
    fluctuates: Option<bool>,
    seed: Option<u64>,
    locale: Option<ApiLocale>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DashboardQuery {
    as_of: Option<NaiveDate>,
    horizon_months: Option<u32>,
    seed: Option<u64>,
    view: Option<DataView>,
    locale: Option<ApiLocale>,
}

#[derive(Parser, Debug)]
#[command(
    name = "kpi-trends generate",
    about = "Generate one synthetic monthly KPI series as JSON"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliShape::Trend)]
    shape: CliShape,
    #[arg(
        long,
        help = "First sampled date (YYYY-MM-DD); defaults to the first day of the current month"
    )]
    start_date: Option<NaiveDate>,
    #[arg(long, default_value_t = DEFAULT_HORIZON_MONTHS, help = "Number of monthly samples")]
    horizon_months: u32,
    #[arg(
        long,
        default_value_t = 22.0,
        help = "Starting value, or the base level for bounded-random series"
    )]
    initial_value: f64,
    #[arg(long, default_value_t = 65.0, help = "Value reached on the target date")]
    target_value: f64,
    #[arg(
        long,
        help = "Date the target is reached (YYYY-MM-DD); required unless --shape=bounded-random"
    )]
    target_date: Option<NaiveDate>,
    #[arg(long, help = "Disable random fluctuation around the trend")]
    steady: bool,
    #[arg(long, help = "Seed for reproducible noise; omitted means a fresh seed")]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = CliLocale::Fr)]
    locale: CliLocale,
}

#[derive(Debug)]
struct ApiRequest {
    shape: SeriesShape,
    request: SeriesRequest,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResponse {
    shape: SeriesShape,
    seed: u64,
    latest_value: f64,
    trend_value: Option<f64>,
    delta_from_baseline: f64,
    delta_label: String,
    series: GeneratedSeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    cached_series: usize,
    cache_hits: u64,
    cache_misses: u64,
    cache_evictions: u64,
    cache_capacity: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    cache: Arc<Mutex<SeriesCache>>,
    /// Seed for requests that do not name one, fixed for the server's lifetime.
    session_seed: u64,
}

impl AppState {
    fn new(session_seed: u64) -> Self {
        Self {
            cache: Arc::new(Mutex::new(SeriesCache::new())),
            session_seed,
        }
    }

    fn cache(&self) -> MutexGuard<'_, SeriesCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn build_request(cli: Cli, today: NaiveDate) -> Result<ApiRequest, String> {
    if cli.horizon_months > MAX_HORIZON_MONTHS {
        return Err(format!(
            "--horizon-months must be <= {MAX_HORIZON_MONTHS}"
        ));
    }

    if !cli.initial_value.is_finite() {
        return Err("--initial-value must be finite".to_string());
    }

    if !cli.target_value.is_finite() {
        return Err("--target-value must be finite".to_string());
    }

    let start_date = cli.start_date.unwrap_or_else(|| first_of_month(today));
    let locale: Locale = cli.locale.into();
    let shape: SeriesShape = cli.shape.into();

    let request = match shape {
        SeriesShape::BoundedRandom => {
            if cli.initial_value < 0.0 {
                return Err("--initial-value must be >= 0 for bounded-random series".to_string());
            }
            SeriesRequest::BoundedRandom(BaselineConfig {
                start_date,
                horizon_months: cli.horizon_months,
                base_value: cli.initial_value,
                locale,
            })
        }
        SeriesShape::Trend | SeriesShape::DecliningCount => {
            let Some(target_date) = cli.target_date else {
                return Err(
                    "--target-date is required for trend and declining-count series".to_string(),
                );
            };
            let config = SeriesConfig {
                start_date,
                horizon_months: cli.horizon_months,
                initial_value: cli.initial_value,
                target_value: cli.target_value,
                target_date,
                fluctuates: !cli.steady,
                locale,
            };
            if shape == SeriesShape::Trend {
                SeriesRequest::Trend(config)
            } else {
                for (name, value) in [
                    ("--initial-value", cli.initial_value),
                    ("--target-value", cli.target_value),
                ] {
                    if value < 0.0 || value.fract() != 0.0 {
                        return Err(format!(
                            "{name} must be a whole number >= 0 for declining-count series"
                        ));
                    }
                }
                SeriesRequest::DecliningCount(config)
            }
        }
    };

    request.validate().map_err(|e| e.to_string())?;

    Ok(ApiRequest {
        shape,
        request,
        seed: cli.seed,
    })
}

fn build_dashboard_options(
    query: DashboardQuery,
    today: NaiveDate,
) -> Result<(DashboardOptions, Option<u64>), String> {
    let mut options = DashboardOptions::new(query.as_of.unwrap_or(today));
    if let Some(v) = query.horizon_months {
        if v > MAX_HORIZON_MONTHS {
            return Err(format!("horizonMonths must be <= {MAX_HORIZON_MONTHS}"));
        }
        options.horizon_months = v;
    }
    if let Some(v) = query.view {
        options.view = v;
    }
    if let Some(v) = query.locale {
        options.locale = CliLocale::from(v).into();
    }
    Ok((options, query.seed))
}

fn generate_series(
    api_request: &ApiRequest,
    seed: u64,
    cache: &mut SeriesCache,
) -> Result<SeriesResponse, String> {
    let series = cache
        .get_or_generate(&api_request.request, seed)
        .map_err(|e| e.to_string())?;
    Ok(build_series_response(api_request, seed, series))
}

fn build_series_response(
    api_request: &ApiRequest,
    seed: u64,
    series: GeneratedSeries,
) -> SeriesResponse {
    let latest = latest_value(&series.points, SeriesPoint::value);
    let (baseline, trend_value, decimals) = match &api_request.request {
        SeriesRequest::Trend(config) => (
            config.initial_value,
            series.last().map(|p| config.trend_value_at(p.date)),
            2,
        ),
        SeriesRequest::DecliningCount(config) => (
            config.initial_value,
            series.last().map(|p| config.trend_value_at(p.date)),
            0,
        ),
        SeriesRequest::BoundedRandom(config) => (config.base_value, None, 0),
    };
    let delta = if series.is_empty() {
        0.0
    } else {
        delta_from_baseline(latest, baseline)
    };

    SeriesResponse {
        shape: api_request.shape,
        seed,
        latest_value: latest,
        trend_value,
        delta_from_baseline: delta,
        delta_label: format_delta(delta, decimals),
        series,
    }
}

/// Parses `generate` arguments, produces the series and renders it as JSON.
pub fn run_generate<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    generate_json(cli, Local::now().date_naive())
}

fn generate_json(cli: Cli, today: NaiveDate) -> Result<String, String> {
    let api_request = build_request(cli, today)?;
    let seed = api_request.seed.unwrap_or_else(entropy_seed);
    let series = api_request
        .request
        .generate_seeded(seed)
        .map_err(|e| e.to_string())?;
    let response = build_series_response(&api_request, seed, series);
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to render series: {e}"))
}

pub fn router() -> Router {
    let state = AppState::new(entropy_seed());
    info!(session_seed = state.session_seed, "series seed for unseeded requests");

    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/series",
            get(series_get_handler).post(series_post_handler),
        )
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/risks", get(risks_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "KPI trends HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/dashboard");

    axum::serve(listener, router()).await
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let cache = state.cache();
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            cached_series: cache.len(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            cache_evictions: cache.evictions(),
            cache_capacity: cache.capacity(),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn series_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<SeriesPayload>,
) -> Response {
    series_handler_impl(&state, payload)
}

async fn series_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<SeriesPayload>,
) -> Response {
    series_handler_impl(&state, payload)
}

fn series_handler_impl(state: &AppState, payload: SeriesPayload) -> Response {
    let api_request = match api_request_from_payload(payload, Local::now().date_naive()) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected series request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let seed = api_request.seed.unwrap_or(state.session_seed);
    let result = generate_series(&api_request, seed, &mut state.cache());
    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "series generation failed");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let (options, seed) = match build_dashboard_options(query, Local::now().date_naive()) {
        Ok(resolved) => resolved,
        Err(msg) => {
            warn!(error = %msg, "rejected dashboard request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let seed = seed.unwrap_or(state.session_seed);
    let result: Result<DashboardSnapshot, _> =
        build_dashboard(&options, seed, &mut state.cache());
    match result {
        Ok(snapshot) => json_response(StatusCode::OK, snapshot),
        Err(e) => {
            warn!(error = %e, "dashboard generation failed");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn risks_handler() -> Response {
    let risks: Vec<RiskView> = risk_register();
    json_response(StatusCode::OK, risks)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

#[cfg(test)]
fn api_request_from_json(json: &str, today: NaiveDate) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SeriesPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload, today)
}

fn api_request_from_payload(payload: SeriesPayload, today: NaiveDate) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.shape {
        cli.shape = v.into();
    }
    if let Some(v) = payload.start_date {
        cli.start_date = Some(v);
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }
    if let Some(v) = payload.initial_value {
        cli.initial_value = v;
    }
    if let Some(v) = payload.target_value {
        cli.target_value = v;
    }
    if let Some(v) = payload.target_date {
        cli.target_date = Some(v);
    }
    if let Some(v) = payload.fluctuates {
        cli.steady = !v;
    }
    if let Some(v) = payload.seed {
        cli.seed = Some(v);
    }
    if let Some(v) = payload.locale {
        cli.locale = v.into();
    }

    build_request(cli, today)
}

fn default_cli_for_api() -> Cli {
    Cli {
        shape: CliShape::Trend,
        start_date: None,
        horizon_months: DEFAULT_HORIZON_MONTHS,
        initial_value: 22.0,
        target_value: 65.0,
        target_date: NaiveDate::from_ymd_opt(2026, 12, 31),
        steady: false,
        seed: None,
        locale: CliLocale::Fr,
    }
}
