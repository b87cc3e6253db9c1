use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    CardCycle, ConfigError, ModelDiffPoint, Policy, PolicyParams, SalaryDay, SavingsConfig,
    StrategyComparison, TimelinePoint, TimelineSimulation, TimelineSource, compare,
    model_diff_points, parse_clock_time, resolve_timeline, simulate,
};

const DEFAULT_CHART_STRIDE: usize = 7;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPolicy {
    Conventional,
    Reasoning,
}

impl From<CliPolicy> for Policy {
    fn from(value: CliPolicy) -> Self {
        match value {
            CliPolicy::Conventional => Policy::Conventional,
            CliPolicy::Reasoning => Policy::Reasoning,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPolicy {
    #[serde(alias = "Conventional", alias = "baseline")]
    Conventional,
    #[serde(alias = "Reasoning", alias = "reasoning-model")]
    Reasoning,
}

impl From<ApiPolicy> for Policy {
    fn from(value: ApiPolicy) -> Self {
        match value {
            ApiPolicy::Conventional => Policy::Conventional,
            ApiPolicy::Reasoning => Policy::Reasoning,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CardOverride {
    cut_day: Option<u32>,
    due_day: Option<u32>,
    balance: Option<f64>,
}

/// Per-field scenario overrides shared by CLI flags, `--config` files and
/// API payloads. Unset fields keep the value from the layer below.
#[derive(Args, Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[arg(long)]
    persona: Option<String>,
    #[arg(long, help = "Savings goal")]
    goal: Option<f64>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long, help = "First simulated day, YYYY-MM-DD")]
    timeline_start: Option<NaiveDate>,
    #[arg(long, help = "Last simulated day, YYYY-MM-DD")]
    timeline_end: Option<NaiveDate>,
    #[arg(long)]
    current_savings: Option<f64>,
    #[arg(long)]
    months_elapsed: Option<u32>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Checking balance on the first day; defaults to target buffer + salary"
    )]
    opening_balance: Option<f64>,
    #[arg(long)]
    rent_due_day: Option<u32>,
    #[arg(long)]
    rent_amount: Option<f64>,
    #[arg(long)]
    utilities_due_day: Option<u32>,
    #[arg(long, help = "Utilities debit time, HH:MM")]
    utilities_time: Option<String>,
    #[arg(long)]
    utilities_amount: Option<f64>,
    #[arg(long, help = "\"last-business-day\" or a day of month")]
    salary_day: Option<SalaryDay>,
    #[arg(long)]
    salary_amount: Option<f64>,
    #[arg(long)]
    friday_gig_income: Option<f64>,
    #[arg(long)]
    bnpl_due_day: Option<u32>,
    #[arg(long)]
    bnpl_amount: Option<f64>,
    #[arg(skip)]
    card_a: Option<CardOverride>,
    #[arg(long)]
    #[serde(alias = "cardAcutDay")]
    card_a_cut_day: Option<u32>,
    #[arg(long)]
    card_a_due_day: Option<u32>,
    #[arg(long)]
    card_a_balance: Option<f64>,
    #[arg(skip)]
    card_b: Option<CardOverride>,
    #[arg(long)]
    #[serde(alias = "cardBcutDay")]
    card_b_cut_day: Option<u32>,
    #[arg(long)]
    card_b_due_day: Option<u32>,
    #[arg(long)]
    card_b_balance: Option<f64>,
    #[arg(long)]
    gym_membership: Option<f64>,
    #[arg(long)]
    gym_due_day: Option<u32>,
    #[arg(long, value_delimiter = ',', help = "Bank holidays, comma separated YYYY-MM-DD")]
    holidays: Option<Vec<NaiveDate>>,
    #[arg(long)]
    target_buffer: Option<f64>,
    #[arg(skip)]
    params: Option<PolicyParams>,
    #[arg(long, help = "Conventional auto-save share of salary, 0..1")]
    conventional_save_rate: Option<f64>,
    #[arg(long, help = "Card minimum payment share of statement, 0..1")]
    card_minimum_rate: Option<f64>,
    #[arg(long, help = "Reasoning share of gig income sent to savings, 0..1")]
    gig_savings_share: Option<f64>,
    #[arg(long, help = "Days of upcoming debits held back as buffer")]
    buffer_horizon_days: Option<u32>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut SavingsConfig) -> Result<(), ConfigError> {
        if let Some(v) = &self.persona {
            config.persona = v.clone();
        }
        if let Some(v) = self.goal {
            config.goal = v;
        }
        if let Some(v) = &self.currency {
            config.currency = v.clone();
        }
        if let Some(v) = self.timeline_start {
            config.timeline_start = v;
        }
        if let Some(v) = self.timeline_end {
            config.timeline_end = v;
        }
        if let Some(v) = self.current_savings {
            config.current_savings = v;
        }
        if let Some(v) = self.months_elapsed {
            config.months_elapsed = v;
        }
        if let Some(v) = self.opening_balance {
            config.opening_balance = Some(v);
        }

        if let Some(v) = self.rent_due_day {
            config.rent_due_day = v;
        }
        if let Some(v) = self.rent_amount {
            config.rent_amount = v;
        }
        if let Some(v) = self.utilities_due_day {
            config.utilities_due_day = v;
        }
        if let Some(v) = &self.utilities_time {
            config.utilities_time = parse_clock_time(v)?;
        }
        if let Some(v) = self.utilities_amount {
            config.utilities_amount = v;
        }
        if let Some(v) = self.salary_day {
            config.salary_day = v;
        }
        if let Some(v) = self.salary_amount {
            config.salary_amount = v;
        }
        if let Some(v) = self.friday_gig_income {
            config.friday_gig_income = v;
        }
        if let Some(v) = self.bnpl_due_day {
            config.bnpl_due_day = v;
        }
        if let Some(v) = self.bnpl_amount {
            config.bnpl_amount = v;
        }

        if let Some(card) = &self.card_a {
            apply_card(&mut config.card_a, card);
        }
        apply_card(
            &mut config.card_a,
            &CardOverride {
                cut_day: self.card_a_cut_day,
                due_day: self.card_a_due_day,
                balance: self.card_a_balance,
            },
        );
        if let Some(card) = &self.card_b {
            apply_card(&mut config.card_b, card);
        }
        apply_card(
            &mut config.card_b,
            &CardOverride {
                cut_day: self.card_b_cut_day,
                due_day: self.card_b_due_day,
                balance: self.card_b_balance,
            },
        );

        if let Some(v) = self.gym_membership {
            config.gym_membership = v;
        }
        if let Some(v) = self.gym_due_day {
            config.gym_due_day = v;
        }
        if let Some(v) = &self.holidays {
            config.holidays = v.clone();
        }
        if let Some(v) = self.target_buffer {
            config.target_buffer = v;
        }

        if let Some(v) = self.params {
            config.params = v;
        }
        if let Some(v) = self.conventional_save_rate {
            config.params.conventional_save_rate = v;
        }
        if let Some(v) = self.card_minimum_rate {
            config.params.card_minimum_rate = v;
        }
        if let Some(v) = self.gig_savings_share {
            config.params.gig_savings_share = v;
        }
        if let Some(v) = self.buffer_horizon_days {
            config.params.buffer_horizon_days = v;
        }

        Ok(())
    }
}

fn apply_card(cycle: &mut CardCycle, card: &CardOverride) {
    if let Some(v) = card.cut_day {
        cycle.cut_day = v;
    }
    if let Some(v) = card.due_day {
        cycle.due_day = v;
    }
    if let Some(v) = card.balance {
        cycle.balance = v;
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "savings-timeline",
    about = "Calendar-aware savings timeline: conventional auto-save vs buffer-first reasoning policy"
)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = CliPolicy::Reasoning)]
    policy: CliPolicy,
    #[arg(long, help = "JSON scenario file; any subset of the scenario fields")]
    config: Option<PathBuf>,
    #[arg(long, help = "Run both policies and print the comparison")]
    compare: bool,
    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    policy: Option<ApiPolicy>,
    /// Externally produced timeline that replaces the computed chart points.
    timeline: Option<Vec<TimelinePoint>>,
    chart_stride: Option<usize>,
    /// Scenario nested the way `ExportDocument` writes it; flat keys win.
    config: Option<ConfigOverrides>,
    #[serde(flatten)]
    overrides: ConfigOverrides,
}

impl SimulatePayload {
    fn layers(&self) -> Vec<&ConfigOverrides> {
        self.config.iter().chain([&self.overrides]).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulateQuery {
    policy: Option<ApiPolicy>,
    chart_stride: Option<usize>,
}

#[derive(Debug)]
struct ApiRequest {
    config: SavingsConfig,
    policy: Policy,
    timeline: Vec<TimelinePoint>,
    chart_stride: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    config: SavingsConfig,
    #[serde(flatten)]
    simulation: TimelineSimulation,
    timeline_source: TimelineSource,
    timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    config: SavingsConfig,
    #[serde(flatten)]
    comparison: StrategyComparison,
}

/// Downloadable `{config, simulation}` document.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub config: SavingsConfig,
    pub simulation: TimelineSimulation,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn export_file_name(policy: Policy) -> String {
    format!("savings-simulation-{}.json", policy.as_str())
}

fn layered_config(layers: &[&ConfigOverrides]) -> Result<SavingsConfig, ConfigError> {
    let mut config = SavingsConfig::emre();
    for layer in layers {
        layer.apply(&mut config)?;
    }
    config.validate()?;
    Ok(config)
}

/// Runs the `simulate` subcommand and returns the JSON to print.
pub fn run_cli(cli: Cli) -> Result<String, ConfigError> {
    let file = match &cli.config {
        Some(path) => serde_json::from_str::<SimulatePayload>(&fs::read_to_string(path)?)?,
        None => SimulatePayload::default(),
    };
    let mut layers = file.layers();
    layers.push(&cli.overrides);
    let config = layered_config(&layers)?;

    let output = if cli.compare {
        serde_json::to_string_pretty(&compare(&config))?
    } else {
        let simulation = simulate(&config, cli.policy.into());
        serde_json::to_string_pretty(&ExportDocument { config, simulation })?
    };
    Ok(output)
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/export", post(export_handler))
        .route("/api/model-diff", get(model_diff_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "savings timeline API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(query): Query<SimulateQuery>) -> Response {
    let payload = SimulatePayload {
        policy: query.policy,
        chart_stride: query.chart_stride,
        ..SimulatePayload::default()
    };
    simulate_handler_impl(api_request_from_payload(payload))
}

async fn simulate_post_handler(body: String) -> Response {
    simulate_handler_impl(api_request_from_json(&body))
}

fn simulate_handler_impl(request: Result<ApiRequest, ConfigError>) -> Response {
    let request = match request {
        Ok(request) => request,
        Err(err) => return reject("simulate", &err),
    };

    let simulation = simulate(&request.config, request.policy);
    let (timeline_source, timeline) =
        resolve_timeline(&simulation, &request.timeline, request.chart_stride);
    debug!(
        policy = request.policy.as_str(),
        source = ?timeline_source,
        "simulate request served"
    );

    json_response(
        StatusCode::OK,
        SimulateResponse {
            config: request.config,
            simulation,
            timeline_source,
            timeline,
        },
    )
}

async fn compare_get_handler() -> Response {
    compare_handler_impl(api_request_from_payload(SimulatePayload::default()))
}

async fn compare_post_handler(body: String) -> Response {
    compare_handler_impl(api_request_from_json(&body))
}

fn compare_handler_impl(request: Result<ApiRequest, ConfigError>) -> Response {
    match request {
        Ok(request) => {
            let comparison = compare(&request.config);
            json_response(
                StatusCode::OK,
                CompareResponse {
                    config: request.config,
                    comparison,
                },
            )
        }
        Err(err) => reject("compare", &err),
    }
}

async fn export_handler(body: String) -> Response {
    let request = match api_request_from_json(&body) {
        Ok(request) => request,
        Err(err) => return reject("export", &err),
    };

    let simulation = simulate(&request.config, request.policy);
    let file_name = export_file_name(request.policy);
    let mut response = json_response(
        StatusCode::OK,
        ExportDocument {
            config: request.config,
            simulation,
        },
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\"")) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

async fn model_diff_handler() -> Response {
    let points: Vec<ModelDiffPoint> = model_diff_points();
    json_response(StatusCode::OK, points)
}

fn reject(route: &str, err: &ConfigError) -> Response {
    warn!(route, error = %err, "rejected request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
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

fn api_request_from_json(json: &str) -> Result<ApiRequest, ConfigError> {
    let payload = if json.trim().is_empty() {
        SimulatePayload::default()
    } else {
        serde_json::from_str::<SimulatePayload>(json)?
    };
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, ConfigError> {
    let config = layered_config(&payload.layers())?;
    Ok(ApiRequest {
        config,
        policy: payload.policy.map_or(Policy::Reasoning, Policy::from),
        timeline: payload.timeline.unwrap_or_default(),
        chart_stride: payload.chart_stride.unwrap_or(DEFAULT_CHART_STRIDE),
    })
}
