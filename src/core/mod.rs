mod cache;
mod calendar;
mod catalog;
mod dashboard;
mod engine;
mod metrics;
mod noise;
mod types;

pub use cache::{DEFAULT_CACHE_CAPACITY, SeriesCache};
pub use calendar::{Locale, add_months_rollover, first_of_month, period_label};
pub use catalog::{
    BreakdownEntry, KPI_DEFINITIONS, Kpi, KpiDefinition, KpiGoal, REFERENCE_FIGURES,
    ReferenceFigure, Risk, RiskView, SeriesShape, TRAINING_BUDGET_BY_DEPARTMENT,
    TURNOVER_BY_DEPARTMENT, Tab, breakdown_shares, definition, risk_register,
};
pub use dashboard::{
    DEFAULT_HORIZON_MONTHS, DashboardOptions, DashboardSnapshot, DataView, KpiSnapshot, TabView,
    build_dashboard, build_dashboard_with_noise, series_request,
};
pub use engine::{
    SeriesRequest, generate_bounded_random_series, generate_declining_count_series,
    generate_trend_series,
};
pub use metrics::{Direction, delta_from_baseline, format_delta, is_improvement, latest_value};
pub use noise::{FixedNoise, NoiseSource, Rng, derive_seed, entropy_seed};
pub use types::{
    BaselineConfig, GeneratedSeries, MAX_HORIZON_MONTHS, MetricField, SeriesConfig, SeriesError,
    SeriesPoint,
};
