use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cache::SeriesCache;
use super::calendar::{Locale, first_of_month, period_label};
use super::catalog::{
    BreakdownEntry, KPI_DEFINITIONS, Kpi, KpiDefinition, REFERENCE_FIGURES, ReferenceFigure,
    RiskView, SeriesShape, TRAINING_BUDGET_BY_DEPARTMENT, TURNOVER_BY_DEPARTMENT, Tab,
    risk_register,
};
use super::engine::SeriesRequest;
use super::metrics::{Direction, delta_from_baseline, format_delta, is_improvement, latest_value};
use super::noise::NoiseSource;
use super::types::{BaselineConfig, GeneratedSeries, SeriesConfig, SeriesError, SeriesPoint};

pub const DEFAULT_HORIZON_MONTHS: u32 = 36;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataView {
    #[default]
    #[serde(alias = "with-data", alias = "withData")]
    Populated,
    Blank,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Reference "today"; the series start on the first day of its month.
    pub as_of: NaiveDate,
    pub horizon_months: u32,
    pub locale: Locale,
    pub view: DataView,
}

impl DashboardOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            horizon_months: DEFAULT_HORIZON_MONTHS,
            locale: Locale::default(),
            view: DataView::default(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        first_of_month(self.as_of)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    pub id: Tab,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub kpi: Kpi,
    pub title: &'static str,
    pub tab: Tab,
    pub shape: SeriesShape,
    pub unit: &'static str,
    pub direction: Direction,
    pub series: GeneratedSeries,
    /// Last generated sample, in display units.
    pub current_value: f64,
    /// Noiseless trend at the last sampled date, in display units.
    pub trend_value: Option<f64>,
    pub baseline: f64,
    pub delta: f64,
    pub delta_label: String,
    /// Whether `delta` moved in the KPI's improving direction.
    pub improving: bool,
    pub goal_value: Option<f64>,
    pub goal_date: Option<NaiveDate>,
    pub goal_caption: &'static str,
    /// Period label of the goal date, for the chart's reference line.
    pub reference_label: Option<String>,
    pub awaiting_data: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub as_of: NaiveDate,
    pub start_date: NaiveDate,
    pub horizon_months: u32,
    pub view: DataView,
    pub tabs: Vec<TabView>,
    pub kpis: Vec<KpiSnapshot>,
    pub reference_figures: Vec<ReferenceFigure>,
    pub training_budget_by_department: Vec<BreakdownEntry>,
    pub turnover_by_department: Vec<BreakdownEntry>,
    pub risks: Vec<RiskView>,
}

impl DashboardSnapshot {
    pub fn kpi(&self, kpi: Kpi) -> Option<&KpiSnapshot> {
        self.kpis.iter().find(|snapshot| snapshot.kpi == kpi)
    }

    pub fn tab_kpis(&self, tab: Tab) -> impl Iterator<Item = &KpiSnapshot> {
        self.kpis.iter().filter(move |snapshot| snapshot.tab == tab)
    }
}

/// Builds the generator request for one KPI definition.
pub fn series_request(
    def: &KpiDefinition,
    start_date: NaiveDate,
    horizon_months: u32,
    locale: Locale,
) -> Result<SeriesRequest, SeriesError> {
    let Some(goal) = def.goal else {
        let config = BaselineConfig {
            start_date,
            horizon_months,
            base_value: def.initial_value,
            locale,
        };
        return Ok(SeriesRequest::BoundedRandom(config));
    };

    let config = SeriesConfig {
        start_date,
        horizon_months,
        initial_value: def.initial_value,
        target_value: goal.value,
        target_date: goal.date()?,
        fluctuates: true,
        locale,
    };
    Ok(match def.shape {
        SeriesShape::DecliningCount => SeriesRequest::DecliningCount(config),
        SeriesShape::Trend | SeriesShape::BoundedRandom => SeriesRequest::Trend(config),
    })
}

/// Generates every KPI series for the session and derives the card values.
///
/// Each KPI draws its own stream derived from `seed` and its request, so the
/// snapshot for a seed does not depend on what `cache` already holds.
pub fn build_dashboard(
    options: &DashboardOptions,
    seed: u64,
    cache: &mut SeriesCache,
) -> Result<DashboardSnapshot, SeriesError> {
    assemble_dashboard(options, |request| cache.get_or_generate(request, seed))
}

/// Same as [`build_dashboard`] with every series drawn from `noise` in catalog
/// order and nothing cached.
pub fn build_dashboard_with_noise<N: NoiseSource + ?Sized>(
    options: &DashboardOptions,
    noise: &mut N,
) -> Result<DashboardSnapshot, SeriesError> {
    assemble_dashboard(options, |request| request.generate(noise))
}

fn assemble_dashboard<F>(
    options: &DashboardOptions,
    mut series_for: F,
) -> Result<DashboardSnapshot, SeriesError>
where
    F: FnMut(&SeriesRequest) -> Result<GeneratedSeries, SeriesError>,
{
    let start_date = options.start_date();
    let populated = options.view == DataView::Populated;

    let mut kpis = Vec::with_capacity(KPI_DEFINITIONS.len());
    for def in &KPI_DEFINITIONS {
        let request = series_request(def, start_date, options.horizon_months, options.locale)?;
        request.validate()?;
        let series = if populated {
            series_for(&request)?
        } else {
            GeneratedSeries::empty(request.field())
        };
        kpis.push(kpi_snapshot(def, &request, series, options.locale)?);
    }

    let (reference_figures, training, turnover, risks) = if populated {
        (
            REFERENCE_FIGURES.to_vec(),
            TRAINING_BUDGET_BY_DEPARTMENT.to_vec(),
            TURNOVER_BY_DEPARTMENT.to_vec(),
            risk_register(),
        )
    } else {
        (Vec::new(), Vec::new(), Vec::new(), Vec::new())
    };

    Ok(DashboardSnapshot {
        as_of: options.as_of,
        start_date,
        horizon_months: options.horizon_months,
        view: options.view,
        tabs: Tab::ALL
            .iter()
            .map(|&id| TabView {
                id,
                title: id.title(),
            })
            .collect(),
        kpis,
        reference_figures,
        training_budget_by_department: training,
        turnover_by_department: turnover,
        risks,
    })
}

fn kpi_snapshot(
    def: &KpiDefinition,
    request: &SeriesRequest,
    series: GeneratedSeries,
    locale: Locale,
) -> Result<KpiSnapshot, SeriesError> {
    let scale = def.display_scale;
    let awaiting_data = series.is_empty();
    let current_value = latest_value(&series.points, |p: &SeriesPoint| p.value * scale);
    let baseline = if awaiting_data {
        0.0
    } else {
        def.initial_value * scale
    };
    let delta = delta_from_baseline(current_value, baseline);

    let trend_value = match (request, series.last()) {
        (SeriesRequest::Trend(config), Some(last))
        | (SeriesRequest::DecliningCount(config), Some(last)) => {
            Some(config.trend_value_at(last.date) * scale)
        }
        _ => None,
    };

    let goal_date = def.goal.map(|goal| goal.date()).transpose()?;

    Ok(KpiSnapshot {
        kpi: def.kpi,
        title: def.title,
        tab: def.tab,
        shape: def.shape,
        unit: def.unit,
        direction: def.direction,
        current_value,
        trend_value,
        baseline,
        delta,
        delta_label: format_delta(delta, def.decimals),
        improving: is_improvement(delta, def.direction),
        goal_value: def.goal.map(|goal| goal.value * scale),
        goal_date,
        goal_caption: def.goal_caption,
        reference_label: goal_date.map(|date| period_label(date, locale)),
        awaiting_data,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::definition;
    use crate::core::noise::FixedNoise;
    use crate::core::types::MetricField;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn options() -> DashboardOptions {
        DashboardOptions::new(ymd(2025, 6, 17))
    }

    #[test]
    fn populated_dashboard_covers_every_kpi() {
        let mut cache = SeriesCache::new();
        let snapshot = build_dashboard(&options(), 42, &mut cache).expect("valid");

        assert_eq!(snapshot.start_date, ymd(2025, 6, 1));
        assert_eq!(snapshot.kpis.len(), KPI_DEFINITIONS.len());
        assert_eq!(snapshot.tabs.len(), 5);
        assert_eq!(snapshot.risks.len(), 11);
        assert_eq!(snapshot.reference_figures.len(), 4);
        for kpi in &snapshot.kpis {
            assert_eq!(kpi.series.len(), DEFAULT_HORIZON_MONTHS as usize);
            assert!(!kpi.awaiting_data);
        }
        assert_eq!(cache.len(), KPI_DEFINITIONS.len());
    }

    #[test]
    fn silent_noise_settles_every_goal_kpi_on_its_target() {
        let snapshot =
            build_dashboard_with_noise(&options(), &mut FixedNoise::silent()).expect("valid");

        // 36 months from June 2025 run past every goal date.
        let margin = snapshot.kpi(Kpi::GrossMargin).expect("gross margin");
        assert_eq!(margin.current_value, 65.0);
        assert_eq!(margin.delta_label, "+43.0");
        assert!(margin.improving);
        assert_eq!(margin.reference_label.as_deref(), Some("déc. 26"));

        let turnover = snapshot.kpi(Kpi::CompanyTurnover).expect("turnover");
        assert!((turnover.current_value - 10.0).abs() < 1e-9);
        assert!((turnover.baseline - 18.0).abs() < 1e-9);
        assert_eq!(turnover.delta_label, "-8.0");
        assert!(turnover.improving);

        let incidents = snapshot.kpi(Kpi::CyberIncidents).expect("incidents");
        assert_eq!(incidents.series.field, MetricField::Incidents);
        assert_eq!(incidents.current_value, 1.0);
        assert_eq!(incidents.delta_label, "-2");
        assert_eq!(incidents.trend_value, Some(1.0));

        let delayed = snapshot.kpi(Kpi::DelayedProjects).expect("delayed");
        assert_eq!(delayed.series.field, MetricField::Delayed);
        assert_eq!(delayed.current_value, 4.0);
        assert_eq!(delayed.trend_value, None);
        assert_eq!(delayed.reference_label, None);
    }

    #[test]
    fn blank_view_awaits_data() {
        let mut opts = options();
        opts.view = DataView::Blank;
        let mut cache = SeriesCache::new();
        let snapshot = build_dashboard(&opts, 1, &mut cache).expect("valid");

        assert!(cache.is_empty());
        assert!(snapshot.risks.is_empty());
        assert!(snapshot.reference_figures.is_empty());
        for kpi in &snapshot.kpis {
            assert!(kpi.series.is_empty());
            assert!(kpi.awaiting_data);
            assert_eq!(kpi.current_value, 0.0);
            assert_eq!(kpi.delta, 0.0);
        }
    }

    #[test]
    fn same_session_reuses_series() {
        let mut cache = SeriesCache::new();
        let first = build_dashboard(&options(), 1, &mut cache).expect("valid");
        let second = build_dashboard(&options(), 1, &mut cache).expect("valid");

        for (a, b) in first.kpis.iter().zip(&second.kpis) {
            assert_eq!(a.series, b.series);
        }
        assert_eq!(cache.hits(), KPI_DEFINITIONS.len() as u64);
    }

    #[test]
    fn seeded_dashboard_ignores_previously_cached_series() {
        let fresh = build_dashboard(&options(), 3, &mut SeriesCache::new()).expect("valid");

        let mut warmed = SeriesCache::new();
        let nps = series_request(
            definition(Kpi::NetPromoterScore),
            options().start_date(),
            DEFAULT_HORIZON_MONTHS,
            Locale::Fr,
        )
        .expect("valid");
        warmed.get_or_generate(&nps, 3).expect("valid");
        build_dashboard(&options(), 8, &mut warmed).expect("valid");
        let rebuilt = build_dashboard(&options(), 3, &mut warmed).expect("valid");

        for (a, b) in fresh.kpis.iter().zip(&rebuilt.kpis) {
            assert_eq!(a.series, b.series, "{:?} differs", a.kpi);
        }
        assert_eq!(warmed.hits(), 1);
    }

    #[test]
    fn seeded_dashboard_survives_eviction() {
        let fresh = build_dashboard(&options(), 5, &mut SeriesCache::new()).expect("valid");

        let mut small = SeriesCache::with_capacity(2);
        build_dashboard(&options(), 5, &mut small).expect("valid");
        let rebuilt = build_dashboard(&options(), 5, &mut small).expect("valid");

        assert_eq!(small.len(), 2);
        for (a, b) in fresh.kpis.iter().zip(&rebuilt.kpis) {
            assert_eq!(a.series, b.series);
        }
    }

    #[test]
    fn different_seeds_give_different_series() {
        let mut cache = SeriesCache::new();
        let a = build_dashboard(&options(), 1, &mut cache).expect("valid");
        let b = build_dashboard(&options(), 2, &mut cache).expect("valid");
        let margin_a = a.kpi(Kpi::GrossMargin).expect("gross margin");
        let margin_b = b.kpi(Kpi::GrossMargin).expect("gross margin");
        assert_ne!(margin_a.series, margin_b.series);
    }

    #[test]
    fn tab_filter_groups_kpis() {
        let mut cache = SeriesCache::new();
        let snapshot = build_dashboard(&options(), 3, &mut cache).expect("valid");
        let operational: Vec<Kpi> = snapshot.tab_kpis(Tab::Operational).map(|k| k.kpi).collect();
        assert_eq!(
            operational,
            [
                Kpi::ProjectDeliveryTime,
                Kpi::CyberIncidents,
                Kpi::DelayedProjects
            ]
        );
    }

    #[test]
    fn series_request_matches_definition_shape() {
        let start = ymd(2025, 1, 1);
        let request =
            series_request(definition(Kpi::CyberIncidents), start, 12, Locale::Fr).expect("valid");
        assert!(matches!(request, SeriesRequest::DecliningCount(_)));

        let request =
            series_request(definition(Kpi::DelayedProjects), start, 12, Locale::Fr).expect("valid");
        assert!(matches!(request, SeriesRequest::BoundedRandom(_)));

        let request = series_request(definition(Kpi::NetPromoterScore), start, 12, Locale::En)
            .expect("valid");
        let SeriesRequest::Trend(config) = request else {
            panic!("expected trend request");
        };
        assert_eq!(config.target_date, ymd(2026, 5, 31));
        assert_eq!(config.locale, Locale::En);
    }
}
