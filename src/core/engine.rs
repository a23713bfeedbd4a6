use chrono::{Datelike, NaiveDate};

use super::calendar::{Locale, add_months_rollover, period_label};
use super::noise::{NoiseSource, Rng, derive_seed};
use super::types::{
    BaselineConfig, GeneratedSeries, MetricField, SeriesConfig, SeriesError, SeriesPoint, invalid,
};

const TREND_NOISE_SHARE: f64 = 0.08;
const SETTLED_NOISE_SHARE: f64 = 0.05;
const COUNT_TREND_NOISE: f64 = 1.0;
const COUNT_SETTLED_NOISE: f64 = 0.5;
const BASELINE_NOISE: f64 = 2.0;
const BASELINE_EASING: f64 = 0.8;

/// A fully described series, tagged with the generator that produces it.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesRequest {
    Trend(SeriesConfig),
    DecliningCount(SeriesConfig),
    BoundedRandom(BaselineConfig),
}

impl SeriesRequest {
    pub fn field(&self) -> MetricField {
        match self {
            SeriesRequest::Trend(_) => MetricField::Value,
            SeriesRequest::DecliningCount(_) => MetricField::Incidents,
            SeriesRequest::BoundedRandom(_) => MetricField::Delayed,
        }
    }

    pub fn validate(&self) -> Result<(), SeriesError> {
        match self {
            SeriesRequest::Trend(config) => config.validate(),
            SeriesRequest::DecliningCount(config) => validate_count_config(config),
            SeriesRequest::BoundedRandom(config) => config.validate(),
        }
    }

    pub fn generate<N: NoiseSource + ?Sized>(
        &self,
        noise: &mut N,
    ) -> Result<GeneratedSeries, SeriesError> {
        match self {
            SeriesRequest::Trend(config) => generate_trend_series(config, noise),
            SeriesRequest::DecliningCount(config) => generate_declining_count_series(config, noise),
            SeriesRequest::BoundedRandom(config) => generate_bounded_random_series(config, noise),
        }
    }

    /// Seed of this request's own noise stream under `base_seed`.
    ///
    /// Every input that shapes the values takes part, the locale does not, so
    /// a request drawn alone or next to others yields the same series.
    pub fn stream_seed(&self, base_seed: u64) -> u64 {
        let field = self.field() as u64;
        match self {
            SeriesRequest::Trend(config) | SeriesRequest::DecliningCount(config) => derive_seed(
                base_seed,
                &[
                    field,
                    day_number(config.start_date),
                    u64::from(config.horizon_months),
                    config.initial_value.to_bits(),
                    config.target_value.to_bits(),
                    day_number(config.target_date),
                    u64::from(config.fluctuates),
                ],
            ),
            SeriesRequest::BoundedRandom(config) => derive_seed(
                base_seed,
                &[
                    field,
                    day_number(config.start_date),
                    u64::from(config.horizon_months),
                    config.base_value.to_bits(),
                ],
            ),
        }
    }

    pub fn generate_seeded(&self, base_seed: u64) -> Result<GeneratedSeries, SeriesError> {
        self.generate(&mut Rng::new(self.stream_seed(base_seed)))
    }
}

fn day_number(date: NaiveDate) -> u64 {
    i64::from(date.num_days_from_ce()) as u64
}

/// Monthly series interpolated from `initial_value` to `target_value` by
/// `target_date`, then held at the target.
///
/// Pre-target samples carry noise of up to ±4% of the initial value and
/// post-target samples up to ±2.5% of the target when `fluctuates` is set.
/// Values are rounded to cents.
pub fn generate_trend_series<N: NoiseSource + ?Sized>(
    config: &SeriesConfig,
    noise: &mut N,
) -> Result<GeneratedSeries, SeriesError> {
    config.validate()?;

    let mut points = Vec::with_capacity(config.horizon_months as usize);
    for date in month_dates(config.start_date, config.horizon_months)? {
        let mut value = config.trend_value_at(date);
        if config.fluctuates {
            let amplitude = if date <= config.target_date {
                config.initial_value * TREND_NOISE_SHARE
            } else {
                config.target_value * SETTLED_NOISE_SHARE
            };
            value += noise.centered() * amplitude;
        }
        points.push(point(date, config.locale, round_cents(value)));
    }

    Ok(GeneratedSeries {
        field: MetricField::Value,
        points,
    })
}

/// Integer-valued variant of [`generate_trend_series`] for counts that are
/// driven down to a floor. No sample dated on or before the target date falls
/// below the target, and no sample is negative.
pub fn generate_declining_count_series<N: NoiseSource + ?Sized>(
    config: &SeriesConfig,
    noise: &mut N,
) -> Result<GeneratedSeries, SeriesError> {
    validate_count_config(config)?;

    let floor = config.target_value;
    let mut points = Vec::with_capacity(config.horizon_months as usize);
    for date in month_dates(config.start_date, config.horizon_months)? {
        let value = if date <= config.target_date {
            let mut value = config.trend_value_at(date).max(floor);
            if config.fluctuates {
                value += noise.centered() * COUNT_TREND_NOISE;
            }
            value.round().max(floor)
        } else {
            let mut value = floor;
            if config.fluctuates {
                value += (noise.centered() * COUNT_SETTLED_NOISE).round();
            }
            value.max(floor)
        };
        points.push(point(date, config.locale, normalize_zero(value.max(0.0))));
    }

    Ok(GeneratedSeries {
        field: MetricField::Incidents,
        points,
    })
}

/// Target-less integer series around `base_value`: symmetric ±1 noise for the
/// first half of the horizon, then an extra downward nudge of up to 0.8 per
/// month for the second half.
pub fn generate_bounded_random_series<N: NoiseSource + ?Sized>(
    config: &BaselineConfig,
    noise: &mut N,
) -> Result<GeneratedSeries, SeriesError> {
    config.validate()?;

    let midpoint = f64::from(config.horizon_months) / 2.0;
    let dates = month_dates(config.start_date, config.horizon_months)?;
    let mut points = Vec::with_capacity(dates.len());
    for (index, date) in dates.into_iter().enumerate() {
        let mut value = (config.base_value + noise.centered() * BASELINE_NOISE)
            .round()
            .max(0.0);
        if index as f64 > midpoint {
            value = (value - noise.next_unit() * BASELINE_EASING).round().max(0.0);
        }
        points.push(point(date, config.locale, normalize_zero(value)));
    }

    Ok(GeneratedSeries {
        field: MetricField::Delayed,
        points,
    })
}

fn validate_count_config(config: &SeriesConfig) -> Result<(), SeriesError> {
    config.validate()?;
    for (name, value) in [
        ("initial count", config.initial_value),
        ("target count", config.target_value),
    ] {
        if value < 0.0 || value.fract() != 0.0 {
            return Err(invalid(&format!("{name} must be a whole number >= 0")));
        }
    }
    Ok(())
}

fn month_dates(start: NaiveDate, horizon_months: u32) -> Result<Vec<NaiveDate>, SeriesError> {
    (0..horizon_months)
        .map(|offset| {
            add_months_rollover(start, offset)
                .ok_or_else(|| invalid("horizon runs past the supported calendar range"))
        })
        .collect()
}

fn point(date: NaiveDate, locale: Locale, value: f64) -> SeriesPoint {
    SeriesPoint {
        period_label: period_label(date, locale),
        date,
        value,
    }
}

fn round_cents(value: f64) -> f64 {
    normalize_zero((value * 100.0).round() / 100.0)
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
