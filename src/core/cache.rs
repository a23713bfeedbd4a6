use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use tracing::debug;

use super::calendar::Locale;
use super::engine::SeriesRequest;
use super::types::{GeneratedSeries, MetricField, SeriesError};

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    field: MetricField,
    start_date: NaiveDate,
    horizon_months: u32,
    initial_bits: u64,
    target_bits: u64,
    target_date: Option<NaiveDate>,
    fluctuates: bool,
    locale: Locale,
    seed: u64,
}

impl SeriesKey {
    fn new(request: &SeriesRequest, seed: u64) -> Self {
        match request {
            SeriesRequest::Trend(config) | SeriesRequest::DecliningCount(config) => Self {
                field: request.field(),
                start_date: config.start_date,
                horizon_months: config.horizon_months,
                initial_bits: config.initial_value.to_bits(),
                target_bits: config.target_value.to_bits(),
                target_date: Some(config.target_date),
                fluctuates: config.fluctuates,
                locale: config.locale,
                seed,
            },
            SeriesRequest::BoundedRandom(config) => Self {
                field: request.field(),
                start_date: config.start_date,
                horizon_months: config.horizon_months,
                initial_bits: config.base_value.to_bits(),
                target_bits: 0,
                target_date: None,
                fluctuates: true,
                locale: config.locale,
                seed,
            },
        }
    }
}

/// Session-scoped memo of seeded series, holding at most `capacity` entries.
///
/// A series is a pure function of its request and seed, so an evicted entry
/// regenerates identically on the next miss. The oldest entry goes first.
#[derive(Debug)]
pub struct SeriesCache {
    entries: HashMap<SeriesKey, GeneratedSeries>,
    order: VecDeque<SeriesKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn get_or_generate(
        &mut self,
        request: &SeriesRequest,
        seed: u64,
    ) -> Result<GeneratedSeries, SeriesError> {
        let key = SeriesKey::new(request, seed);
        if let Some(series) = self.entries.get(&key) {
            self.hits += 1;
            debug!(field = ?request.field(), points = series.len(), "series cache hit");
            return Ok(series.clone());
        }

        let series = request.generate_seeded(seed)?;
        self.misses += 1;
        debug!(field = ?request.field(), points = series.len(), "series cache miss");
        self.insert(key, series.clone());
        Ok(series)
    }

    fn insert(&mut self, key: SeriesKey, series: GeneratedSeries) {
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            self.evictions += 1;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, series);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}
