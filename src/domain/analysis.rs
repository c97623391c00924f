// src/domain/analysis.rs
//
// Market statistics over stored properties. Every function is pure and
// returns `None` for empty input instead of NaN.

use crate::domain::listing::StoredProperty;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

const HOT_ABOVE: f64 = 500_000.0;
const WARM_ABOVE: f64 = 300_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent below two observations.
    pub std: Option<f64>,
    pub min: i64,
    pub max: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAverage {
    /// ISO week label, e.g. `2026-W07`.
    pub week: String,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTrend {
    pub trend: TrendDirection,
    pub weeks: Vec<WeeklyAverage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketHeat {
    Hot,
    Warm,
    Cool,
}

impl MarketHeat {
    pub fn from_mean(mean: f64) -> Self {
        if mean > HOT_ABOVE {
            MarketHeat::Hot
        } else if mean > WARM_ABOVE {
            MarketHeat::Warm
        } else {
            MarketHeat::Cool
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketHeat::Hot => "hot",
            MarketHeat::Warm => "warm",
            MarketHeat::Cool => "cool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    pub avg_price: f64,
    pub median_price: f64,
}

/// Everything the analytics page and reports show for one property set.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub statistics: Option<PriceStats>,
    pub trend: Option<PriceTrend>,
    pub market_heat: Option<MarketHeat>,
    pub by_property_type: BTreeMap<String, GroupSummary>,
    pub by_city: BTreeMap<String, GroupSummary>,
    pub anomalies: Vec<StoredProperty>,
}

pub fn analyze(properties: &[StoredProperty]) -> MarketAnalysis {
    let prices: Vec<i64> = properties.iter().map(|p| p.price).collect();
    let statistics = price_statistics(&prices);

    MarketAnalysis {
        market_heat: statistics.as_ref().map(|s| MarketHeat::from_mean(s.mean)),
        statistics,
        trend: price_trend(properties),
        by_property_type: group_by(properties, |p| p.property_type.as_str().to_string()),
        by_city: group_by(properties, |p| p.city.clone()),
        anomalies: find_anomalies(properties, DEFAULT_ANOMALY_THRESHOLD)
            .into_iter()
            .cloned()
            .collect(),
    }
}

pub fn price_statistics(prices: &[i64]) -> Option<PriceStats> {
    let min = *prices.iter().min()?;
    let max = *prices.iter().max()?;
    let mean = mean(prices)?;

    Some(PriceStats {
        mean,
        median: median(prices)?,
        std: sample_std(prices, mean),
        min,
        max,
        count: prices.len(),
    })
}

pub fn market_heat(prices: &[i64]) -> Option<MarketHeat> {
    mean(prices).map(MarketHeat::from_mean)
}

/// Weekly average prices by `scraped_at`, oldest week first. The trend
/// compares the last week with the first; a single week is stable.
pub fn price_trend(properties: &[StoredProperty]) -> Option<PriceTrend> {
    let mut buckets: BTreeMap<(i32, u32), Vec<i64>> = BTreeMap::new();
    for p in properties {
        let week = p.scraped_at.iso_week();
        buckets.entry((week.year(), week.week())).or_default().push(p.price);
    }

    let weeks: Vec<WeeklyAverage> = buckets
        .into_iter()
        .filter_map(|((year, week), prices)| {
            Some(WeeklyAverage {
                week: format!("{year}-W{week:02}"),
                average: mean(&prices)?,
                count: prices.len(),
            })
        })
        .collect();

    let first = weeks.first()?.average;
    let last = weeks.last()?.average;

    let trend = if last > first {
        TrendDirection::Up
    } else if last < first {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    Some(PriceTrend { trend, weeks })
}

/// Properties priced more than `threshold` sample standard deviations away
/// from the mean.
pub fn find_anomalies(properties: &[StoredProperty], threshold: f64) -> Vec<&StoredProperty> {
    let prices: Vec<i64> = properties.iter().map(|p| p.price).collect();
    let Some(mean) = mean(&prices) else {
        return Vec::new();
    };
    let Some(std) = sample_std(&prices, mean) else {
        return Vec::new();
    };

    properties
        .iter()
        .filter(|p| (p.price as f64 - mean).abs() > threshold * std)
        .collect()
}

fn group_by<F>(properties: &[StoredProperty], key: F) -> BTreeMap<String, GroupSummary>
where
    F: Fn(&StoredProperty) -> String,
{
    let mut groups: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for p in properties {
        groups.entry(key(p)).or_default().push(p.price);
    }

    groups
        .into_iter()
        .filter_map(|(name, prices)| {
            let summary = GroupSummary {
                count: prices.len(),
                avg_price: mean(&prices)?,
                median_price: median(&prices)?,
            };
            Some((name, summary))
        })
        .collect()
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

fn sample_std(values: &[i64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let var = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(var.sqrt())
}
