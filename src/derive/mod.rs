/// Result deriver: turns one prediction into chart-ready series.
///
/// Everything here is a pure function of `(PredictionResult, FrozenInput)`:
/// no I/O, no clock, no randomness. Consumers render points positionally,
/// so the order of every series is part of the contract.
///
/// The trend series is illustrative only. It spreads fixed multipliers
/// around the predicted yield so a chart has a shape; it is not a forecast.
use serde::Serialize;

use crate::client::PredictionResult;
use crate::schema::FrozenInput;

/// Period labels and multipliers for the trend series. The last entry is
/// the current prediction itself.
const TREND: [(&str, f64); 5] = [
    ("2021", 0.9),
    ("2022", 0.8),
    ("2023", 1.1),
    ("2024", 0.95),
    ("2025", 1.0),
];

/// One row of the nutrient balance chart definition.
struct BalanceRef {
    field: &'static str,
    name: &'static str,
    /// Factor applied to the observed value to put it on the chart's axis.
    scale: f64,
    reference: f64,
    scale_max: f64,
}

/// Nutrient balance rows. pH is multiplied by ten so it sits on the same
/// 0–100 axis as moisture.
const BALANCE: [BalanceRef; 5] = [
    BalanceRef {
        field: "Nitrogen",
        name: "Nitrogen",
        scale: 1.0,
        reference: 120.0,
        scale_max: 150.0,
    },
    BalanceRef {
        field: "Phosphorus",
        name: "Phosphorus",
        scale: 1.0,
        reference: 60.0,
        scale_max: 150.0,
    },
    BalanceRef {
        field: "Potassium",
        name: "Potassium",
        scale: 1.0,
        reference: 60.0,
        scale_max: 150.0,
    },
    BalanceRef {
        field: "Soil_pH",
        name: "pH",
        scale: 10.0,
        reference: 65.0,
        scale_max: 100.0,
    },
    BalanceRef {
        field: "Soil_Moisture",
        name: "Moisture",
        scale: 1.0,
        reference: 80.0,
        scale_max: 100.0,
    },
];

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A labelled point of the yield trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: &'static str,
    pub value: f64,
}

/// One spoke of the nutrient balance radar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    pub nutrient: &'static str,
    pub observed: f64,
    pub reference: f64,
    pub scale_max: f64,
}

/// Headline figures shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub yield_per_hectare: f64,
    pub total_yield: f64,
    pub area_in_hectares: f64,
    pub yield_unit: String,
}

/// Everything the presentation layer needs to draw a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub headline: Headline,
    pub trend: Vec<TrendPoint>,
    pub balance: Vec<BalancePoint>,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive all series for a successful prediction.
pub fn derive(result: &PredictionResult, input: &FrozenInput) -> DerivedSeries {
    DerivedSeries {
        headline: headline(result),
        trend: trend_series(result),
        balance: balance_series(input),
    }
}

pub fn headline(result: &PredictionResult) -> Headline {
    Headline {
        yield_per_hectare: result.yield_per_hectare,
        total_yield: result.total_yield,
        area_in_hectares: result.area_in_hectares,
        yield_unit: result.yield_unit.clone(),
    }
}

/// Five points around `Yield_per_Hectare`; the last equals it exactly.
pub fn trend_series(result: &PredictionResult) -> Vec<TrendPoint> {
    TREND
        .iter()
        .map(|&(label, factor)| TrendPoint {
            label,
            value: result.yield_per_hectare * factor,
        })
        .collect()
}

/// Observed soil values against fixed reference levels.
pub fn balance_series(input: &FrozenInput) -> Vec<BalancePoint> {
    BALANCE
        .iter()
        .map(|row| BalancePoint {
            nutrient: row.name,
            // Frozen inputs always carry every numeric field.
            observed: input.number(row.field).unwrap_or_default() * row.scale,
            reference: row.reference,
            scale_max: row.scale_max,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
