//! Support and resistance levels derived from daily candles

use crate::provider::Candle;
use std::cmp::Ordering;
use std::collections::HashSet;

const MAX_LEVELS: usize = 3;

/// Detected price levels, nearest to the current price first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceLevels {
    /// Bar lows at or below the price, descending (nearest first)
    pub supports: Vec<f64>,
    /// Bar highs at or above the price, ascending (nearest first)
    pub resistances: Vec<f64>,
}

/// Round to 2 decimals and keep the first occurrence of each level
fn unique_rounded_levels(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for value in values {
        if !value.is_finite() {
            continue;
        }
        let rounded = (value * 100.0).round() / 100.0;
        // integer key makes the dedup exact despite float rounding
        let key = (rounded * 100.0).round() as i64;
        if seen.insert(key) {
            out.push(rounded);
        }
    }

    out
}

fn sorted(mut levels: Vec<f64>, order: Ordering) -> Vec<f64> {
    levels.sort_by(|a, b| {
        let cmp = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        if order == Ordering::Greater { cmp.reverse() } else { cmp }
    });
    levels.truncate(MAX_LEVELS);
    levels
}

/// Compute up to three support and three resistance levels around the
/// current price. No candles or no price yields empty lists.
pub fn support_resistance(candles: &[Candle], current_price: Option<f64>) -> PriceLevels {
    let Some(price) = current_price else {
        return PriceLevels::default();
    };
    if candles.is_empty() {
        return PriceLevels::default();
    }

    let resistances = unique_rounded_levels(
        candles.iter().map(|bar| bar.high).filter(|high| *high >= price),
    );
    let supports = unique_rounded_levels(
        candles.iter().map(|bar| bar.low).filter(|low| *low <= price),
    );

    PriceLevels {
        supports: sorted(supports, Ordering::Greater),
        resistances: sorted(resistances, Ordering::Less),
    }
}
