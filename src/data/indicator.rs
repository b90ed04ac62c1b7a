use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::resample::{Resampled, Series};

// ---------------------------------------------------------------------------
// Indicator selection
// ---------------------------------------------------------------------------

/// Indicator choice as offered in the UI, independent of the window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[default]
    None,
    Sma,
    Ema,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 3] = [
        IndicatorKind::None,
        IndicatorKind::Sma,
        IndicatorKind::Ema,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IndicatorKind::None => "No indicator",
            IndicatorKind::Sma => "Simple moving average (SMA)",
            IndicatorKind::Ema => "Exponential moving average (EMA)",
        }
    }

    /// Attach a window; `None` ignores it.
    pub fn with_window(self, window: NonZeroUsize) -> Indicator {
        match self {
            IndicatorKind::None => Indicator::None,
            IndicatorKind::Sma => Indicator::Sma(window),
            IndicatorKind::Ema => Indicator::Ema(window),
        }
    }
}

/// A fully parameterised indicator. The window is non-zero by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    None,
    Sma(NonZeroUsize),
    Ema(NonZeroUsize),
}

impl Indicator {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Indicator::None => IndicatorKind::None,
            Indicator::Sma(_) => IndicatorKind::Sma,
            Indicator::Ema(_) => IndicatorKind::Ema,
        }
    }

    /// Name of the derived series for `feature`, e.g. `SMA_3_value`.
    pub fn series_name(&self, feature: &str) -> Option<String> {
        match self {
            Indicator::None => None,
            Indicator::Sma(w) => Some(format!("SMA_{w}_{feature}")),
            Indicator::Ema(w) => Some(format!("EMA_{w}_{feature}")),
        }
    }

    /// Compute the derived values for one input series.
    pub fn compute(&self, values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
        match self {
            Indicator::None => None,
            Indicator::Sma(w) => Some(sma(values, w.get())),
            Indicator::Ema(w) => Some(ema(values, w.get())),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind().label())
    }
}

// ---------------------------------------------------------------------------
// Moving averages
// ---------------------------------------------------------------------------

/// Trailing simple moving average.
///
/// Element `i` is the mean of `values[i + 1 - window ..= i]`; undefined for
/// `i < window - 1` and whenever the window holds an undefined value. Each
/// window is summed on its own, so a huge or infinite value only affects the
/// windows it sits in.
pub fn sma(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let sum: Option<f64> = values[i + 1 - window..=i].iter().copied().sum();
            sum.map(|s| s / window as f64)
        })
        .collect()
}

/// Exponential moving average with `alpha = 2 / (window + 1)`, recursive form
/// seeded with the first defined value:
/// `v0 = x0`, `vi = alpha * xi + (1 - alpha) * v(i-1)`.
///
/// Undefined inputs before the seed stay undefined; later ones repeat the
/// previous average. The old average keeps decaying by `1 - alpha` per
/// undefined step, so after a gap of `k` steps the next value is
/// `(w * v + alpha * x) / (w + alpha)` with `w = (1 - alpha)^(k + 1)`.
pub fn ema(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut old_weight = 1.0;

    values
        .iter()
        .map(|x| {
            match (prev, *x) {
                (None, x) => prev = x,
                (Some(p), x) => {
                    old_weight *= 1.0 - alpha;
                    if let Some(x) = x {
                        prev = Some((old_weight * p + alpha * x) / (old_weight + alpha));
                        old_weight = 1.0;
                    }
                }
            }
            prev
        })
        .collect()
}

/// Append one derived series per feature, after the existing ones.
///
/// Features missing from `data` (e.g. dropped as non-numeric) are skipped.
/// Returns the names of the appended series in feature order.
pub fn apply_indicator(
    data: &mut Resampled,
    features: &[String],
    indicator: Indicator,
) -> Vec<String> {
    let mut added = Vec::new();

    for feature in features {
        let Some(name) = indicator.series_name(feature) else {
            break;
        };
        let Some(values) = data
            .series(feature)
            .and_then(|s| indicator.compute(&s.values))
        else {
            continue;
        };
        data.series.push(Series {
            name: name.clone(),
            values,
        });
        added.push(name);
    }

    added
}
