//! Model-selection metrics and their comparison policy.

use serde::{Deserialize, Serialize};

/// Sentinel starting point when minimizing a likelihood-based metric.
pub const MINIMIZE_SENTINEL: f64 = 1e6;

/// Which way a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Worst possible starting value for this direction.
    pub fn initial_best(self) -> f64 {
        match self {
            // Sample-quality metrics are bounded below by zero.
            Self::Maximize => 0.0,
            Self::Minimize => MINIMIZE_SENTINEL,
        }
    }

    /// Whether `candidate` counts as an improvement over `best`.
    ///
    /// Ties improve only when maximizing. NaN never improves.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Self::Maximize => candidate >= best,
            Self::Minimize => candidate < best,
        }
    }
}

/// The metric used for early stopping and checkpoint selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "valid")]
    Valid,
    #[serde(rename = "unique")]
    Unique,
    #[serde(rename = "novel")]
    Novel,
    #[default]
    #[serde(rename = "score")]
    Score,
    /// Negative log-likelihood over the validation loader.
    #[serde(rename = "nll_val")]
    ValidationNll,
}

impl MetricKind {
    pub fn direction(self) -> Direction {
        match self {
            Self::Valid | Self::Unique | Self::Novel | Self::Score => Direction::Maximize,
            Self::ValidationNll => Direction::Minimize,
        }
    }

    /// Key under which the metric appears in a metric snapshot.
    pub fn key(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Unique => "unique",
            Self::Novel => "novel",
            Self::Score => "score",
            Self::ValidationNll => "nll_val",
        }
    }

    /// True when the metric is read from a sample batch rather than a
    /// validation pass.
    pub fn is_sample_based(self) -> bool {
        self.direction() == Direction::Maximize
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions() {
        assert_eq!(MetricKind::Score.direction(), Direction::Maximize);
        assert_eq!(MetricKind::Novel.direction(), Direction::Maximize);
        assert_eq!(MetricKind::ValidationNll.direction(), Direction::Minimize);
    }

    #[test]
    fn test_tie_breaks_are_asymmetric() {
        assert!(Direction::Maximize.improves(0.5, 0.5));
        assert!(!Direction::Minimize.improves(0.5, 0.5));
        assert!(Direction::Minimize.improves(0.4, 0.5));
    }

    #[test]
    fn test_nan_never_improves() {
        assert!(!Direction::Maximize.improves(f64::NAN, 0.0));
        assert!(!Direction::Minimize.improves(f64::NAN, MINIMIZE_SENTINEL));
    }

    #[test]
    fn test_initial_best() {
        assert_eq!(Direction::Maximize.initial_best(), 0.0);
        assert_eq!(Direction::Minimize.initial_best(), MINIMIZE_SENTINEL);
    }

    #[test]
    fn test_serde_names() {
        let kind: MetricKind = serde_json::from_str("\"nll_val\"").unwrap();
        assert_eq!(kind, MetricKind::ValidationNll);
        assert_eq!(serde_json::to_string(&MetricKind::Score).unwrap(), "\"score\"");
    }
}
