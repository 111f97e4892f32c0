//! Common result types crossing the executor boundary.

use serde::{Deserialize, Serialize};

/// A single scalar cell returned by a metric query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
    Null,
}

impl ScalarValue {
    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            ScalarValue::Null => None,
        }
    }
}

/// Raw rows returned by the executor for one query.
///
/// Metric queries select a single aliased scalar, so a row is one cell;
/// multi-row results are kept so the inspector can tell "no rows" from
/// "one null row".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub rows: Vec<ScalarValue>,
}

impl ResultSet {
    /// An empty result set (zero rows).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-row scalar result.
    pub fn scalar(value: ScalarValue) -> Self {
        Self { rows: vec![value] }
    }

    /// A single-row numeric result.
    pub fn number(n: f64) -> Self {
        Self::scalar(ScalarValue::Number(n))
    }
}

/// Classified outcome of one execution, as seen by the repair loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// Query returned a usable, non-empty value.
    Success(ScalarValue),
    /// Query ran but returned no rows, a null, or a numeric zero.
    Empty,
    /// Driver or network failure; never repaired.
    Error(String),
}

impl ExecutionOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ExecutionOutcome::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error(_))
    }

    /// The carried value, for `Success` outcomes.
    pub fn value(&self) -> Option<&ScalarValue> {
        match self {
            ExecutionOutcome::Success(v) => Some(v),
            _ => None,
        }
    }
}
