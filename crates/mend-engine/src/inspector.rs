//! Execution outcome classification.
//!
//! A result is Empty when it has zero rows, a null scalar, or a numeric
//! zero. Treating zero as empty is deliberate business logic carried over
//! from the source system: at this layer a metric legitimately reporting
//! zero is indistinguishable from a broken query. The raw observed value
//! is still exposed so callers can record a genuine zero distinctly.

use mend_backend::{BackendError, ExecutionOutcome, ResultSet, ScalarValue};

/// Classify one raw execution result.
pub fn classify(result: &Result<ResultSet, BackendError>) -> ExecutionOutcome {
    let rows = match result {
        Ok(set) => &set.rows,
        Err(e) => return ExecutionOutcome::Error(e.to_string()),
    };

    match rows.first() {
        None => ExecutionOutcome::Empty,
        Some(value) if looks_empty(value) => ExecutionOutcome::Empty,
        Some(value) => ExecutionOutcome::Success(value.clone()),
    }
}

/// The first scalar the backend returned, regardless of classification.
/// This is how a genuine zero survives the zero-looks-like-failure policy.
pub fn observed_value(result: &Result<ResultSet, BackendError>) -> Option<ScalarValue> {
    result.as_ref().ok().and_then(|set| set.rows.first().cloned())
}

fn looks_empty(value: &ScalarValue) -> bool {
    match value {
        ScalarValue::Null => true,
        ScalarValue::Number(n) => *n == 0.0,
        ScalarValue::Text(s) => s.trim().is_empty() || s.trim() == "0",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_is_empty() {
        assert_eq!(classify(&Ok(ResultSet::empty())), ExecutionOutcome::Empty);
    }

    #[test]
    fn null_scalar_is_empty() {
        assert_eq!(
            classify(&Ok(ResultSet::scalar(ScalarValue::Null))),
            ExecutionOutcome::Empty
        );
    }

    #[test]
    fn numeric_zero_is_empty_but_still_observable() {
        let result = Ok(ResultSet::number(0.0));
        assert_eq!(classify(&result), ExecutionOutcome::Empty);
        assert_eq!(observed_value(&result), Some(ScalarValue::Number(0.0)));
    }

    #[test]
    fn nonzero_value_is_success() {
        assert_eq!(
            classify(&Ok(ResultSet::number(42.0))),
            ExecutionOutcome::Success(ScalarValue::Number(42.0))
        );
    }

    #[test]
    fn driver_failure_is_error() {
        let result: Result<ResultSet, BackendError> =
            Err(BackendError::connection_failed("login timeout"));
        assert!(classify(&result).is_error());
        assert_eq!(observed_value(&result), None);
    }
}
