use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Exponential backoff parameters applied around every remote call.
///
/// Delays grow as `first_ms * factor^attempt` and are capped at `max_ms`.
/// No jitter is applied: the sequence is deterministic.
/// A retry loop gives up once the computed delay reaches `max_ms`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            first_ms: 100,
            max_ms: 120_000,
            factor: 2.0,
        }
    }
}

impl BackoffStrategy {
    /// Rejects a zero first delay, a ceiling below the first delay, and factors below 1.
    pub fn validate(&self) -> ModelResult<()> {
        if self.first_ms == 0 {
            return Err(ModelError::Invalid("backoff.first_ms must be positive".into()));
        }
        if self.max_ms < self.first_ms {
            return Err(ModelError::Invalid(
                "backoff.max_ms must not be lower than backoff.first_ms".into(),
            ));
        }
        if self.factor.is_nan() || self.factor < 1.0 {
            return Err(ModelError::Invalid("backoff.factor must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_startup_policy() {
        let s = BackoffStrategy::default();
        assert_eq!(s.first_ms, 100);
        assert_eq!(s.max_ms, 120_000);
        assert_eq!(s.factor, 2.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_inconsistent_bounds() {
        let bad = [
            BackoffStrategy { first_ms: 0, ..Default::default() },
            BackoffStrategy { first_ms: 500, max_ms: 100, factor: 2.0 },
            BackoffStrategy { factor: 0.5, ..Default::default() },
            BackoffStrategy { factor: f64::NAN, ..Default::default() },
        ];

        for s in bad {
            assert!(s.validate().is_err(), "expected {s:?} to be rejected");
        }
    }

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{"firstMs": 10, "maxMs": 80, "factor": 2.0}"#;
        let s: BackoffStrategy = serde_json::from_str(json).unwrap();
        assert_eq!(s.first_ms, 10);
        assert_eq!(s.max_ms, 80);
    }
}
