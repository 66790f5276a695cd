//! Endowment locks
//!
//! An endowment is an optional USD amount attached to a vault at commit time.
//! The USD-to-unit conversion rate is read exactly once, when the lock is
//! created; a locked endowment is never revalued against later rates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the point-in-time USD-to-unit conversion rate
pub trait RateSource: Send + Sync {
    /// Current conversion rate in USD per unit; must be finite and positive
    fn usd_per_unit(&self) -> Result<f64, EndowmentError>;
}

/// Rate source backed by a fixed configured value
#[derive(Debug, Clone)]
pub struct FixedRate(pub f64);

impl RateSource for FixedRate {
    fn usd_per_unit(&self) -> Result<f64, EndowmentError> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return Err(EndowmentError::InvalidRate(self.0));
        }
        Ok(self.0)
    }
}

/// Endowment errors
#[derive(Debug, thiserror::Error)]
pub enum EndowmentError {
    #[error("Endowment amount must be a non-negative finite number, got {0}")]
    InvalidAmount(f64),

    #[error("Conversion rate must be a positive finite number, got {0}")]
    InvalidRate(f64),

    #[error("Rate source unavailable: {0}")]
    RateUnavailable(String),
}

/// A locked endowment
///
/// Fields are private so a lock cannot be edited after creation; later rate
/// changes never retroactively alter the stored derived units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndowmentLock {
    usd: f64,
    usd_per_unit: f64,
    derived_units: f64,
    locked_at: DateTime<Utc>,
}

impl EndowmentLock {
    /// Lock a USD amount against the rate source's current rate.
    ///
    /// The rate is read once, here, and never again for this lock.
    pub fn lock(usd: f64, rates: &dyn RateSource) -> Result<Self, EndowmentError> {
        if !usd.is_finite() || usd < 0.0 {
            return Err(EndowmentError::InvalidAmount(usd));
        }

        let rate = rates.usd_per_unit()?;

        let lock = EndowmentLock {
            usd,
            usd_per_unit: rate,
            derived_units: usd / rate,
            locked_at: Utc::now(),
        };

        tracing::info!(
            usd = lock.usd,
            usd_per_unit = lock.usd_per_unit,
            derived_units = lock.derived_units,
            "Locked endowment"
        );

        Ok(lock)
    }

    pub fn usd(&self) -> f64 {
        self.usd
    }

    pub fn usd_per_unit(&self) -> f64 {
        self.usd_per_unit
    }

    pub fn derived_units(&self) -> f64 {
        self.derived_units
    }

    pub fn locked_at(&self) -> DateTime<Utc> {
        self.locked_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_derives_units() {
        let lock = EndowmentLock::lock(100.0, &FixedRate(2500.0)).unwrap();
        assert_eq!(lock.usd(), 100.0);
        assert_eq!(lock.usd_per_unit(), 2500.0);
        assert_eq!(lock.derived_units(), 0.04);
    }

    #[test]
    fn test_lock_is_immune_to_rate_changes() {
        let mut rate = FixedRate(2500.0);
        let lock = EndowmentLock::lock(100.0, &rate).unwrap();

        // Live rate moves after the lock is created
        rate.0 = 5000.0;
        let later = EndowmentLock::lock(100.0, &rate).unwrap();

        assert_eq!(lock.derived_units(), 0.04);
        assert_eq!(later.derived_units(), 0.02);
    }

    #[test]
    fn test_zero_usd_is_valid() {
        let lock = EndowmentLock::lock(0.0, &FixedRate(2500.0)).unwrap();
        assert_eq!(lock.derived_units(), 0.0);
    }

    #[test]
    fn test_rejects_bad_amounts() {
        assert!(matches!(
            EndowmentLock::lock(-1.0, &FixedRate(2500.0)),
            Err(EndowmentError::InvalidAmount(_))
        ));
        assert!(matches!(
            EndowmentLock::lock(f64::NAN, &FixedRate(2500.0)),
            Err(EndowmentError::InvalidAmount(_))
        ));
        assert!(matches!(
            EndowmentLock::lock(f64::INFINITY, &FixedRate(2500.0)),
            Err(EndowmentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(matches!(
            EndowmentLock::lock(10.0, &FixedRate(0.0)),
            Err(EndowmentError::InvalidRate(_))
        ));
        assert!(matches!(
            EndowmentLock::lock(10.0, &FixedRate(-2.0)),
            Err(EndowmentError::InvalidRate(_))
        ));
    }
}
