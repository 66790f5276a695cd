//! Pricing quotes for vault builds
//!
//! Billing is per started GiB with a floor of 1. The fee constants are demo
//! values and must stay injectable through [`PlanConfig`], never hardcoded at
//! call sites. Quotes keep their raw floating components so repeated
//! recomputation while the user edits the vault does not compound rounding
//! error; rounding to two decimals happens only at display time.

use serde::{Deserialize, Serialize};

/// One billed gigabyte, in bytes
pub const BYTES_PER_GB: u64 = 1 << 30;

/// Billing plan parameters
///
/// Loaded from configuration; see `Config::from_env`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Plan display name
    pub name: String,

    /// One-time tokenization fee per billed GB
    pub tokenization_fee_per_gb: f64,

    /// Yearly storage fee per billed GB
    pub storage_fee_per_gb_year: f64,

    /// Years of storage pre-paid into escrow
    pub escrow_years: u32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            name: "standard".to_string(),
            tokenization_fee_per_gb: 12.0,
            storage_fee_per_gb_year: 4.0,
            escrow_years: 10,
        }
    }
}

/// A derived pricing quote
///
/// Never persisted on its own; recomputed whenever total bytes or plan
/// parameters change. Monetary fields are raw f64 components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    /// Billed size: ceiling of total bytes over 2^30, floor 1
    pub billed_gb: u64,

    /// One-time tokenization fee (raw, un-rounded)
    pub tokenization_fee: f64,

    /// Storage fee across the escrow period (raw, un-rounded)
    pub storage_fee: f64,

    /// Sum of the fee components (raw, un-rounded)
    pub subtotal: f64,

    /// Human-readable notes about how the quote was derived
    pub notes: Vec<String>,
}

impl PricingQuote {
    /// Subtotal rounded to two decimals for display
    pub fn display_subtotal(&self) -> f64 {
        round2(self.subtotal)
    }

    /// Copy of this quote with all monetary fields rounded for display.
    ///
    /// Used when freezing the economic preview into a manifest; live quotes
    /// keep the raw components.
    pub fn for_display(&self) -> PricingQuote {
        PricingQuote {
            billed_gb: self.billed_gb,
            tokenization_fee: round2(self.tokenization_fee),
            storage_fee: round2(self.storage_fee),
            subtotal: round2(self.subtotal),
            notes: self.notes.clone(),
        }
    }
}

/// Billed GB for a byte total: `max(1, ceil(bytes / 2^30))`
pub fn billed_gb(total_bytes: u64) -> u64 {
    total_bytes.div_ceil(BYTES_PER_GB).max(1)
}

/// Compute a quote for the given byte total under a plan
pub fn quote(total_bytes: u64, plan: &PlanConfig) -> PricingQuote {
    let gb = billed_gb(total_bytes);
    let tokenization_fee = gb as f64 * plan.tokenization_fee_per_gb;
    let storage_fee = gb as f64 * plan.storage_fee_per_gb_year * f64::from(plan.escrow_years);

    PricingQuote {
        billed_gb: gb,
        tokenization_fee,
        storage_fee,
        subtotal: tokenization_fee + storage_fee,
        notes: vec![
            format!("{} bytes billed as {} GB", total_bytes, gb),
            format!(
                "plan '{}': {} years of storage in escrow",
                plan.name, plan.escrow_years
            ),
        ],
    }
}

/// Round to two decimal places (display only)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
