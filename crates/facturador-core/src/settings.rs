//! # Tax Settings
//!
//! Jurisdictional constants, injected into the engine at construction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Setting                     Default   Used by                          │
//! │  ──────────────────────────  ───────   ──────────────────────────────── │
//! │  igv_rate                    18%       line sale_base/igv, gravada/igv  │
//! │  detraccion_operation_code   0112      regime resolver, validation      │
//! │  regime_threshold            700.00    retención proposal, detracción   │
//! │  retencion_rate              3%        retención amount                 │
//! │  installment_tolerance       0.01      installment sum law              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::TaxRate;

/// IGV rate in basis points (18%).
pub const IGV_RATE_BPS: u32 = 1800;

/// Operation-type code that subjects a sale to detracción.
pub const DETRACCION_OPERATION_CODE: &str = "0112";

/// Minimum adjusted total (soles) for detracción and retención.
pub const REGIME_THRESHOLD_UNITS: i64 = 700;

/// Retención rate in basis points (3%).
pub const RETENCION_RATE_BPS: u32 = 300;

/// Installment sum tolerance in cents.
pub const INSTALLMENT_TOLERANCE_CENTS: i64 = 1;

/// Tax configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSettings {
    #[serde(rename = "igv_rate_bps")]
    pub igv_rate: TaxRate,

    pub detraccion_operation_code: String,

    pub regime_threshold: Money,

    #[serde(rename = "retencion_rate_bps")]
    pub retencion_rate: TaxRate,

    pub installment_tolerance: Money,
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            igv_rate: TaxRate::from_bps(IGV_RATE_BPS),
            detraccion_operation_code: DETRACCION_OPERATION_CODE.to_string(),
            regime_threshold: Money::from_units(REGIME_THRESHOLD_UNITS),
            retencion_rate: TaxRate::from_bps(RETENCION_RATE_BPS),
            installment_tolerance: Money::from_cents(INSTALLMENT_TOLERANCE_CENTS),
        }
    }
}

impl TaxSettings {
    /// True when `code` is the detracción operation code.
    pub fn is_detraccion_operation(&self, code: Option<&str>) -> bool {
        code.map(str::trim) == Some(self.detraccion_operation_code.as_str())
    }

    /// True when `total` reaches the detracción/retención threshold.
    pub fn meets_threshold(&self, total: Money) -> bool {
        total >= self.regime_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TaxSettings::default();
        assert_eq!(settings.igv_rate.bps(), 1800);
        assert_eq!(settings.detraccion_operation_code, "0112");
        assert_eq!(settings.regime_threshold, Money::from_units(700));
        assert_eq!(settings.retencion_rate.bps(), 300);
        assert_eq!(settings.installment_tolerance, Money::from_cents(1));
    }

    #[test]
    fn test_detraccion_operation() {
        let settings = TaxSettings::default();
        assert!(settings.is_detraccion_operation(Some("0112")));
        assert!(settings.is_detraccion_operation(Some(" 0112 ")));
        assert!(!settings.is_detraccion_operation(Some("0101")));
        assert!(!settings.is_detraccion_operation(None));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let settings = TaxSettings::default();
        assert!(settings.meets_threshold(Money::from_units(700)));
        assert!(!settings.meets_threshold(Money::from_cents(69999)));
    }
}
