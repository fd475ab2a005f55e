//! # Pricing engine
//!
//! Converts a requested number of credit units into an itemised, tax-compliant quote. This is the only place where the
//! service fee, the tax rate and the card processor's fee schedule are applied.
//!
//! All arithmetic is fixed-point ([`Decimal`]). Each fee layer is rounded to cents, half away from zero, before the
//! next layer is computed, so the rounding steps are part of the contract:
//!
//! 1. `usdc_value = units / units_per_asset_unit`
//! 2. `base = usdc_value * price_per_asset_unit`
//! 3. `service_fee = round(base * fee_percent)`
//! 4. `tax = round(service_fee * tax_rate)`
//! 5. `net_required = base + service_fee + tax`
//! 6. `grand_total = round((net_required + gateway_fixed_fee) / (1 - gateway_rate_fee))`
//! 7. `gateway_fee = grand_total - net_required`
use micropay_common::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("At least 1 unit must be requested. Got {0}.")]
    InvalidUnits(i64),
    #[error("Invalid pricing configuration. {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fiat price of one liquidity-asset unit (1 USDC)
    pub price_per_asset_unit: Decimal,
    /// How many credit units one USDC buys
    pub units_per_asset_unit: Decimal,
    /// Service fee, as a fraction of the base price
    pub fee_percent: Decimal,
    /// Tax rate applied to the service fee only
    pub tax_rate: Decimal,
    /// The card processor's percentage fee, as a fraction of the total charged
    pub gateway_rate_fee: Decimal,
    /// The card processor's fixed fee per charge
    pub gateway_fixed_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_asset_unit: Decimal::new(100, 2),
            units_per_asset_unit: Decimal::new(10, 0),
            fee_percent: Decimal::new(3, 2),
            tax_rate: Decimal::new(20, 2),
            gateway_rate_fee: Decimal::new(15, 3),
            gateway_fixed_fee: Decimal::new(25, 2),
        }
    }
}

/// An itemised price for a recharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub units: i64,
    pub usdc_value: Amount,
    pub base: Amount,
    pub service_fee: Amount,
    pub tax: Amount,
    pub net_required: Amount,
    pub gateway_fee: Amount,
    pub grand_total: Amount,
}

#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self { config: PricingConfig::default() }
    }
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        if config.units_per_asset_unit <= Decimal::ZERO {
            return Err(PricingError::InvalidConfiguration(format!(
                "units_per_asset_unit must be positive, but is {}",
                config.units_per_asset_unit
            )));
        }
        if config.gateway_rate_fee >= Decimal::ONE || config.gateway_rate_fee < Decimal::ZERO {
            return Err(PricingError::InvalidConfiguration(format!(
                "gateway_rate_fee must be in the range [0, 1), but is {}",
                config.gateway_rate_fee
            )));
        }
        let negative = [config.price_per_asset_unit, config.fee_percent, config.tax_rate, config.gateway_fixed_fee]
            .iter()
            .any(|v| v.is_sign_negative() && !v.is_zero());
        if negative {
            return Err(PricingError::InvalidConfiguration("Prices, fees and rates cannot be negative".into()));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn calculate(&self, units: i64) -> Result<Quote, PricingError> {
        if units <= 0 {
            return Err(PricingError::InvalidUnits(units));
        }
        let c = &self.config;
        let usdc_value = Amount::new(Decimal::from(units) / c.units_per_asset_unit);
        let base = usdc_value * c.price_per_asset_unit;
        let service_fee = (base * c.fee_percent).round_currency();
        let tax = (service_fee * c.tax_rate).round_currency();
        let net_required = base + service_fee + tax;
        let gross = (net_required.value() + c.gateway_fixed_fee) / (Decimal::ONE - c.gateway_rate_fee);
        let grand_total = Amount::new(gross).round_currency();
        let gateway_fee = grand_total - net_required;
        Ok(Quote { units, usdc_value, base, service_fee, tax, net_required, gateway_fee, grand_total })
    }
}
