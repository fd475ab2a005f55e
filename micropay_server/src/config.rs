use gateway_tools::{CircleConfig, StripeConfig};
use log::*;
use micropay_common::{
    helpers::{env_or_default, parse_boolean_flag},
    Amount,
    DEFAULT_CURRENCY,
};
use micropay_engine::{sqlite::DEFAULT_RESERVATION_WINDOW_MINS, PricingConfig, RechargePolicy};

const DEFAULT_MICROPAY_HOST: &str = "127.0.0.1";
const DEFAULT_MICROPAY_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/micropay.db";
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 60;
/// A day. Anything longer would tie up liquidity for payments that are never coming.
pub const MAX_RESERVATION_WINDOW_MINS: i64 = 24 * 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply pending database migrations at startup
    pub run_migrations: bool,
    pub pricing: PricingConfig,
    pub policy: RechargePolicy,
    /// How long a reservation holds treasury liquidity before it lapses
    pub reservation_window_mins: i64,
    /// How often the reaper deletes lapsed reservations
    pub reaper_interval_secs: u64,
    pub stripe: StripeConfig,
    pub circle: CircleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MICROPAY_HOST.to_string(),
            port: DEFAULT_MICROPAY_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            pricing: PricingConfig::default(),
            policy: RechargePolicy::default(),
            reservation_window_mins: DEFAULT_RESERVATION_WINDOW_MINS,
            reaper_interval_secs: DEFAULT_REAPER_INTERVAL_SECS,
            stripe: StripeConfig::default(),
            circle: CircleConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_or_default("MICROPAY_HOST", DEFAULT_MICROPAY_HOST.to_string());
        let port = env_or_default("MICROPAY_PORT", DEFAULT_MICROPAY_PORT);
        let database_url = env_or_default("MICROPAY_DATABASE_URL", DEFAULT_DATABASE_URL.to_string());
        let run_migrations = parse_boolean_flag(std::env::var("MICROPAY_RUN_MIGRATIONS").ok(), true);
        let pricing = pricing_from_env();
        let policy = policy_from_env();
        let reservation_window_mins = reservation_window_or_default(env_or_default(
            "MICROPAY_RESERVATION_WINDOW_MINS",
            DEFAULT_RESERVATION_WINDOW_MINS,
        ));
        let reaper_interval_secs =
            env_or_default("MICROPAY_REAPER_INTERVAL_SECS", DEFAULT_REAPER_INTERVAL_SECS).max(1);
        let stripe = StripeConfig::new_from_env_or_default();
        let circle = CircleConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            run_migrations,
            pricing,
            policy,
            reservation_window_mins,
            reaper_interval_secs,
            stripe,
            circle,
        }
    }
}

fn reservation_window_or_default(window: i64) -> i64 {
    if (1..=MAX_RESERVATION_WINDOW_MINS).contains(&window) {
        window
    } else {
        error!(
            "🪛️ A reservation window of {window} minutes is not allowed. It must be between 1 and \
             {MAX_RESERVATION_WINDOW_MINS}. Using {DEFAULT_RESERVATION_WINDOW_MINS}."
        );
        DEFAULT_RESERVATION_WINDOW_MINS
    }
}

fn pricing_from_env() -> PricingConfig {
    let d = PricingConfig::default();
    PricingConfig {
        price_per_asset_unit: env_or_default("MICROPAY_PRICE_PER_USDC", d.price_per_asset_unit),
        units_per_asset_unit: env_or_default("MICROPAY_UNITS_PER_USDC", d.units_per_asset_unit),
        fee_percent: env_or_default("MICROPAY_FEE_PERCENT", d.fee_percent),
        tax_rate: env_or_default("MICROPAY_TAX_RATE", d.tax_rate),
        gateway_rate_fee: env_or_default("MICROPAY_GATEWAY_RATE_FEE", d.gateway_rate_fee),
        gateway_fixed_fee: env_or_default("MICROPAY_GATEWAY_FIXED_FEE", d.gateway_fixed_fee),
    }
}

fn policy_from_env() -> RechargePolicy {
    let d = RechargePolicy::default();
    let safety_margin = env_or_default::<Amount>("MICROPAY_SAFETY_MARGIN", d.safety_margin);
    let currency = env_or_default("MICROPAY_CURRENCY", DEFAULT_CURRENCY.to_string()).to_ascii_lowercase();
    if safety_margin.is_negative() {
        error!("🪛️ MICROPAY_SAFETY_MARGIN cannot be negative. Using {}.", d.safety_margin);
        return RechargePolicy { safety_margin: d.safety_margin, currency };
    }
    RechargePolicy { safety_margin, currency }
}

#[cfg(test)]
mod test {
    use std::env;

    use micropay_common::Decimal;

    use super::*;

    #[test]
    fn config_from_env() {
        env::set_var("MICROPAY_PORT", "9100");
        env::set_var("MICROPAY_FEE_PERCENT", "0.05");
        env::set_var("MICROPAY_SAFETY_MARGIN", "-1");
        env::set_var("MICROPAY_CURRENCY", "USD");
        env::set_var("MICROPAY_RESERVATION_WINDOW_MINS", "0");
        env::set_var("MICROPAY_RUN_MIGRATIONS", "false");
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.port, 9100);
        assert_eq!(config.pricing.fee_percent, Decimal::new(5, 2));
        assert_eq!(config.pricing.tax_rate, Decimal::new(20, 2));
        assert_eq!(config.policy.safety_margin, RechargePolicy::default().safety_margin);
        assert_eq!(config.policy.currency, "usd");
        assert_eq!(config.reservation_window_mins, DEFAULT_RESERVATION_WINDOW_MINS);
        assert!(!config.run_migrations);
        for name in [
            "MICROPAY_PORT",
            "MICROPAY_FEE_PERCENT",
            "MICROPAY_SAFETY_MARGIN",
            "MICROPAY_CURRENCY",
            "MICROPAY_RESERVATION_WINDOW_MINS",
            "MICROPAY_RUN_MIGRATIONS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn reservation_window_bounds() {
        assert_eq!(reservation_window_or_default(1), 1);
        assert_eq!(reservation_window_or_default(90), 90);
        assert_eq!(reservation_window_or_default(MAX_RESERVATION_WINDOW_MINS), MAX_RESERVATION_WINDOW_MINS);
        for window in [0, -5, MAX_RESERVATION_WINDOW_MINS + 1, i64::MAX / 60_000, i64::MAX, i64::MIN] {
            let accepted = reservation_window_or_default(window);
            assert_eq!(accepted, DEFAULT_RESERVATION_WINDOW_MINS, "window of {window} minutes");
            // Whatever is accepted must be usable as a duration
            assert!(chrono::Duration::try_minutes(accepted).is_some());
        }
    }
}
