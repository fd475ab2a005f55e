use std::{env, fmt::Display, str::FromStr};

use log::*;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`. If it is missing, the default is used silently. If it is set
/// but cannot be parsed, an error is logged and the default is used.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

/// Reads a string environment variable that has no sensible default. A warning is logged if it is missing, and an
/// empty string is returned.
pub fn required_env(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("🪛️ {name} is not set. Requests that depend on it will fail.");
        String::default()
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("Yes".into()), false));
        assert!(parse_boolean_flag(Some(" 1 ".into()), false));
        assert!(!parse_boolean_flag(Some("off".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn env_values_fall_back_to_default() {
        env::set_var("MICROPAY_TEST_HELPER_PORT", "not-a-port");
        assert_eq!(env_or_default::<u16>("MICROPAY_TEST_HELPER_PORT", 8360), 8360);
        env::set_var("MICROPAY_TEST_HELPER_PORT", " 9000 ");
        assert_eq!(env_or_default::<u16>("MICROPAY_TEST_HELPER_PORT", 8360), 9000);
        env::remove_var("MICROPAY_TEST_HELPER_PORT");
        assert_eq!(env_or_default::<u16>("MICROPAY_TEST_HELPER_PORT", 8360), 8360);
    }
}
