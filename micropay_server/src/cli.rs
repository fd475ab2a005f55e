use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 24] = [
        "RUST_LOG",
        "MICROPAY_HOST",
        "MICROPAY_PORT",
        "MICROPAY_DATABASE_URL",
        "MICROPAY_RUN_MIGRATIONS",
        "MICROPAY_PRICE_PER_USDC",
        "MICROPAY_UNITS_PER_USDC",
        "MICROPAY_FEE_PERCENT",
        "MICROPAY_TAX_RATE",
        "MICROPAY_GATEWAY_RATE_FEE",
        "MICROPAY_GATEWAY_FIXED_FEE",
        "MICROPAY_SAFETY_MARGIN",
        "MICROPAY_RESERVATION_WINDOW_MINS",
        "MICROPAY_REAPER_INTERVAL_SECS",
        "MICROPAY_CURRENCY",
        "MICROPAY_STRIPE_API_URL",
        "MICROPAY_STRIPE_WEBHOOK_TOLERANCE_SECS",
        "MICROPAY_CIRCLE_BASE_URL",
        "MICROPAY_CIRCLE_MASTER_WALLET_ID",
        "MICROPAY_CIRCLE_USDC_TOKEN_ID",
        "MICROPAY_CIRCLE_WALLET_SET_ID",
        "MICROPAY_CIRCLE_BLOCKCHAIN",
        "MICROPAY_CIRCLE_ACCOUNT_TYPE",
        "MICROPAY_HTTP_TIMEOUT_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<40} {val:<15}");
    })
}
