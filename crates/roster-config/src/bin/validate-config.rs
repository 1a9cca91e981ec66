//! Config validation CLI tool
//!
//! Validates a rosterd configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: validate-config <config-file>");
            eprintln!();
            eprintln!("Validates a rosterd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config /etc/rosterd/config.toml");
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!(
            "Error: Configuration file not found: {}",
            config_path.display()
        );
        return ExitCode::from(1);
    }

    match roster_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!(
                "  Config version: {}",
                roster_config::CURRENT_CONFIG_VERSION
            );
            println!("  Templates: {}", config.catalog.len());
            println!(
                "  Check-in buffer: ±{}m (±{}m for shifts ≤ {}m)",
                config.policy.checkin_buffer_minutes,
                config.policy.short_shift_buffer_minutes,
                config.policy.short_shift_max_minutes
            );
            println!(
                "  Checkout window: -{}m / +{}m around shift end",
                config.policy.early_departure_tolerance_minutes,
                config.policy.late_checkout_grace_minutes
            );

            if !config.catalog.is_empty() {
                println!();
                println!("Templates:");
                for template in config.catalog.iter() {
                    let span = if template.wraps_midnight() {
                        format!("{} - {} (+1d)", template.start, template.end)
                    } else {
                        format!("{} - {}", template.start, template.end)
                    };
                    println!("  - {} [{}]: {}", template.id.as_str(), span, template.name);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                roster_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                roster_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                roster_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                roster_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        roster_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
