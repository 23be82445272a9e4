//! Config subcommand handlers.

use std::path::Path;

use dialoguer::{Confirm, Input, Select};

use aptrack_config::{AccessPointSection, MQTT_TARGET, MqttSection, PRIMARY_TARGET};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_text(prompt: &str, default: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(prompt)
        .default(default.to_owned())
        .interact_text()
        .map_err(prompt_err)
}

/// Free-text prompt where an empty answer means "not set".
fn prompt_optional(prompt: &str) -> Result<Option<String>, CliError> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    Ok(Some(value.trim().to_owned()).filter(|v| !v.is_empty()))
}

fn prompt_secret(label: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(format!("{label}: ")).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: label.to_lowercase(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    target: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        aptrack_config::store_password(target, secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

/// Prompt for one access point section and its password.
fn prompt_access_point(primary: bool, default_url: &str) -> Result<AccessPointSection, CliError> {
    let name = if primary {
        None
    } else {
        prompt_optional("Repeater name (empty: derived from host)")?
    };
    let mut section = AccessPointSection {
        name,
        url: prompt_text("TR-064 URL", default_url)?,
        username: prompt_text("Username", "admin")?,
        ..AccessPointSection::default()
    };

    let target = section.credential_target(primary);
    let password = prompt_secret("Password")?;
    section.password = prompt_keyring_storage(&password, &target, "password")?;
    Ok(section)
}

fn write_example(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::FileExists {
            path: path.display().to_string(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config::example_config())?;
    Ok(())
}

/// Every credential target the configuration knows about.
fn credential_targets(cfg: &Config) -> Vec<String> {
    [MQTT_TARGET.to_owned(), PRIMARY_TARGET.to_owned()]
        .into_iter()
        .chain(cfg.repeaters.iter().map(|r| r.credential_target(false)))
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_file(global);
            eprintln!("aptrack configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. MQTT broker
            let defaults = MqttSection::default();
            let host = prompt_text("MQTT broker host", &defaults.host)?;
            let port = prompt_text("MQTT port", &defaults.port.to_string())?;
            let mut mqtt = MqttSection {
                host,
                port: port.parse().map_err(|_| CliError::Validation {
                    field: "mqtt.port".into(),
                    reason: format!("not a port number: {port}"),
                })?,
                username: prompt_optional("MQTT username (empty: anonymous)")?,
                ..defaults
            };
            if mqtt.username.is_some() {
                let password = prompt_secret("MQTT password")?;
                mqtt.password = prompt_keyring_storage(&password, MQTT_TARGET, "MQTT password")?;
            }

            // 2. Primary access point
            eprintln!("\n   Fritz!Box");
            let primary = prompt_access_point(true, "http://fritz.box:49000")?;

            // 3. Repeaters
            let mut repeaters = Vec::new();
            while Confirm::new()
                .with_prompt("Add a repeater?")
                .default(false)
                .interact()
                .map_err(prompt_err)?
            {
                repeaters.push(prompt_access_point(false, "http://fritz.repeater:49000")?);
            }

            let cfg = Config {
                mqtt,
                primary,
                repeaters,
                ..Config::default()
            };

            config::save_config_to(&cfg, &config_path)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("\n  Test it: aptrack status show");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load(global)?.redacted();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unprintable: {e}>")),
                |_| config::config_file(global).display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Generate <file> ─────────────────────────────────────────
        ConfigCommand::Generate { file, force } => {
            write_example(&file, force)?;
            if !global.quiet {
                eprintln!("✓ Example configuration written to {}", file.display());
            }
            Ok(())
        }

        // ── SetPassword <target> ────────────────────────────────────
        ConfigCommand::SetPassword { target } => {
            let cfg = config::load(global)?;
            if target != MQTT_TARGET && cfg.access_point(&target).is_none() {
                return Err(CliError::UnknownTarget {
                    target,
                    available: credential_targets(&cfg).join(", "),
                });
            }

            let secret = prompt_secret("Password")?;
            aptrack_config::store_password(&target, &secret)?;
            eprintln!("✓ Password for '{target}' stored in system keyring");
            Ok(())
        }
    }
}
