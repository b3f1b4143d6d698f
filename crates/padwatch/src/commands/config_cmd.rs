//! Config subcommand handlers.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::PathBuf;

use dialoguer::Input;

use padwatch_core::RemediationPolicy;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util;
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display. Expects secrets to be masked already.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "fleet_url = \"{}\"", p.fleet_url);
        let _ = writeln!(out, "owner = \"{}\"", p.owner);
        let _ = writeln!(out, "gateway_url = \"{}\"", p.gateway_url);
        let _ = writeln!(out, "token_url = \"{}\"", p.token_url);
        let _ = writeln!(out, "client_id = \"{}\"", p.client_id);
        for (key, value) in [
            ("api_key", p.api_key.as_deref()),
            ("api_key_env", p.api_key_env.as_deref()),
            ("client_secret", p.client_secret.as_deref()),
            ("client_secret_env", p.client_secret_env.as_deref()),
        ] {
            if let Some(v) = value {
                let _ = writeln!(out, "{key} = \"{v}\"");
            }
        }
        for (key, value) in [
            ("serial_map", p.serial_map.as_ref()),
            ("state_dir", p.state_dir.as_ref()),
            ("token_cache", p.token_cache.as_ref()),
            ("status_file", p.status_file.as_ref()),
            ("log_dir", p.log_dir.as_ref()),
            ("ca_cert", p.ca_cert.as_ref()),
        ] {
            if let Some(v) = value {
                let _ = writeln!(out, "{key} = \"{}\"", v.display());
            }
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(lifetime) = p.token_lifetime {
            let _ = writeln!(out, "token_lifetime = {lifetime}");
        }
        let _ = writeln!(out, "\n[profiles.{name}.policy]");
        let _ = writeln!(
            out,
            "occurrences_before_action = {}",
            p.policy.occurrences_before_action
        );
        let _ = writeln!(
            out,
            "strict_serial_required = {}",
            p.policy.strict_serial_required
        );
        let _ = writeln!(out, "gateway_attempts = {}", p.policy.gateway_attempts);
    }

    out
}

fn redact(cfg: &mut Config) {
    for p in cfg.profiles.values_mut() {
        if p.api_key.is_some() {
            p.api_key = Some(MASK.into());
        }
        if p.client_secret.is_some() {
            p.client_secret = Some(MASK.into());
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn ask(prompt: &str, default: Option<&str>) -> Result<String, CliError> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        input = input.default(d.to_owned());
    }
    input.interact_text().map_err(prompt_err)
}

fn ask_optional(prompt: &str) -> Result<Option<String>, CliError> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    Ok(Some(value.trim().to_owned()).filter(|v| !v.is_empty()))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Show => {
            let path = config::config_path(global);
            if !path.exists() {
                return Err(CliError::NoConfig {
                    path: path.display().to_string(),
                });
            }
            let mut cfg = config::load(global)?;
            redact(&mut cfg);
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                let mut names: Vec<_> = c.profiles.keys().cloned().collect();
                names.sort();
                names.join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "interactive".into(),
            reason: "config init needs a terminal; edit the config file directly instead".into(),
        });
    }

    let path = config::config_path(global);
    eprintln!("padwatch configuration");
    eprintln!("   Config path: {}\n", path.display());

    let mut cfg = if path.exists() {
        config::load(global)?
    } else {
        Config::default()
    };

    let name = ask("Profile name", Some("default"))?;
    if cfg.profiles.contains_key(&name)
        && !util::confirm(&format!("Profile '{name}' exists. Replace it?"), global.yes)?
    {
        return Ok(());
    }

    let profile = Profile {
        fleet_url: ask("Fleet API URL", None)?,
        owner: ask("Owner (fleet scope)", None)?,
        api_key: None,
        api_key_env: Some(ask("Env var holding the fleet API key", Some("PADWATCH_API_KEY"))?),
        gateway_url: ask("Gateway URL", None)?,
        token_url: ask("Token endpoint URL", None)?,
        client_id: ask("OAuth client id", None)?,
        client_secret: None,
        client_secret_env: Some(ask(
            "Env var holding the OAuth client secret",
            Some("PADWATCH_CLIENT_SECRET"),
        )?),
        serial_map: ask_optional("Serial map CSV (blank to skip)")?.map(PathBuf::from),
        state_dir: None,
        token_cache: None,
        token_lifetime: None,
        status_file: None,
        log_dir: None,
        ca_cert: None,
        insecure: None,
        timeout: None,
        policy: RemediationPolicy::default(),
    };

    if cfg.profiles.is_empty() || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.clone());
    }
    cfg.profiles.insert(name.clone(), profile);
    config::save_config_to(&cfg, &path)?;

    eprintln!("\n   Saved profile '{name}' to {}", path.display());
    eprintln!("   Secrets are read from the env vars above or the system keyring");
    eprintln!("   (service 'padwatch', entries '{name}/api-key' and '{name}/client-secret').");
    Ok(())
}
