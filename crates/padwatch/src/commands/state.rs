//! `padwatch state`: inspect and reset persisted debounce records.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;
use tracing::info;

use padwatch_core::{ConditionKind, DebounceKey, DebouncePhase, DebounceStore, FileStore};

use crate::cli::{GlobalOpts, StateArgs, StateCommand};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::lock::CycleLock;
use crate::output;

#[derive(Debug, Serialize)]
struct StateEntry {
    device: String,
    condition: ConditionKind,
    occurrence_count: u32,
    remediated: bool,
    phase: DebouncePhase,
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Phase")]
    phase: String,
}

fn row(e: &StateEntry) -> StateRow {
    StateRow {
        device: e.device.clone(),
        condition: e.condition.to_string(),
        count: e.occurrence_count,
        phase: e.phase.to_string(),
    }
}

pub fn handle(args: StateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let (profile_name, profile) = config::active_profile(global, &cfg)?;
    let state_dir = profile.state_dir(profile_name);

    match args.command {
        StateCommand::List => {
            let store = FileStore::open(&state_dir)?;
            let threshold = profile.policy.occurrences_before_action;
            let entries: Vec<StateEntry> = store
                .entries()?
                .into_iter()
                .map(|(key, record)| StateEntry {
                    phase: DebouncePhase::of(Some(&record), threshold),
                    device: key.device,
                    condition: key.condition,
                    occurrence_count: record.occurrence_count,
                    remediated: record.remediated,
                })
                .collect();

            let out = output::render_list(&global.output, &entries, row, |e| {
                format!("{}/{}", e.device, e.condition)
            })?;
            output::print_output(&out, global.quiet);
        }

        StateCommand::Clear { device, condition } => {
            let mut lock = CycleLock::open(&state_dir)?;
            let _guard = lock.try_acquire()?;
            let store = FileStore::open(&state_dir)?;

            let conditions: Vec<ConditionKind> = match condition {
                Some(c) => vec![util::condition_kind(c)],
                None => ConditionKind::iter().collect(),
            };

            let mut present = Vec::new();
            for c in conditions {
                let key = DebounceKey::new(device.as_str(), c);
                if store.get(&key)?.is_some() {
                    present.push(key);
                }
            }
            if present.is_empty() {
                return Err(CliError::NotFound {
                    resource_type: "debounce record".into(),
                    identifier: device,
                    list_command: "state list".into(),
                });
            }

            let prompt = format!("Clear {} record(s) for '{device}'?", present.len());
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            for key in &present {
                store.clear(key)?;
                info!(%key, "debounce record cleared");
            }
            output::print_output(
                &format!("Cleared {} record(s) for '{device}'", present.len()),
                global.quiet,
            );
        }
    }
    Ok(())
}
