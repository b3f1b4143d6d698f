//! `padwatch serials`: inspect the display-name to serial mapping.

use serde::Serialize;
use tabled::Tabled;

use padwatch_core::SerialLookup;

use crate::cli::{GlobalOpts, SerialsArgs, SerialsCommand};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Mapping<'a> {
    name: &'a str,
    serial: &'a str,
}

#[derive(Tabled)]
struct MappingRow<'a> {
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Serial")]
    serial: &'a str,
}

pub fn handle(args: SerialsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let (_, profile) = config::active_profile(global, &cfg)?;
    let map = util::load_serials(profile)?;

    match args.command {
        SerialsCommand::Lookup { name } => {
            let serial = map.lookup(&name).ok_or_else(|| CliError::NotFound {
                resource_type: "serial mapping".into(),
                identifier: name.clone(),
                list_command: "serials list".into(),
            })?;
            let mapping = Mapping {
                name: &name,
                serial,
            };
            let out = output::render_single(
                &global.output,
                &mapping,
                |m| m.serial.to_owned(),
                |m| m.serial.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
        }
        SerialsCommand::List => {
            let entries: Vec<Mapping<'_>> = map
                .entries()
                .into_iter()
                .map(|(name, serial)| Mapping { name, serial })
                .collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |m| MappingRow {
                    name: m.name,
                    serial: m.serial,
                },
                |m| format!("{}\t{}", m.name, m.serial),
            )?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
