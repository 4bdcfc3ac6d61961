//! Configured server aliases. Reads config only, never connects.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AliasInfo {
    name: String,
    url: String,
    fms_url: String,
    default: bool,
    credentials: bool,
}

#[derive(Tabled)]
struct AliasRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Alias")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "FMS")]
    fms_url: String,
    #[tabled(rename = "Credentials")]
    credentials: &'static str,
}

impl From<&AliasInfo> for AliasRow {
    fn from(a: &AliasInfo) -> Self {
        Self {
            marker: if a.default { "*" } else { "" },
            name: a.name.clone(),
            url: a.url.clone(),
            fms_url: a.fms_url.clone(),
            credentials: if a.credentials { "yes" } else { "no" },
        }
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let active = config::active_alias_name(global, &cfg);
    let store = config::credential_store(global, &cfg);

    let aliases: Vec<AliasInfo> = cfg
        .alias_book()
        .iter()
        .map(|alias| AliasInfo {
            name: alias.name().to_owned(),
            url: alias.base_url(),
            fms_url: alias.fms_url(),
            default: alias.name() == active,
            credentials: store.exists(alias.name()),
        })
        .collect();

    if aliases.is_empty() && !global.quiet {
        eprintln!("No aliases configured; '{active}' uses the built-in defaults");
    }
    let out = output::render_list(
        &global.output,
        &aliases,
        |a| AliasRow::from(a),
        |a| a.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
