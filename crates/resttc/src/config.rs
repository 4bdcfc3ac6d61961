//! CLI-side configuration: loads `aliases.toml`, picks the active alias,
//! and layers global flags over the alias profile to build a
//! `RequirementsClient`.

use std::time::Duration;

use resttc_config::{Config, CredentialStore};
use resttc_core::{RequirementsClient, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the configuration. An explicit `--config` path must exist; the
/// default location may be absent.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    match global.config {
        Some(ref path) => {
            if !path.is_file() {
                return Err(CliError::NoConfig {
                    path: path.display().to_string(),
                });
            }
            Ok(resttc_config::load_config_from(path)?)
        }
        None => Ok(resttc_config::load_config()?),
    }
}

/// `--alias`, else the configured default.
pub fn active_alias_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .alias
        .clone()
        .unwrap_or_else(|| cfg.default_alias_name().to_owned())
}

pub fn credential_store(global: &GlobalOpts, cfg: &Config) -> CredentialStore {
    CredentialStore::new(
        global
            .credential_dir
            .clone()
            .unwrap_or_else(|| cfg.credential_dir()),
    )
}

/// Build a client for the active alias. No I/O happens until the first
/// command is sent.
pub fn build_client(global: &GlobalOpts) -> Result<RequirementsClient, CliError> {
    let cfg = load(global)?;
    let alias = active_alias_name(global, &cfg);

    let mut transport = cfg.transport(&alias);
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        transport.timeout = Duration::from_secs(secs);
    }

    let image_root = global
        .cache_dir
        .as_deref()
        .map_or_else(|| cfg.image_root(), resttc_config::image_root);

    tracing::debug!(
        alias = %alias,
        url = %cfg.alias_book().get(&alias).base_url(),
        image_root = %image_root.display(),
        "client configured"
    );

    Ok(
        RequirementsClient::new(cfg.alias_book(), alias, credential_store(global, &cfg))
            .with_transport(transport)
            .with_image_root(image_root),
    )
}
