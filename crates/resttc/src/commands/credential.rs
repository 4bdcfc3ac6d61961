//! Credential file management: seal a password for an alias.

use std::io::{BufRead, IsTerminal};

use dialoguer::Input;
use secrecy::SecretString;
use serde::Serialize;

use crate::cli::{CredentialArgs, CredentialCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct CredentialPaths {
    alias: String,
    key_file: String,
    credential_file: String,
    present: bool,
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn read_username(given: Option<String>) -> Result<String, CliError> {
    if let Some(user) = given {
        return Ok(user);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "pass --username when not running interactively".into(),
        });
    }
    Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)
}

fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ").map_err(prompt_err)?
    };

    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

pub fn handle(args: CredentialArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let alias = config::active_alias_name(global, &cfg);
    let store = config::credential_store(global, &cfg);

    match args.command {
        CredentialCommand::Create {
            username,
            password_stdin,
            expiry,
        } => {
            let username = read_username(username)?;
            let password = read_password(password_stdin)?;
            store.create(&alias, &username, &password, expiry)?;
            if !global.quiet {
                eprintln!(
                    "Credentials for '{alias}' written to {}",
                    store.dir().display()
                );
            }
            Ok(())
        }

        CredentialCommand::Show => {
            let paths = CredentialPaths {
                key_file: store.key_path(&alias).display().to_string(),
                credential_file: store.credential_path(&alias).display().to_string(),
                present: store.exists(&alias),
                alias,
            };
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &paths,
                |p| {
                    [
                        output::field("Alias", &p.alias, color),
                        output::field("Key file", &p.key_file, color),
                        output::field("Credential file", &p.credential_file, color),
                        output::field("Present", if p.present { "yes" } else { "no" }, color),
                    ]
                    .join("\n")
                },
                |p| p.credential_file.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
