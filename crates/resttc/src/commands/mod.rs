//! Command dispatch: bridges CLI args -> `RequirementsClient` -> output formatting.

pub mod aliases;
pub mod backlink;
pub mod contents;
pub mod credential;
pub mod lookup;
pub mod query;

use resttc_core::RequirementsClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &mut RequirementsClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Spec { url } => lookup::spec(client, &url, global).await,
        Command::Summary { document, location } => {
            lookup::summary(client, &document, location.as_deref(), global).await
        }
        Command::Url { document } => lookup::url(client, &document, global).await,
        Command::Contents(args) => contents::handle(client, args, global).await,
        Command::Query(args) => query::handle(client, args, global).await,
        Command::Backlink(args) => backlink::handle(client, args, global).await,
        // Local commands are handled before a client is built
        Command::Aliases | Command::Credential(_) | Command::Completions(_) => unreachable!(),
    }
}
