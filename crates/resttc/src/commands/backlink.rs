//! Backlink creation.

use owo_colors::OwoColorize;

use resttc_core::{BacklinkOutcome, ModelObject, RequirementsClient};

use crate::cli::{BacklinkArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn describe(object: &ModelObject) -> String {
    match object.object_string() {
        Some(name) if !name.is_empty() => format!("{name} ({})", object.uid),
        _ => object.uid.clone(),
    }
}

fn detail(outcome: &BacklinkOutcome, color: bool) -> String {
    let status = match (outcome.created, color) {
        (true, true) => "created".green().to_string(),
        (true, false) => "created".to_owned(),
        (false, true) => "already present".yellow().to_string(),
        (false, false) => "already present".to_owned(),
    };
    [
        output::field("Surrogate", &describe(&outcome.surrogate), color),
        output::field("Dataset", &describe(&outcome.dataset), color),
        output::field("Backlink", &status, color),
    ]
    .join("\n")
}

pub async fn handle(
    client: &mut RequirementsClient,
    args: BacklinkArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let outcome = client
        .insert_backlinks(&args.requirement, &args.model, &args.label, &args.nav_command)
        .await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| detail(o, color),
        |o| o.dataset.uid.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
