//! Single-object lookups: specification header, summary, link.

use serde::Serialize;

use resttc_core::{RequirementsClient, Specification};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Summary<'a> {
    document: &'a str,
    location: Option<&'a str>,
    summary: String,
}

#[derive(Serialize)]
struct Link<'a> {
    document: &'a str,
    url: String,
}

fn spec_detail(spec: &Specification, color: bool) -> String {
    [
        output::heading(&spec.name, color),
        output::field("Item", &spec.item_id, color),
        output::field("Revision", &spec.revision, color),
        output::field("UID", &spec.uid, color),
        output::field("Description", &spec.description, color),
    ]
    .join("\n")
}

pub async fn spec(
    client: &mut RequirementsClient,
    url: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spec = client.get_spec(url).await?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &spec,
        |s| spec_detail(s, color),
        |s| format!("{}_{}", s.item_id, s.revision),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn summary(
    client: &mut RequirementsClient,
    document: &str,
    location: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = Summary {
        document,
        location,
        summary: client
            .get_summary(document, location.unwrap_or_default())
            .await?,
    };
    let out = output::render_single(
        &global.output,
        &summary,
        |s| s.summary.clone(),
        |s| s.summary.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn url(
    client: &mut RequirementsClient,
    document: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let link = Link {
        document,
        url: client.get_url(document).await?,
    };
    let out = output::render_single(&global.output, &link, |l| l.url.clone(), |l| l.url.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
