//! Specification contents: the document-order walk, with optional text.

use serde::Serialize;
use tabled::Tabled;

use resttc_core::{RequirementsClient, SpecContents};

use crate::cli::{ContentsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Data ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Entry {
    label: String,
    depth: usize,
    location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ContentRow {
    #[tabled(rename = "Depth")]
    depth: usize,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl From<&Entry> for ContentRow {
    fn from(e: &Entry) -> Self {
        Self {
            depth: e.depth,
            label: indented(&e.label, e.depth),
            location: e.location.clone(),
        }
    }
}

#[derive(Tabled)]
struct ContentTextRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Text")]
    text: String,
}

impl From<&Entry> for ContentTextRow {
    fn from(e: &Entry) -> Self {
        Self {
            label: indented(&e.label, e.depth),
            location: e.location.clone(),
            text: e.text.clone().unwrap_or_default(),
        }
    }
}

fn indented(label: &str, depth: usize) -> String {
    format!("{}{label}", "  ".repeat(depth))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &mut RequirementsClient,
    args: ContentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let progress = output::spinner(&format!("Reading {}", args.spec), global.quiet);
    let result = client.get_contents(&args.spec).await;
    progress.finish_and_clear();
    let contents = result?;

    let entries = entries(client, &args, &contents);
    let out = match (&global.output, args.text) {
        (OutputFormat::Table, true) => output::render_list(
            &global.output,
            &entries,
            |e| ContentTextRow::from(e),
            |e| e.location.clone(),
        )?,
        _ => output::render_list(
            &global.output,
            &entries,
            |e| ContentRow::from(e),
            |e| e.location.clone(),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn entries(
    client: &RequirementsClient,
    args: &ContentsArgs,
    contents: &SpecContents,
) -> Vec<Entry> {
    contents
        .iter()
        .map(|(label, depth, location)| Entry {
            label: label.to_owned(),
            depth,
            location: location.to_owned(),
            text: args
                .text
                .then(|| client.get_viewable_text(&args.spec, location)),
        })
        .collect()
}
