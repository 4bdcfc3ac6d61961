//! Saved query execution.

use tabled::Tabled;

use resttc_core::{ModelObject, RequirementsClient};

use crate::cli::{GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Object")]
    object: String,
}

impl From<&ModelObject> for ObjectRow {
    fn from(o: &ModelObject) -> Self {
        Self {
            uid: o.uid.clone(),
            type_name: o.type_name.clone(),
            object: o.object_string().unwrap_or_default().to_owned(),
        }
    }
}

pub async fn handle(
    client: &mut RequirementsClient,
    args: QueryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (entries, values): (Vec<String>, Vec<String>) = args.entries.into_iter().unzip();
    let found = client
        .run_saved_query(&args.name, entries, values, args.limit)
        .await?;

    if found.is_empty() && !global.quiet {
        eprintln!("No objects found");
    }
    let out = output::render_list(&global.output, &found, |o| ObjectRow::from(o), |o| o.uid.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
