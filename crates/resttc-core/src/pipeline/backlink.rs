// ── Backlinks ──
//
// A model file is represented on the server by a surrogate item. Each
// backlink is an HTML dataset attached to that surrogate, named by its
// label and carrying the navigation command, plus a trace link from the
// dataset to the requirement. The label is the only dedup key: when the
// surrogate already has a dataset with that label nothing is created.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cache::SavedQueryCache;
use crate::command::{
    CreateAndRelateDataset, CreateItem, CreateTraceLinks, ExecuteSavedQuery, GetItemFromId,
    GetRelatedDatasets, TcCommand,
};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::model::{ItemRevisionId, ModelObject};

/// Saved query used to find an existing surrogate.
pub const SURROGATE_QUERY: &str = "Item Revision...";
/// Description given to newly created surrogates.
pub const SURROGATE_DESCRIPTION: &str = "Surrogate Matlab Model";

/// A backlink to create.
#[derive(Debug, Clone)]
pub struct BacklinkRequest {
    pub requirement: ItemRevisionId,
    /// Model file path; only the file name names the surrogate.
    pub model_path: String,
    pub label: String,
    pub nav_command: String,
}

impl BacklinkRequest {
    /// File name part of the model path. Both `/` and `\` separate.
    pub fn model_name(&self) -> &str {
        self.model_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.model_path)
    }
}

/// What the workflow found or created.
#[derive(Debug, Clone, Serialize)]
pub struct BacklinkOutcome {
    pub surrogate: ModelObject,
    pub dataset: ModelObject,
    /// `false` when a dataset with the label already existed.
    pub created: bool,
    pub trace_link: Option<Value>,
}

/// Create the backlink unless the surrogate already carries one with the
/// same label.
///
/// Failures are logged and returned. Whatever was committed before the
/// failing step stays on the server.
pub async fn insert_backlink(
    connection: &mut Connection,
    queries: &mut SavedQueryCache,
    request: &BacklinkRequest,
) -> Result<BacklinkOutcome, CoreError> {
    let result = run(connection, queries, request).await;
    if let Err(ref e) = result {
        error!(
            requirement = %request.requirement,
            label = %request.label,
            error = %e,
            chain = ?e.chain(),
            "failed to insert backlink"
        );
    }
    result
}

async fn run(
    connection: &mut Connection,
    queries: &mut SavedQueryCache,
    request: &BacklinkRequest,
) -> Result<BacklinkOutcome, CoreError> {
    let surrogate = find_or_create_surrogate(connection, queries, request.model_name()).await?;

    let existing = GetRelatedDatasets::new(surrogate.clone())
        .send(connection)
        .await?;
    if let Some(dataset) = existing
        .into_iter()
        .find(|d| d.object_string() == Some(request.label.as_str()))
    {
        debug!(label = %request.label, "backlink already present");
        return Ok(BacklinkOutcome {
            surrogate,
            dataset,
            created: false,
            trace_link: None,
        });
    }

    let requirement =
        GetItemFromId::new(&request.requirement.item_id, &request.requirement.revision)
            .send(connection)
            .await?;
    let dataset = CreateAndRelateDataset::new(
        surrogate.clone(),
        &request.label,
        &request.nav_command,
    )
    .send(connection)
    .await?;
    let trace_link = CreateTraceLinks::new(dataset.clone(), requirement)
        .send(connection)
        .await?;
    if trace_link.is_none() {
        debug!("server returned no trace link object");
    }

    info!(
        requirement = %request.requirement,
        label = %request.label,
        "backlink created"
    );
    Ok(BacklinkOutcome {
        surrogate,
        dataset,
        created: true,
        trace_link,
    })
}

async fn find_or_create_surrogate(
    connection: &mut Connection,
    queries: &mut SavedQueryCache,
    model_name: &str,
) -> Result<ModelObject, CoreError> {
    let query = queries.find(connection, SURROGATE_QUERY).await?;
    let found = ExecuteSavedQuery::new(
        query,
        vec!["Type".into(), "Name".into()],
        vec!["Item Revision".into(), model_name.into()],
        1,
    )
    .send(connection)
    .await?;

    if let Some(surrogate) = found.into_iter().next() {
        return Ok(surrogate);
    }

    info!(model = model_name, "creating surrogate item");
    CreateItem::new(model_name, SURROGATE_DESCRIPTION)
        .send(connection)
        .await?
        .ok_or_else(|| CoreError::OperationFailed {
            message: format!("creating surrogate for {model_name} returned no item revision"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(path: &str) -> BacklinkRequest {
        BacklinkRequest {
            requirement: ItemRevisionId::new("REQ-010", "A"),
            model_path: path.into(),
            label: "slreq link".into(),
            nav_command: "rmiobjnavigate('m.slx','x')".into(),
        }
    }

    #[test]
    fn model_name_is_the_file_name() {
        assert_eq!(request("/work/models/brake.slx").model_name(), "brake.slx");
        assert_eq!(request(r"C:\work\models\brake.slx").model_name(), "brake.slx");
        assert_eq!(request("brake.slx").model_name(), "brake.slx");
    }
}
