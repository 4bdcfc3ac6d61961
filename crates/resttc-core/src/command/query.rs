// Saved query commands

use serde_json::{Value, json};

use super::{CommandKind, Reply, Request, TcCommand, field, from_value};
use crate::error::CoreError;
use crate::model::ModelObject;

/// Find a saved query descriptor by name.
///
/// Sends on every call; memoization lives in [`SavedQueryCache`](crate::SavedQueryCache).
#[derive(Debug, Clone)]
pub struct FindSavedQuery {
    name: String,
}

impl FindSavedQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TcCommand for FindSavedQuery {
    const KIND: CommandKind = CommandKind::FindSavedQuery;
    type Output = ModelObject;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "inputCriteria": [{
                "queryNames": [self.name],
                "queryDesc": [],
                "queryType": 0
            }]
        })))
    }

    /// First entry of `savedQueries`; a missing entry is an error.
    async fn decode(&self, reply: Reply) -> Result<ModelObject, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let first = field(Self::KIND, &response, "savedQueries")?
            .get(0)
            .ok_or_else(|| {
                CoreError::decode(Self::KIND, format!("no saved query named '{}'", self.name))
            })?;
        from_value(Self::KIND, first)
    }
}

#[derive(Debug, Clone)]
pub struct DescribeSavedQueries {
    queries: Vec<ModelObject>,
}

impl DescribeSavedQueries {
    pub fn new(queries: Vec<ModelObject>) -> Self {
        Self { queries }
    }
}

impl TcCommand for DescribeSavedQueries {
    const KIND: CommandKind = CommandKind::DescribeSavedQueries;
    type Output = Value;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({ "queries": self.queries })))
    }

    async fn decode(&self, reply: Reply) -> Result<Value, CoreError> {
        reply.into_json(Self::KIND)
    }
}

/// Run a saved query with `entries[i] = values[i]` criteria.
#[derive(Debug, Clone)]
pub struct ExecuteSavedQuery {
    query: ModelObject,
    entries: Vec<String>,
    values: Vec<String>,
    limit: u32,
}

impl ExecuteSavedQuery {
    pub fn new(query: ModelObject, entries: Vec<String>, values: Vec<String>, limit: u32) -> Self {
        Self {
            query,
            entries,
            values,
            limit,
        }
    }
}

impl TcCommand for ExecuteSavedQuery {
    const KIND: CommandKind = CommandKind::ExecuteSavedQuery;
    type Output = Vec<ModelObject>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "query": self.query,
            "entries": self.entries,
            "values": self.values,
            "limit": self.limit
        })))
    }

    /// `objects`, or empty when the server sends none (no matches).
    async fn decode(&self, reply: Reply) -> Result<Vec<ModelObject>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        match response.get("objects") {
            Some(objects) if !objects.is_null() => from_value(Self::KIND, objects),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_objects_means_no_matches() {
        let cmd = ExecuteSavedQuery::new(ModelObject::reference("q", "ImanQuery"), vec![], vec![], 1);
        let found = cmd.decode(Reply::Json(json!({ "nFound": 0 }))).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn empty_saved_queries_is_a_decode_error() {
        let cmd = FindSavedQuery::new("Item Revision...");
        let err = cmd
            .decode(Reply::Json(json!({ "savedQueries": [] })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Decode { command: CommandKind::FindSavedQuery, .. }
        ));
    }

    #[test]
    fn execute_body() {
        let cmd = ExecuteSavedQuery::new(
            ModelObject::reference("q1", "ImanQuery"),
            vec!["Type".into(), "Name".into()],
            vec!["Item Revision".into(), "model.slx".into()],
            1,
        );
        assert_eq!(
            cmd.request().unwrap(),
            Request::Json(json!({
                "query": { "uid": "q1", "type": "ImanQuery" },
                "entries": ["Type", "Name"],
                "values": ["Item Revision", "model.slx"],
                "limit": 1
            }))
        );
    }
}
