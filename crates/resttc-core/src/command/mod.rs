// ── Commands ──
//
// One type per remote operation. A command is built with every parameter
// it needs, renders its request with `request()`, and interprets the
// server's reply with `decode()`. Commands never touch the transport:
// `Connection::handle` looks up the service operation for `KIND` and does
// the exchange.

mod data;
mod fms;
mod query;
mod requirements;
mod session;
mod structure;

pub use data::{
    CreateAndRelateDataset, CreateItem, ExpandGRMRelationsForPrimary, GetItemFromId,
    GetProperties, GetRelatedDatasets, LoadObjects,
};
pub use fms::DownloadFile;
pub use query::{DescribeSavedQueries, ExecuteSavedQuery, FindSavedQuery};
pub use requirements::{CreateTraceLinks, GetHTML};
pub use session::{Login, Logout};
pub use structure::{
    CreateBOMWindow, ExpandPSAllLevels, GetRevisionRule, StructureExpansion, StructureRelation,
};

use serde_json::{Value, json};
use strum::EnumIter;

use crate::connection::Connection;
use crate::error::CoreError;

/// Client identifier carried in every request envelope.
pub const CLIENT_ID: &str = "ActiveWorkspaceClient";

// ── CommandKind ──────────────────────────────────────────────────────

/// Tag of every command type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    EnumIter,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum CommandKind {
    Login,
    Logout,
    CreateItem,
    FindSavedQuery,
    ExecuteSavedQuery,
    GetItemFromId,
    GetRevisionRule,
    CreateBOMWindow,
    ExpandPSAllLevels,
    GetRelatedDatasets,
    CreateAndRelateDataset,
    CreateTraceLinks,
    GetProperties,
    GetHTML,
    DownloadFile,
    LoadObjects,
    ExpandGRMRelationsForPrimary,
    DescribeSavedQueries,
}

/// Look a command kind up by name (`GetItemFromId`, ...).
pub fn resolve_command(name: &str) -> Result<CommandKind, CoreError> {
    name.parse().map_err(|_| CoreError::UndefinedCommand {
        name: name.to_owned(),
    })
}

// ── Request / reply ──────────────────────────────────────────────────

/// What a command asks the connection to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// POST this body, wrapped in the request envelope.
    Json(Value),
    /// GET this path, resolved against the file service root.
    Download(String),
}

/// What came back.
#[derive(Debug)]
pub enum Reply {
    Json(Value),
    Bytes(Vec<u8>),
}

impl Reply {
    pub(crate) fn into_json(self, kind: CommandKind) -> Result<Value, CoreError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Bytes(_) => Err(CoreError::decode(kind, "expected a JSON reply")),
        }
    }

    pub(crate) fn into_bytes(self, kind: CommandKind) -> Result<Vec<u8>, CoreError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Json(_) => Err(CoreError::decode(kind, "expected a binary reply")),
        }
    }
}

/// Wrap a request body in the fixed outer envelope.
pub fn envelope(body: Value) -> Value {
    json!({
        "header": {
            "state": {
                "stateless": true,
                "clientID": CLIENT_ID
            }
        },
        "body": body
    })
}

// ── TcCommand ────────────────────────────────────────────────────────

/// A sendable remote operation.
#[allow(async_fn_in_trait)]
pub trait TcCommand {
    const KIND: CommandKind;

    /// Decoded result.
    type Output;

    /// Render the request.
    fn request(&self) -> Result<Request, CoreError>;

    /// Extract the result from the reply.
    async fn decode(&self, reply: Reply) -> Result<Self::Output, CoreError>;

    /// Send through `connection`.
    async fn send(&self, connection: &mut Connection) -> Result<Self::Output, CoreError>
    where
        Self: Sized,
    {
        connection.handle(self).await
    }
}

// ── Decode helpers ───────────────────────────────────────────────────

/// `value[index]` of the response's `output` array.
pub(crate) fn output_entry(
    kind: CommandKind,
    response: &Value,
    index: usize,
) -> Result<&Value, CoreError> {
    response
        .get("output")
        .and_then(|output| output.get(index))
        .ok_or_else(|| CoreError::decode(kind, format!("missing output[{index}]")))
}

pub(crate) fn field<'a>(kind: CommandKind, value: &'a Value, key: &str) -> Result<&'a Value, CoreError> {
    value
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| CoreError::decode(kind, format!("missing field '{key}'")))
}

pub(crate) fn from_value<T: serde::de::DeserializeOwned>(
    kind: CommandKind,
    value: &Value,
) -> Result<T, CoreError> {
    serde_json::from_value(value.clone()).map_err(|e| CoreError::decode(kind, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_command_resolves_by_name() {
        for kind in CommandKind::iter() {
            assert_eq!(resolve_command(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(CommandKind::iter().count(), 18);
    }

    #[test]
    fn unknown_command_is_a_configuration_error() {
        let err = resolve_command("DeleteEverything").unwrap_err();
        assert!(matches!(err, CoreError::UndefinedCommand { ref name } if name == "DeleteEverything"));
        assert!(err.is_configuration());
    }

    #[test]
    fn envelope_shape() {
        let wrapped = envelope(json!({ "uids": ["a"] }));
        assert_eq!(wrapped["header"]["state"]["stateless"], json!(true));
        assert_eq!(wrapped["header"]["state"]["clientID"], json!(CLIENT_ID));
        assert_eq!(wrapped["body"], json!({ "uids": ["a"] }));
    }

    #[test]
    fn null_field_counts_as_missing() {
        let value = json!({ "bomLine": null });
        assert!(field(CommandKind::CreateBOMWindow, &value, "bomLine").is_err());
    }
}
