// Data management commands

use serde_json::{Value, json};

use super::{CommandKind, Reply, Request, TcCommand, field, from_value, output_entry};
use crate::error::CoreError;
use crate::model::{ModelObject, object_pool, resolve_plain, service_data_pool};

const ATTACHES: &str = "TC_Attaches";

fn pool_error(kind: CommandKind, e: serde_json::Error) -> CoreError {
    CoreError::decode(kind, format!("bad modelObjects: {e}"))
}

fn dangling(kind: CommandKind, uid: String) -> CoreError {
    CoreError::decode(kind, format!("uid {uid} missing from modelObjects"))
}

// ── LoadObjects ──────────────────────────────────────────────────────

/// Load objects by uid.
#[derive(Debug, Clone)]
pub struct LoadObjects {
    uids: Vec<String>,
}

impl LoadObjects {
    pub fn new(uids: Vec<String>) -> Self {
        Self { uids }
    }
}

impl TcCommand for LoadObjects {
    const KIND: CommandKind = CommandKind::LoadObjects;
    type Output = Vec<ModelObject>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({ "uids": self.uids })))
    }

    /// `plain` uids resolved through `modelObjects`, in order.
    async fn decode(&self, reply: Reply) -> Result<Vec<ModelObject>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let pool = object_pool(&response, "modelObjects").map_err(|e| pool_error(Self::KIND, e))?;
        resolve_plain(&response, &pool).map_err(|uid| dangling(Self::KIND, uid))
    }
}

// ── GetProperties ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GetProperties {
    objects: Vec<ModelObject>,
    attributes: Vec<String>,
}

impl GetProperties {
    pub fn new(objects: Vec<ModelObject>, attributes: Vec<String>) -> Self {
        Self {
            objects,
            attributes,
        }
    }
}

impl TcCommand for GetProperties {
    const KIND: CommandKind = CommandKind::GetProperties;
    type Output = Value;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "objects": self.objects,
            "attributes": self.attributes
        })))
    }

    async fn decode(&self, reply: Reply) -> Result<Value, CoreError> {
        reply.into_json(Self::KIND)
    }
}

// ── GetItemFromId ────────────────────────────────────────────────────

/// Resolve an item, or one of its revisions, from its id.
#[derive(Debug, Clone)]
pub struct GetItemFromId {
    item_id: String,
    revision: String,
    return_revision: bool,
}

impl GetItemFromId {
    /// Look up the revision `revision` of `item_id`.
    pub fn new(item_id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            revision: revision.into(),
            return_revision: true,
        }
    }

    /// Return the item itself instead of the revision.
    pub fn item_only(mut self) -> Self {
        self.return_revision = false;
        self
    }
}

impl TcCommand for GetItemFromId {
    const KIND: CommandKind = CommandKind::GetItemFromId;
    type Output = ModelObject;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "infos": [{
                "itemId": self.item_id,
                "revIds": [self.revision]
            }],
            "nRev": 0,
            "pref": { "prefs": [] }
        })))
    }

    /// `itemRevOutput` is either one object or a sequence whose first entry
    /// wraps the revision under `itemRevision`; both shapes are accepted.
    async fn decode(&self, reply: Reply) -> Result<ModelObject, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let output = output_entry(Self::KIND, &response, 0)?;

        let target = if self.return_revision {
            match field(Self::KIND, output, "itemRevOutput")? {
                Value::Array(entries) => {
                    let first = entries.first().ok_or_else(|| {
                        CoreError::decode(
                            Self::KIND,
                            format!("no revision {} of {}", self.revision, self.item_id),
                        )
                    })?;
                    field(Self::KIND, first, "itemRevision")?
                }
                single => single,
            }
        } else {
            field(Self::KIND, output, "item")?
        };

        let uid = field(Self::KIND, target, "uid")?
            .as_str()
            .ok_or_else(|| CoreError::decode(Self::KIND, "uid is not a string"))?;
        let mut pool = service_data_pool(&response).map_err(|e| pool_error(Self::KIND, e))?;
        pool.remove(uid)
            .ok_or_else(|| dangling(Self::KIND, uid.to_owned()))
    }
}

// ── Relations ────────────────────────────────────────────────────────

fn grm_body(primary_objects: &[ModelObject], relation: &str) -> Value {
    json!({
        "primaryObjects": primary_objects,
        "pref": {
            "expItemRev": false,
            "returnRelations": false,
            "info": [{
                "relationTypeName": relation,
                "otherSideObjectTypes": []
            }]
        }
    })
}

/// Expand a relation of several primaries; returns the raw response.
#[derive(Debug, Clone)]
pub struct ExpandGRMRelationsForPrimary {
    primary_objects: Vec<ModelObject>,
    relation: String,
}

impl ExpandGRMRelationsForPrimary {
    pub fn new(primary_objects: Vec<ModelObject>) -> Self {
        Self {
            primary_objects,
            relation: ATTACHES.into(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }
}

impl TcCommand for ExpandGRMRelationsForPrimary {
    const KIND: CommandKind = CommandKind::ExpandGRMRelationsForPrimary;
    type Output = Value;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(grm_body(&self.primary_objects, &self.relation)))
    }

    async fn decode(&self, reply: Reply) -> Result<Value, CoreError> {
        reply.into_json(Self::KIND)
    }
}

/// Datasets attached to one primary object.
#[derive(Debug, Clone)]
pub struct GetRelatedDatasets {
    primary: ModelObject,
    relation: String,
}

impl GetRelatedDatasets {
    pub fn new(primary: ModelObject) -> Self {
        Self {
            primary,
            relation: ATTACHES.into(),
        }
    }
}

impl TcCommand for GetRelatedDatasets {
    const KIND: CommandKind = CommandKind::GetRelatedDatasets;
    type Output = Vec<ModelObject>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(grm_body(
            std::slice::from_ref(&self.primary),
            &self.relation,
        )))
    }

    /// `ServiceData.plain` uids resolved through `ServiceData.modelObjects`.
    async fn decode(&self, reply: Reply) -> Result<Vec<ModelObject>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let service_data = field(Self::KIND, &response, "ServiceData")?;
        let pool =
            object_pool(service_data, "modelObjects").map_err(|e| pool_error(Self::KIND, e))?;
        resolve_plain(service_data, &pool).map_err(|uid| dangling(Self::KIND, uid))
    }
}

// ── Creation ─────────────────────────────────────────────────────────

/// Create an item with a first revision `A`.
#[derive(Debug, Clone)]
pub struct CreateItem {
    name: String,
    description: String,
}

impl CreateItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl TcCommand for CreateItem {
    const KIND: CommandKind = CommandKind::CreateItem;
    type Output = Option<ModelObject>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "inputs": [{
                "clientId": "CreateObject",
                "createData": {
                    "boName": "Item",
                    "propertyNameValues": {
                        "object_name": [self.name],
                        "object_desc": [self.description]
                    },
                    "compoundCreateInput": {
                        "revision": [{
                            "boName": "ItemRevision",
                            "propertyNameValues": {
                                "item_revision_id": ["A"],
                                "fnd0ContextProvider": [""]
                            },
                            "compoundCreateInput": {}
                        }]
                    }
                },
                "dataToBeRelated": {},
                "workflowData": {},
                "pasteProp": "",
                "targetObject": {
                    "uid": "AAAAAAAAAAAAAA",
                    "type": "unknownType"
                }
            }]
        })))
    }

    /// The created object of type `ItemRevision`, if any.
    async fn decode(&self, reply: Reply) -> Result<Option<ModelObject>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let output = output_entry(Self::KIND, &response, 0)?;
        let objects: Vec<ModelObject> = from_value(Self::KIND, field(Self::KIND, output, "objects")?)?;
        Ok(objects.into_iter().find(|o| o.type_name == "ItemRevision"))
    }
}

/// Create a dataset and attach it to `container`.
#[derive(Debug, Clone)]
pub struct CreateAndRelateDataset {
    container: ModelObject,
    name: String,
    description: String,
    dataset_type: String,
    relation: String,
}

impl CreateAndRelateDataset {
    pub fn new(
        container: ModelObject,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            container,
            name: name.into(),
            description: description.into(),
            dataset_type: "HTML".into(),
            relation: ATTACHES.into(),
        }
    }
}

impl TcCommand for CreateAndRelateDataset {
    const KIND: CommandKind = CommandKind::CreateAndRelateDataset;
    type Output = ModelObject;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "input": [{
                "clientId": self.name,
                "type": self.dataset_type,
                "name": self.name,
                "description": self.description,
                "toolUsed": "",
                "datasetId": "",
                "datasetRev": "",
                "container": self.container,
                "relationType": self.relation
            }]
        })))
    }

    /// The `dataset` of the first output entry; both must exist.
    async fn decode(&self, reply: Reply) -> Result<ModelObject, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let output = output_entry(Self::KIND, &response, 0)?;
        from_value(Self::KIND, field(Self::KIND, output, "dataset")?)
    }
}
