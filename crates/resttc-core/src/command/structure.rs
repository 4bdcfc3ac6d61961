// Structure management commands

use serde::Deserialize;
use serde_json::{Value, json};

use super::{CommandKind, Reply, Request, TcCommand, field, from_value, output_entry};
use crate::error::CoreError;
use crate::model::{ModelObject, ObjectPool, service_data_pool};

/// Placeholder the server expects for unused object parameters.
const UNSET: &str = "None2";
const CLIENT_ID: &str = "SIMULINK";

// ── GetRevisionRule ──────────────────────────────────────────────────

/// Find a revision rule by display name.
#[derive(Debug, Clone)]
pub struct GetRevisionRule {
    name: String,
}

impl GetRevisionRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TcCommand for GetRevisionRule {
    const KIND: CommandKind = CommandKind::GetRevisionRule;
    type Output = Option<ModelObject>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({})))
    }

    /// Scan every returned object for `object_name == [name]`. No match is
    /// `None`, not an error.
    async fn decode(&self, reply: Reply) -> Result<Option<ModelObject>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let pool = service_data_pool(&response)
            .map_err(|e| CoreError::decode(Self::KIND, e.to_string()))?;
        Ok(pool
            .into_values()
            .find(|rule| rule.ui_values("object_name") == [self.name.as_str()]))
    }
}

// ── CreateBOMWindow ──────────────────────────────────────────────────

/// Open a structure window on an item revision under a revision rule.
#[derive(Debug, Clone)]
pub struct CreateBOMWindow {
    item_revision: ModelObject,
    revision_rule: Option<ModelObject>,
}

impl CreateBOMWindow {
    /// A `None` rule is passed through as `null`; the server picks its default.
    pub fn new(item_revision: ModelObject, revision_rule: Option<ModelObject>) -> Self {
        Self {
            item_revision,
            revision_rule,
        }
    }
}

impl TcCommand for CreateBOMWindow {
    const KIND: CommandKind = CommandKind::CreateBOMWindow;
    type Output = ModelObject;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "info": [{
                "clientId": CLIENT_ID,
                "item": UNSET,
                "itemRev": self.item_revision,
                "bomView": UNSET,
                "revRuleConfigInfo": {
                    "clientId": CLIENT_ID,
                    "revRule": self.revision_rule,
                    "props": {
                        "unitNo": -1,
                        "date": "",
                        "today": true,
                        "endItem": UNSET,
                        "endItemRevision": UNSET,
                        "overrideFolders": [{
                            "ruleEntry": UNSET,
                            "folder": UNSET
                        }]
                    }
                },
                "objectForConfigure": UNSET,
                "activeAssemblyArrangement": UNSET
            }]
        })))
    }

    /// `output[0].bomLine`.
    async fn decode(&self, reply: Reply) -> Result<ModelObject, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let output = output_entry(Self::KIND, &response, 0)?;
        from_value(Self::KIND, field(Self::KIND, output, "bomLine")?)
    }
}

// ── ExpandPSAllLevels ────────────────────────────────────────────────

/// One row of the flat relation table: a parent and its ordered children,
/// both as item revision uids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureRelation {
    pub parent: Option<String>,
    pub children: Vec<String>,
}

/// Result of expanding every level below a structure line.
#[derive(Debug, Clone, Default)]
pub struct StructureExpansion {
    pub relations: Vec<StructureRelation>,
    pub objects: ObjectPool,
}

impl StructureExpansion {
    /// Children recorded for `uid` (first matching row), or none.
    pub fn children_of(&self, uid: &str) -> &[String] {
        self.relations
            .iter()
            .find(|r| r.parent.as_deref() == Some(uid))
            .map_or(&[][..], |r| r.children.as_slice())
    }
}

#[derive(Deserialize)]
struct ExpandedLine {
    #[serde(rename = "itemRevOfBOMLine")]
    item_rev_of_bom_line: LineObject,
}

#[derive(Deserialize)]
struct LineObject {
    uid: String,
}

#[derive(Deserialize)]
struct ExpandOutput {
    #[serde(default)]
    parent: Option<ExpandedLine>,
    #[serde(default)]
    children: Vec<ExpandedLine>,
}

/// Expand all structure levels below a line.
#[derive(Debug, Clone)]
pub struct ExpandPSAllLevels {
    bom_line: ModelObject,
}

impl ExpandPSAllLevels {
    pub fn new(bom_line: ModelObject) -> Self {
        Self { bom_line }
    }
}

impl TcCommand for ExpandPSAllLevels {
    const KIND: CommandKind = CommandKind::ExpandPSAllLevels;
    type Output = StructureExpansion;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "input": {
                "parentBomLines": [self.bom_line],
                "excludeFilter": "None"
            },
            "pref": {
                "expItemRev": false,
                "info": []
            }
        })))
    }

    async fn decode(&self, reply: Reply) -> Result<StructureExpansion, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let outputs: Vec<ExpandOutput> = match response.get("output") {
            Some(Value::Null) | None => Vec::new(),
            Some(output) => from_value(Self::KIND, output)?,
        };
        let objects = service_data_pool(&response)
            .map_err(|e| CoreError::decode(Self::KIND, e.to_string()))?;

        let relations = outputs
            .into_iter()
            .map(|out| StructureRelation {
                parent: out.parent.map(|p| p.item_rev_of_bom_line.uid),
                children: out
                    .children
                    .into_iter()
                    .map(|c| c.item_rev_of_bom_line.uid)
                    .collect(),
            })
            .collect();

        Ok(StructureExpansion { relations, objects })
    }
}
