// Requirements management commands

use serde_json::{Value, json};

use super::{CommandKind, Reply, Request, TcCommand, field};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::model::ModelObject;

// ── GetHTML ──────────────────────────────────────────────────────────

/// Export objects to HTML in one batched request.
///
/// The output holds one raw (still entity-escaped) fragment per input
/// object, in input order. Image rewriting happens in [`crate::html`].
#[derive(Debug, Clone)]
#[allow(clippy::upper_case_acronyms)]
pub struct GetHTML {
    objects: Vec<ModelObject>,
    download_base: String,
}

impl GetHTML {
    /// `download_base` is the file service download prefix the server
    /// should embed in image links.
    pub fn new(objects: Vec<ModelObject>, download_base: impl Into<String>) -> Self {
        Self {
            objects,
            download_base: download_base.into(),
        }
    }

    pub fn objects(&self) -> &[ModelObject] {
        &self.objects
    }
}

impl TcCommand for GetHTML {
    const KIND: CommandKind = CommandKind::GetHTML;
    type Output = Vec<String>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "input": [{
                "templateName": "",
                "applicationFormat": "HTML",
                "objectsToExport": self.objects,
                "targetObjectsToExport": [],
                "exportOptions": [{
                    "option": "base_url",
                    "optionvalue": self.download_base
                }],
                "recipeSourceObjects": [],
                "recipeTargetObjects": [],
                "attributesToExport": [],
                "objectTemplateInputs": [],
                "includeAttachments": true
            }]
        })))
    }

    /// One `transientFileReadTickets` entry per exported object.
    async fn decode(&self, reply: Reply) -> Result<Vec<String>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        let tickets = field(Self::KIND, &response, "transientFileReadTickets")?
            .as_array()
            .ok_or_else(|| CoreError::decode(Self::KIND, "transientFileReadTickets is not a list"))?;

        if tickets.len() < self.objects.len() {
            return Err(CoreError::decode(
                Self::KIND,
                format!(
                    "{} fragments for {} objects",
                    tickets.len(),
                    self.objects.len()
                ),
            ));
        }

        tickets
            .iter()
            .take(self.objects.len())
            .map(|t| {
                t.as_str()
                    .map(String::from)
                    .ok_or_else(|| CoreError::decode(Self::KIND, "fragment is not a string"))
            })
            .collect()
    }

    /// Nothing to export means nothing to send.
    async fn send(&self, connection: &mut Connection) -> Result<Vec<String>, CoreError> {
        if self.objects.is_empty() {
            return Ok(Vec::new());
        }
        connection.handle(self).await
    }
}

// ── CreateTraceLinks ─────────────────────────────────────────────────

/// Link two objects with a trace link.
#[derive(Debug, Clone)]
pub struct CreateTraceLinks {
    primary: ModelObject,
    secondary: ModelObject,
    link_type: String,
}

impl CreateTraceLinks {
    pub fn new(primary: ModelObject, secondary: ModelObject) -> Self {
        Self {
            primary,
            secondary,
            link_type: "FND_TraceLink".into(),
        }
    }
}

impl TcCommand for CreateTraceLinks {
    const KIND: CommandKind = CommandKind::CreateTraceLinks;
    type Output = Option<Value>;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Json(json!({
            "input": [{
                "clientId": "",
                "tracelinkCreateInput": {
                    "boName": self.link_type,
                    "propertyNameValues": {},
                    "compoundCreateInput": {}
                },
                "primaryObj": self.primary,
                "secondaryObj": self.secondary,
                "requestPref": {}
            }]
        })))
    }

    /// `output[0].traceLinkObject`. Lenient: a response without it decodes
    /// to `None` instead of failing.
    async fn decode(&self, reply: Reply) -> Result<Option<Value>, CoreError> {
        let response = reply.into_json(Self::KIND)?;
        Ok(response
            .get("output")
            .and_then(|o| o.get(0))
            .and_then(|o| o.get("traceLinkObject"))
            .filter(|v| !v.is_null())
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn two_objects() -> Vec<ModelObject> {
        vec![
            ModelObject::reference("a", "Requirement Revision"),
            ModelObject::reference("b", "Requirement Revision"),
        ]
    }

    #[test]
    fn export_body_injects_download_base() {
        let cmd = GetHTML::new(two_objects(), "http://h:4544/fms/fmsdownload/");
        let Request::Json(body) = cmd.request().unwrap() else {
            panic!("expected JSON request");
        };
        let input = &body["input"][0];
        assert_eq!(input["applicationFormat"], "HTML");
        assert_eq!(input["exportOptions"][0]["option"], "base_url");
        assert_eq!(
            input["exportOptions"][0]["optionvalue"],
            "http://h:4544/fms/fmsdownload/"
        );
        assert_eq!(input["objectsToExport"].as_array().unwrap().len(), 2);
        assert_eq!(input["includeAttachments"], true);
    }

    #[tokio::test]
    async fn fragments_align_with_objects() {
        let cmd = GetHTML::new(two_objects(), "x");
        let html = cmd
            .decode(Reply::Json(json!({ "transientFileReadTickets": ["<p>a</p>", "<p>b</p>"] })))
            .await
            .unwrap();
        assert_eq!(html, vec!["<p>a</p>", "<p>b</p>"]);

        let short = cmd
            .decode(Reply::Json(json!({ "transientFileReadTickets": ["<p>a</p>"] })))
            .await;
        assert!(matches!(short, Err(CoreError::Decode { .. })));
    }

    #[tokio::test]
    async fn trace_link_decode_is_lenient() {
        let cmd = CreateTraceLinks::new(
            ModelObject::reference("d", "HTML"),
            ModelObject::reference("r", "Requirement Revision"),
        );

        let found = cmd
            .decode(Reply::Json(json!({ "output": [{ "traceLinkObject": { "uid": "t" } }] })))
            .await
            .unwrap();
        assert_eq!(found, Some(json!({ "uid": "t" })));

        for reply in [json!({}), json!({ "output": [] }), json!({ "output": [{}] })] {
            assert_eq!(cmd.decode(Reply::Json(reply)).await.unwrap(), None);
        }
    }
}
