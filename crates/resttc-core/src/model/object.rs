// ── Model objects ──
//
// The server describes every business object the same way: a uid, a type
// name, and a bag of properties, each carrying database and display values.
// Responses hand these out under `ServiceData.modelObjects` (or a bare
// `modelObjects`), keyed by uid.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Model objects of one response, keyed by uid.
pub type ObjectPool = HashMap<String, ModelObject>;

/// One property of a model object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub db_values: Vec<Value>,
    #[serde(default)]
    pub ui_values: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A business object as the server serializes it.
///
/// Unknown fields are kept in `extra` so the object can be echoed back to
/// the server unchanged as a request parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelObject {
    #[serde(default)]
    pub uid: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub props: HashMap<String, Property>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelObject {
    /// A bare reference carrying only uid and type.
    pub fn reference(uid: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// First display value of a property.
    pub fn ui_value(&self, property: &str) -> Option<&str> {
        self.props
            .get(property)?
            .ui_values
            .first()
            .map(String::as_str)
    }

    /// Display values of a property (empty when the property is absent).
    pub fn ui_values(&self, property: &str) -> &[String] {
        self.props
            .get(property)
            .map_or(&[][..], |p| p.ui_values.as_slice())
    }

    /// The `object_string` display value, e.g. `REQ-010/A;1-Introduction`.
    pub fn object_string(&self) -> Option<&str> {
        self.ui_value("object_string")
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ── Response helpers ─────────────────────────────────────────────────

/// Decode `value[key]` as a uid → object map. Absent keys yield an empty pool.
pub fn object_pool(value: &Value, key: &str) -> Result<ObjectPool, serde_json::Error> {
    match value.get(key) {
        Some(objects) => serde_json::from_value(objects.clone()),
        None => Ok(ObjectPool::new()),
    }
}

/// The `ServiceData.modelObjects` pool of a response.
pub fn service_data_pool(response: &Value) -> Result<ObjectPool, serde_json::Error> {
    match response.get("ServiceData") {
        Some(service_data) => object_pool(service_data, "modelObjects"),
        None => Ok(ObjectPool::new()),
    }
}

/// Resolve the uids listed under `container.plain` through `pool`, in order.
///
/// Returns the first uid that has no entry in the pool as the error.
pub fn resolve_plain(container: &Value, pool: &ObjectPool) -> Result<Vec<ModelObject>, String> {
    let plain = container
        .get("plain")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    plain
        .iter()
        .filter_map(Value::as_str)
        .map(|uid| pool.get(uid).cloned().ok_or_else(|| uid.to_owned()))
        .collect()
}
