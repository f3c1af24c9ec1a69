//! Resource descriptors as delivered by the inventory provider
//!
//! `properties` and `sku` are semi-structured: usually a JSON object, but
//! providers sometimes hand over a JSON-encoded string or plain text. The
//! blob keeps whatever arrived and exposes typed, optional accessors;
//! nothing here ever fails on malformed data.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

fn arm_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)/subscriptions/[^\s"',;]+"#).expect("valid regex"))
}

/// Lowercased resource id without a trailing slash, if `text` is one
fn normalize_arm_id(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("/subscriptions/").then_some(lower)
}

fn collect_ids(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::String(s) => out.extend(normalize_arm_id(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_ids(v, out)),
        Value::Object(map) => {
            for (key, v) in map {
                out.extend(normalize_arm_id(key));
                collect_ids(v, out);
            }
        }
        _ => {}
    }
}

/// Opaque properties blob with optional JSON view
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyBlob {
    #[default]
    Empty,
    Json(Value),
    /// Raw text that did not parse as a JSON object or array
    Unparsed(String),
}

impl PropertyBlob {
    /// Build from an already-decoded JSON value
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => PropertyBlob::Empty,
            Value::String(raw) => Self::from_raw(&raw),
            other => PropertyBlob::Json(other),
        }
    }

    /// Build from raw text, parsing it when it holds a JSON object or array
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return PropertyBlob::Empty;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v @ (Value::Object(_) | Value::Array(_))) => PropertyBlob::Json(v),
            _ => PropertyBlob::Unparsed(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            PropertyBlob::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, PropertyBlob::Json(_))
    }

    /// JSON-pointer lookup (`/networkProfile/networkInterfaces`)
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.pointer(path))
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.pointer(path).and_then(Value::as_str)
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.pointer(path).and_then(Value::as_bool)
    }

    pub fn array_at(&self, path: &str) -> &[Value] {
        self.pointer(path)
            .and_then(Value::as_array)
            .map(|a| a.as_slice())
            .unwrap_or(&[])
    }

    /// Collect string values at `field` (a JSON pointer relative to each
    /// element) from every element of the array at `array_path`.
    pub fn ids_at<'a>(&'a self, array_path: &str, field: &str) -> Vec<&'a str> {
        self.array_at(array_path)
            .iter()
            .filter_map(|item| item.pointer(field).and_then(Value::as_str))
            .collect()
    }

    /// Every whole resource id the blob mentions, as an object key or a
    /// string value, lowercased and without a trailing slash
    pub fn resource_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        match self {
            PropertyBlob::Empty => {}
            PropertyBlob::Json(v) => collect_ids(v, &mut ids),
            PropertyBlob::Unparsed(raw) => {
                ids.extend(arm_id_re().find_iter(raw).filter_map(|m| normalize_arm_id(m.as_str())));
            }
        }
        ids
    }

    /// Lowercased text of the blob, for substring heuristics
    pub fn search_text(&self) -> String {
        match self {
            PropertyBlob::Empty => String::new(),
            PropertyBlob::Json(v) => v.to_string().to_lowercase(),
            PropertyBlob::Unparsed(raw) => raw.to_lowercase(),
        }
    }
}

impl Serialize for PropertyBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyBlob::Empty => serializer.serialize_none(),
            PropertyBlob::Json(v) => v.serialize(serializer),
            PropertyBlob::Unparsed(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(PropertyBlob::from_value(value))
    }
}

/// Flat record describing one cloud resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: PropertyBlob,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<PropertyBlob>,
    /// Managed identity block (`{"type": "SystemAssigned", ...}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<PropertyBlob>,
}

impl ResourceDescriptor {
    pub fn new(id: &str, name: &str, resource_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            ..Default::default()
        }
    }

    pub fn with_resource_group(mut self, group: &str) -> Self {
        self.resource_group = group.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_subscription(mut self, subscription_id: &str) -> Self {
        self.subscription_id = subscription_id.to_string();
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = PropertyBlob::from_value(properties);
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_identity(mut self, identity: Value) -> Self {
        self.identity = Some(PropertyBlob::from_value(identity));
        self
    }

    /// Managed identity type, from the identity block or `properties.identity`.
    /// `None` when absent or explicitly `"None"`.
    pub fn managed_identity_type(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|b| b.str_at("/type"))
            .or_else(|| self.properties.str_at("/identity/type"))
            .filter(|t| !t.trim().is_empty() && !t.eq_ignore_ascii_case("none"))
    }

    /// Lowercased provider type, the key used by every lookup table
    pub fn type_lower(&self) -> String {
        self.resource_type.to_ascii_lowercase()
    }

    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type.eq_ignore_ascii_case(resource_type)
    }

    /// Last segment of the type (`virtualMachines`)
    pub fn short_type(&self) -> &str {
        self.resource_type
            .rsplit('/')
            .next()
            .unwrap_or(&self.resource_type)
    }

    /// Tag lookup with a case-insensitive key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Lowercased id, used for cross-referencing
    pub fn id_key(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_managed_identity_type() {
        let r = ResourceDescriptor::new("/r/1", "app", "Microsoft.Web/sites")
            .with_identity(json!({"type": "SystemAssigned"}));
        assert_eq!(r.managed_identity_type(), Some("SystemAssigned"));

        let none = ResourceDescriptor::new("/r/2", "app", "Microsoft.Web/sites")
            .with_identity(json!({"type": "None"}));
        assert_eq!(none.managed_identity_type(), None);

        let nested = ResourceDescriptor::new("/r/3", "app", "Microsoft.Web/sites")
            .with_properties(json!({"identity": {"type": "UserAssigned"}}));
        assert_eq!(nested.managed_identity_type(), Some("UserAssigned"));
    }

    #[test]
    fn test_blob_from_object() {
        let blob = PropertyBlob::from_value(json!({"a": {"b": "c"}}));
        assert!(blob.is_parsed());
        assert_eq!(blob.str_at("/a/b"), Some("c"));
        assert_eq!(blob.str_at("/a/missing"), None);
    }

    #[test]
    fn test_blob_from_json_string() {
        let blob = PropertyBlob::from_value(json!("{\"managedBy\": \"/vm/1\"}"));
        assert_eq!(blob.str_at("/managedBy"), Some("/vm/1"));
    }

    #[test]
    fn test_blob_unparsed_never_fails() {
        let blob = PropertyBlob::from_raw("{not json");
        assert!(!blob.is_parsed());
        assert_eq!(blob.pointer("/x"), None);
        assert!(blob.array_at("/x").is_empty());
        assert_eq!(blob.search_text(), "{not json");
    }

    #[test]
    fn test_resource_ids_are_whole_ids() {
        let blob = PropertyBlob::from_value(json!({
            "type": "UserAssigned",
            "userAssignedIdentities": {
                "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id-app-2": {}
            },
            "subnet": {"id": "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v/subnets/a/"},
            "note": "not an id"
        }));
        let ids = blob.resource_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("/subscriptions/s1/resourcegroups/rg/providers/microsoft.managedidentity/userassignedidentities/id-app-2"));
        assert!(ids.contains("/subscriptions/s1/resourcegroups/rg/providers/microsoft.network/virtualnetworks/v/subnets/a"));
        assert!(!ids.iter().any(|id| id.ends_with("/id-app")));

        let raw = PropertyBlob::from_raw("uses '/subscriptions/s1/x/id-app-2', then stops");
        assert_eq!(
            raw.resource_ids().into_iter().collect::<Vec<_>>(),
            vec!["/subscriptions/s1/x/id-app-2".to_string()]
        );
    }

    #[test]
    fn test_ids_at() {
        let blob = PropertyBlob::from_value(json!({
            "networkProfile": {"networkInterfaces": [{"id": "/nic/1"}, {"id": "/nic/2"}, {"other": 1}]}
        }));
        assert_eq!(
            blob.ids_at("/networkProfile/networkInterfaces", "/id"),
            vec!["/nic/1", "/nic/2"]
        );
    }

    #[test]
    fn test_descriptor_deserialize() {
        let raw = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1",
            "name": "vm1",
            "type": "Microsoft.Compute/virtualMachines",
            "resourceGroup": "rg",
            "location": "eastus",
            "subscriptionId": "s",
            "tags": {"Environment": "prod"},
            "properties": "garbage"
        });
        let r: ResourceDescriptor = serde_json::from_value(raw).expect("descriptor");
        assert!(r.is_type("microsoft.compute/virtualmachines"));
        assert_eq!(r.short_type(), "virtualMachines");
        assert_eq!(r.tag("environment"), Some("prod"));
        assert_eq!(r.properties, PropertyBlob::Unparsed("garbage".to_string()));
        assert!(r.sku.is_none());
    }
}
