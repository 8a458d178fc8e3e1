use crate::access::{AccessLevel, ActionProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A permission a policy can grant, scoped to one service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawAction", rename_all = "camelCase")]
pub struct Action {
    /// Action name, unique within its service
    pub name: String,

    /// Human-readable description (empty when the source had none)
    pub description: String,

    pub access_level: AccessLevel,

    /// Condition-key identifiers usable with this action
    pub condition_keys: Vec<String>,

    /// Resource type names, references into the owning service
    pub resources: Vec<String>,

    /// External `service:Action` identifiers this action depends on
    pub dependent_actions: Vec<String>,

    pub supports_resource_level_permissions: bool,

    pub properties: BTreeMap<ActionProperty, bool>,

    pub has_request_tag: bool,
    pub has_resource_tag: bool,
    pub has_tag_keys: bool,
}

impl Action {
    /// Create an action, deriving tag flags and resource-level support
    pub fn new(name: impl Into<String>, access_level: AccessLevel) -> Self {
        Self::from(RawAction {
            name: name.into(),
            access_level: Some(access_level),
            ..RawAction::default()
        })
    }

    /// Builder: set description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: add condition key, refreshing the derived tag flags
    #[must_use]
    pub fn condition_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.has_request_tag |= key.contains("RequestTag");
        self.has_resource_tag |= key.contains("ResourceTag");
        self.has_tag_keys |= key.contains("TagKeys");
        self.condition_keys.push(key);
        self
    }

    /// Builder: add resource reference
    #[must_use]
    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resources.push(name.into());
        self.supports_resource_level_permissions = true;
        self
    }

    /// Builder: add dependent action
    #[must_use]
    pub fn dependent_action(mut self, id: impl Into<String>) -> Self {
        self.dependent_actions.push(id.into());
        self
    }

    #[must_use]
    pub fn has_dependent_actions(&self) -> bool {
        !self.dependent_actions.is_empty()
    }

    #[must_use]
    pub fn property(&self, prop: ActionProperty) -> bool {
        self.properties.get(&prop).copied().unwrap_or(false)
    }
}

/// Wire shape of an action; every field except `name` may be absent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    access_level: Option<AccessLevel>,
    #[serde(default)]
    condition_keys: Option<Vec<String>>,
    #[serde(default)]
    resources: Option<Vec<String>>,
    #[serde(default)]
    dependent_actions: Option<Vec<String>>,
    #[serde(default)]
    supports_resource_level_permissions: Option<bool>,
    #[serde(default)]
    properties: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    has_request_tag: Option<bool>,
    #[serde(default)]
    has_resource_tag: Option<bool>,
    #[serde(default)]
    has_tag_keys: Option<bool>,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let condition_keys = raw.condition_keys.unwrap_or_default();
        let resources = raw.resources.unwrap_or_default();

        let properties: BTreeMap<ActionProperty, bool> = raw
            .properties
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| ActionProperty::from_key(&key).map(|prop| (prop, value)))
            .collect();

        let access_level = raw
            .access_level
            .unwrap_or_else(|| AccessLevel::from_properties(&properties));

        let any_key = |needle: &str| condition_keys.iter().any(|key| key.contains(needle));
        let has_request_tag = raw.has_request_tag.unwrap_or_else(|| any_key("RequestTag"));
        let has_resource_tag = raw.has_resource_tag.unwrap_or_else(|| any_key("ResourceTag"));
        let has_tag_keys = raw.has_tag_keys.unwrap_or_else(|| any_key("TagKeys"));

        let supports_resource_level_permissions = raw
            .supports_resource_level_permissions
            .unwrap_or(!resources.is_empty());

        Self {
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            access_level,
            condition_keys,
            resources,
            dependent_actions: raw.dependent_actions.unwrap_or_default(),
            supports_resource_level_permissions,
            properties,
            has_request_tag,
            has_resource_tag,
            has_tag_keys,
        }
    }
}

/// A resource type belonging to a service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,

    /// ARN patterns in display order
    #[serde(default)]
    pub arn_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionKey {
    pub name: String,

    /// Data-type tags, informational only
    #[serde(default)]
    pub types: Vec<String>,
}

/// Top-level aggregate owning its actions, resources and condition keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Short identifier, globally unique (e.g. `s3`)
    pub service: String,

    /// Display name; falls back to the identifier when absent
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub condition_keys: Vec<ConditionKey>,
}

impl Service {
    pub fn new(service: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            actions: Vec::new(),
            resources: Vec::new(),
            condition_keys: Vec::new(),
        }
    }

    /// Builder: add action
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Builder: add resource type
    #[must_use]
    pub fn resource_type(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Builder: add condition key definition
    #[must_use]
    pub fn condition_key_def(mut self, key: ConditionKey) -> Self {
        self.condition_keys.push(key);
        self
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.service
        } else {
            &self.name
        }
    }

    #[must_use]
    pub fn find_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn find_condition_key(&self, name: &str) -> Option<&ConditionKey> {
        self.condition_keys.iter().find(|k| k.name == name)
    }
}
