use crate::catalog::RecordView;
use iam_model::AccessLevel;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ALL_SENTINEL: &str = "All";

/// Exact-match selector; `All` never restricts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Selector<T> {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Selector::Only(_))
    }

    #[must_use]
    pub const fn as_option(&self) -> Option<&T> {
        match self {
            Selector::All => None,
            Selector::Only(value) => Some(value),
        }
    }
}

impl<T: FromStr> Selector<T> {
    /// Parse a selector value; the `All` sentinel is case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, T::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(ALL_SENTINEL) {
            return Ok(Selector::All);
        }
        raw.parse().map(Selector::Only)
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str(ALL_SENTINEL),
            Selector::Only(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Selector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selector::All => serializer.serialize_str(ALL_SENTINEL),
            Selector::Only(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for Selector<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Selector::parse(&raw).map_err(D::Error::custom)
    }
}

/// Three-valued boolean predicate: `Any` is inactive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    #[default]
    Any,
    Yes,
    No,
}

impl TriState {
    #[must_use]
    pub const fn required(self) -> Option<bool> {
        match self {
            TriState::Any => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, TriState::Any)
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => TriState::Any,
            Some(true) => TriState::Yes,
            Some(false) => TriState::No,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        value.required()
    }
}

impl FromStr for TriState {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "any" | "null" | "" => Ok(TriState::Any),
            "yes" | "true" | "y" => Ok(TriState::Yes),
            "no" | "false" | "n" => Ok(TriState::No),
            other => Err(format!("expected any|yes|no, got '{other}'")),
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriState::Any => "any",
            TriState::Yes => "yes",
            TriState::No => "no",
        })
    }
}

/// The boolean axes a [`TriState`] can constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagPredicate {
    RequestTag,
    ResourceTag,
    TagKeys,
    ResourceLevelPermissions,
    DependentActions,
}

impl TagPredicate {
    pub const ALL: [TagPredicate; 5] = [
        TagPredicate::RequestTag,
        TagPredicate::ResourceTag,
        TagPredicate::TagKeys,
        TagPredicate::ResourceLevelPermissions,
        TagPredicate::DependentActions,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TagPredicate::RequestTag => "request-tag",
            TagPredicate::ResourceTag => "resource-tag",
            TagPredicate::TagKeys => "tag-keys",
            TagPredicate::ResourceLevelPermissions => "resource-level",
            TagPredicate::DependentActions => "dependent-actions",
        }
    }

    fn value(self, view: &RecordView<'_>) -> bool {
        let action = view.action;
        match self {
            TagPredicate::RequestTag => action.has_request_tag,
            TagPredicate::ResourceTag => action.has_resource_tag,
            TagPredicate::TagKeys => action.has_tag_keys,
            TagPredicate::ResourceLevelPermissions => action.supports_resource_level_permissions,
            TagPredicate::DependentActions => action.has_dependent_actions(),
        }
    }
}

impl FromStr for TagPredicate {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|pred| pred.as_str() == normalized)
            .ok_or_else(|| format!("unknown predicate '{}'", raw.trim()))
    }
}

/// Complete set of filter criteria; the default is fully inactive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub search: String,
    pub service: Selector<String>,
    pub access_level: Selector<AccessLevel>,
    pub has_request_tag: TriState,
    pub has_resource_tag: TriState,
    pub has_tag_keys: TriState,
    pub supports_resource_level_permissions: TriState,
    pub has_dependent_actions: TriState,
}

impl FilterSpec {
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Selector::Only(service.into());
        self
    }

    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = Selector::Only(level);
        self
    }

    #[must_use]
    pub fn with_tri(mut self, predicate: TagPredicate, state: TriState) -> Self {
        self.set_tri(predicate, state);
        self
    }

    #[must_use]
    pub const fn tri(&self, predicate: TagPredicate) -> TriState {
        match predicate {
            TagPredicate::RequestTag => self.has_request_tag,
            TagPredicate::ResourceTag => self.has_resource_tag,
            TagPredicate::TagKeys => self.has_tag_keys,
            TagPredicate::ResourceLevelPermissions => self.supports_resource_level_permissions,
            TagPredicate::DependentActions => self.has_dependent_actions,
        }
    }

    pub fn set_tri(&mut self, predicate: TagPredicate, state: TriState) {
        let slot = match predicate {
            TagPredicate::RequestTag => &mut self.has_request_tag,
            TagPredicate::ResourceTag => &mut self.has_resource_tag,
            TagPredicate::TagKeys => &mut self.has_tag_keys,
            TagPredicate::ResourceLevelPermissions => {
                &mut self.supports_resource_level_permissions
            }
            TagPredicate::DependentActions => &mut self.has_dependent_actions,
        };
        *slot = state;
    }

    #[must_use]
    pub fn search_active(&self) -> bool {
        !self.search.trim().is_empty()
    }

    /// Number of axes currently restricting the result
    #[must_use]
    pub fn active_count(&self) -> usize {
        usize::from(self.search_active())
            + usize::from(self.service.is_active())
            + usize::from(self.access_level.is_active())
            + TagPredicate::ALL
                .into_iter()
                .filter(|pred| self.tri(*pred).is_active())
                .count()
    }

    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.active_count() == 0
    }
}

/// A [`FilterSpec`] prepared for a single evaluation pass.
///
/// The search needle is lowercased once here so the per-record check is a
/// plain substring test against the precomputed key.
#[derive(Debug, Clone)]
pub struct CompiledFilter<'s> {
    needle: Option<String>,
    service: Option<&'s str>,
    access_level: Option<AccessLevel>,
    required: Vec<(TagPredicate, bool)>,
}

impl<'s> CompiledFilter<'s> {
    #[must_use]
    pub fn new(spec: &'s FilterSpec) -> Self {
        let needle = spec
            .search_active()
            .then(|| spec.search.trim().to_lowercase());
        let required = TagPredicate::ALL
            .into_iter()
            .filter_map(|pred| spec.tri(pred).required().map(|want| (pred, want)))
            .collect();
        Self {
            needle,
            service: spec.service.as_option().map(String::as_str),
            access_level: spec.access_level.as_option().copied(),
            required,
        }
    }

    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.needle.is_none()
            && self.service.is_none()
            && self.access_level.is_none()
            && self.required.is_empty()
    }

    #[must_use]
    pub fn matches(&self, view: RecordView<'_>) -> bool {
        if let Some(service) = self.service {
            if view.service.service != service {
                return false;
            }
        }
        if let Some(level) = self.access_level {
            if view.action.access_level != level {
                return false;
            }
        }
        if !self
            .required
            .iter()
            .all(|(pred, want)| pred.value(&view) == *want)
        {
            return false;
        }
        match &self.needle {
            Some(needle) => view.record.key().contains(needle.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_spec_is_inactive() {
        let spec = FilterSpec::default();
        assert!(spec.is_inactive());
        assert!(CompiledFilter::new(&spec).is_pass_through());
    }

    #[test]
    fn whitespace_search_is_inactive() {
        let spec = FilterSpec::default().with_search("   ");
        assert!(spec.is_inactive());
    }

    #[test]
    fn counts_active_axes() {
        let spec = FilterSpec::default()
            .with_search("get")
            .with_service("s3")
            .with_tri(TagPredicate::TagKeys, TriState::No);
        assert_eq!(spec.active_count(), 3);
    }

    #[test]
    fn selector_parses_all_sentinel() {
        assert_eq!(Selector::<String>::parse("all"), Ok(Selector::All));
        assert_eq!(
            Selector::<AccessLevel>::parse("Write"),
            Ok(Selector::Only(AccessLevel::Write))
        );
        assert!(Selector::<AccessLevel>::parse("Execute").is_err());
    }

    #[test]
    fn spec_serializes_with_sentinels_and_nulls() {
        let spec = FilterSpec::default()
            .with_access_level(AccessLevel::PermissionsManagement)
            .with_tri(TagPredicate::RequestTag, TriState::Yes);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["service"], "All");
        assert_eq!(value["accessLevel"], "Permissions management");
        assert_eq!(value["hasRequestTag"], true);
        assert!(value["hasTagKeys"].is_null());

        let back: FilterSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn partial_spec_json_fills_defaults() {
        let spec: FilterSpec = serde_json::from_str(r#"{"search":"s3"}"#).unwrap();
        assert_eq!(spec, FilterSpec::default().with_search("s3"));
    }

    #[test]
    fn tri_state_parses_words() {
        assert_eq!("yes".parse::<TriState>(), Ok(TriState::Yes));
        assert_eq!("FALSE".parse::<TriState>(), Ok(TriState::No));
        assert_eq!("any".parse::<TriState>(), Ok(TriState::Any));
        assert!("maybe".parse::<TriState>().is_err());
    }

    #[test]
    fn predicate_names_parse() {
        assert_eq!(
            "resource_level".parse::<TagPredicate>(),
            Ok(TagPredicate::ResourceLevelPermissions)
        );
        assert!("colour".parse::<TagPredicate>().is_err());
    }
}
