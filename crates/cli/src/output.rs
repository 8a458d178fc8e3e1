use iam_model::{AccessLevel, DatasetStats, ShapeIssue};
use iam_search::{Catalog, FilterSpec, RecordView, Resolved};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutput<'a> {
    pub id: String,
    pub service: &'a str,
    pub service_name: &'a str,
    pub action: &'a str,
    pub description: &'a str,
    pub access_level: AccessLevel,
    pub resources: &'a [String],
    pub condition_keys: &'a [String],
    pub dependent_actions: &'a [String],
    pub supports_resource_level_permissions: bool,
    pub has_request_tag: bool,
    pub has_resource_tag: bool,
    pub has_tag_keys: bool,
}

impl<'a> From<&RecordView<'a>> for RecordOutput<'a> {
    fn from(view: &RecordView<'a>) -> Self {
        let action = view.action;
        Self {
            id: view.id(),
            service: &view.service.service,
            service_name: view.service.display_name(),
            action: &action.name,
            description: &action.description,
            access_level: action.access_level,
            resources: &action.resources,
            condition_keys: &action.condition_keys,
            dependent_actions: &action.dependent_actions,
            supports_resource_level_permissions: action.supports_resource_level_permissions,
            has_request_tag: action.has_request_tag,
            has_resource_tag: action.has_resource_tag,
            has_tag_keys: action.has_tag_keys,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput<'a> {
    pub filter: &'a FilterSpec,
    pub matched: usize,
    pub total: usize,
    pub shown: usize,
    pub has_more: bool,
    pub records: Vec<RecordOutput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceOutput<'a> {
    pub name: &'a str,
    /// False for names the service does not define
    pub defined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn_formats: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentOutput<'a> {
    pub id: &'a str,
    pub resolved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDetailOutput<'a> {
    #[serde(flatten)]
    pub record: RecordOutput<'a>,
    pub resource_details: Vec<ReferenceOutput<'a>>,
    pub condition_key_details: Vec<ReferenceOutput<'a>>,
    pub dependents: Vec<DependentOutput<'a>>,
}

impl<'a> ActionDetailOutput<'a> {
    pub fn build(catalog: &'a Catalog, view: &RecordView<'a>) -> Self {
        let resource_details = catalog
            .resources(view)
            .into_iter()
            .map(|resolved| match resolved {
                Resolved::Defined(resource) => ReferenceOutput {
                    name: &resource.name,
                    defined: true,
                    arn_formats: Some(&resource.arn_formats),
                    types: None,
                },
                Resolved::Bare(name) => ReferenceOutput {
                    name,
                    defined: false,
                    arn_formats: None,
                    types: None,
                },
            })
            .collect();
        let condition_key_details = catalog
            .condition_keys(view)
            .into_iter()
            .map(|resolved| match resolved {
                Resolved::Defined(key) => ReferenceOutput {
                    name: &key.name,
                    defined: true,
                    arn_formats: None,
                    types: Some(&key.types),
                },
                Resolved::Bare(name) => ReferenceOutput {
                    name,
                    defined: false,
                    arn_formats: None,
                    types: None,
                },
            })
            .collect();
        let dependents = catalog
            .dependents(view)
            .into_iter()
            .map(|link| DependentOutput {
                id: link.id,
                resolved: link.target.is_some(),
            })
            .collect();

        Self {
            record: RecordOutput::from(view),
            resource_details,
            condition_key_details,
            dependents,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOutput<'a> {
    #[serde(flatten)]
    pub stats: DatasetStats,
    pub total_services: Option<usize>,
    pub last_updated: Option<&'a str>,
    pub failed_service_ids: &'a [String],
    pub issues: &'a [ShapeIssue],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOutput<'a> {
    pub service: &'a str,
    pub name: &'a str,
    pub actions: usize,
    pub resources: usize,
    pub condition_keys: usize,
}
