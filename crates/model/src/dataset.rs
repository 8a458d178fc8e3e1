use crate::access::AccessLevel;
use crate::error::{ModelError, Result};
use crate::types::Service;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Root of the consolidated reference document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub services: Vec<Service>,

    /// Declared service count; checked against `services`, never trusted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_services: Option<usize>,

    /// Services the upstream fetcher failed to load
    #[serde(default)]
    pub failed_services: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// A non-fatal problem with the document's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeIssue {
    ServiceCountMismatch {
        declared: usize,
        actual: usize,
    },
    DuplicateAction {
        service: String,
        action: String,
    },
    DanglingResource {
        service: String,
        action: String,
        resource: String,
    },
    DanglingConditionKey {
        service: String,
        action: String,
        condition_key: String,
    },
}

impl ShapeIssue {
    /// Count mismatches are worth a warning; dangling refs are routine in
    /// scraped data.
    #[must_use]
    pub const fn is_severe(&self) -> bool {
        matches!(self, ShapeIssue::ServiceCountMismatch { .. })
    }
}

impl fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeIssue::ServiceCountMismatch { declared, actual } => write!(
                f,
                "totalServices={declared} but {actual} services are present"
            ),
            ShapeIssue::DuplicateAction { service, action } => {
                write!(f, "duplicate action {service}:{action}")
            }
            ShapeIssue::DanglingResource {
                service,
                action,
                resource,
            } => write!(
                f,
                "{service}:{action} references unknown resource '{resource}'"
            ),
            ShapeIssue::DanglingConditionKey {
                service,
                action,
                condition_key,
            } => write!(
                f,
                "{service}:{action} references unknown condition key '{condition_key}'"
            ),
        }
    }
}

/// Aggregate counts over a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub services: usize,
    pub failed_services: usize,
    pub actions: usize,
    pub actions_with_description: usize,
    pub actions_with_dependents: usize,
    pub dependent_relationships: usize,
    pub resource_types: usize,
    pub condition_keys: usize,
    pub by_access_level: BTreeMap<AccessLevel, usize>,
}

impl Dataset {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Build a dataset whose declared count matches its services
    #[must_use]
    pub fn from_services(services: Vec<Service>) -> Self {
        Self {
            total_services: Some(services.len()),
            services,
            failed_services: Vec::new(),
            last_updated: None,
        }
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.services.iter().map(|s| s.actions.len()).sum()
    }

    #[must_use]
    pub fn find_service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.service == id)
    }

    /// Fail only when `totalServices` is present and wrong
    pub fn check_service_count(&self) -> Result<()> {
        match self.total_services {
            Some(declared) if declared != self.services.len() => {
                Err(ModelError::ServiceCountMismatch {
                    declared,
                    actual: self.services.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Collect every shape problem without failing
    #[must_use]
    pub fn validate(&self) -> Vec<ShapeIssue> {
        let mut issues = Vec::new();

        if let Err(ModelError::ServiceCountMismatch { declared, actual }) =
            self.check_service_count()
        {
            issues.push(ShapeIssue::ServiceCountMismatch { declared, actual });
        }

        for service in &self.services {
            let resources: HashSet<&str> =
                service.resources.iter().map(|r| r.name.as_str()).collect();
            let keys: HashSet<&str> = service
                .condition_keys
                .iter()
                .map(|k| k.name.as_str())
                .collect();
            let mut seen: HashSet<&str> = HashSet::new();

            for action in &service.actions {
                if !seen.insert(action.name.as_str()) {
                    issues.push(ShapeIssue::DuplicateAction {
                        service: service.service.clone(),
                        action: action.name.clone(),
                    });
                }
                for resource in &action.resources {
                    if !resources.contains(resource.as_str()) {
                        issues.push(ShapeIssue::DanglingResource {
                            service: service.service.clone(),
                            action: action.name.clone(),
                            resource: resource.clone(),
                        });
                    }
                }
                // Global keys (aws:*) are never defined per service.
                for key in &action.condition_keys {
                    if key.starts_with("aws:") {
                        continue;
                    }
                    if !keys.contains(key.as_str()) {
                        issues.push(ShapeIssue::DanglingConditionKey {
                            service: service.service.clone(),
                            action: action.name.clone(),
                            condition_key: key.clone(),
                        });
                    }
                }
            }
        }

        issues
    }

    #[must_use]
    pub fn stats(&self) -> DatasetStats {
        let mut stats = DatasetStats {
            services: self.services.len(),
            failed_services: self.failed_services.len(),
            ..DatasetStats::default()
        };

        for service in &self.services {
            stats.resource_types += service.resources.len();
            stats.condition_keys += service.condition_keys.len();
            for action in &service.actions {
                stats.actions += 1;
                if !action.description.trim().is_empty() {
                    stats.actions_with_description += 1;
                }
                if action.has_dependent_actions() {
                    stats.actions_with_dependents += 1;
                }
                stats.dependent_relationships += action.dependent_actions.len();
                *stats.by_access_level.entry(action.access_level).or_insert(0) += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, ConditionKey, Resource};
    use pretty_assertions::assert_eq;

    fn sample() -> Dataset {
        Dataset::from_services(vec![
            Service::new("s3", "Amazon S3")
                .resource_type(Resource {
                    name: "object".to_string(),
                    arn_formats: vec!["arn:${Partition}:s3:::${BucketName}/${ObjectName}".into()],
                })
                .condition_key_def(ConditionKey {
                    name: "s3:ResourceTag/foo".to_string(),
                    types: vec!["String".to_string()],
                })
                .action(
                    Action::new("GetObject", AccessLevel::Read)
                        .description("Read an object")
                        .resource("object")
                        .condition_key("s3:ResourceTag/foo"),
                ),
            Service::new("ec2", "Amazon EC2").action(
                Action::new("RunInstances", AccessLevel::Write)
                    .resource("instance")
                    .condition_key("aws:RequestTag/Name")
                    .dependent_action("iam:PassRole"),
            ),
        ])
    }

    #[test]
    fn consistent_dataset_has_only_dangling_ref_issues() {
        let issues = sample().validate();
        assert_eq!(
            issues,
            vec![ShapeIssue::DanglingResource {
                service: "ec2".to_string(),
                action: "RunInstances".to_string(),
                resource: "instance".to_string(),
            }]
        );
        assert!(sample().check_service_count().is_ok());
    }

    #[test]
    fn reports_service_count_mismatch() {
        let mut dataset = sample();
        dataset.total_services = Some(5);
        let issues = dataset.validate();
        assert!(issues.iter().any(ShapeIssue::is_severe));
        assert!(matches!(
            dataset.check_service_count(),
            Err(ModelError::ServiceCountMismatch {
                declared: 5,
                actual: 2
            })
        ));
    }

    #[test]
    fn missing_total_skips_count_check() {
        let mut dataset = sample();
        dataset.total_services = None;
        assert!(dataset.check_service_count().is_ok());
    }

    #[test]
    fn stats_count_actions_and_relationships() {
        let stats = sample().stats();
        assert_eq!(stats.services, 2);
        assert_eq!(stats.actions, 2);
        assert_eq!(stats.actions_with_description, 1);
        assert_eq!(stats.actions_with_dependents, 1);
        assert_eq!(stats.dependent_relationships, 1);
        assert_eq!(stats.resource_types, 1);
        assert_eq!(stats.condition_keys, 1);
        assert_eq!(stats.by_access_level.get(&AccessLevel::Write), Some(&1));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Dataset::from_json_str("{\"services\": 3").unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }
}
