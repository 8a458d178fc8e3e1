use crate::error::Result;
use crate::filter::{CompiledFilter, FilterSpec};
use iam_model::{
    AccessLevel, Action, ConditionKey, Dataset, DependentActionRef, Resource, Service, ShapeIssue,
};
use std::collections::HashMap;
use std::sync::Arc;

/// One (service, action) pair with its precomputed search key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecord {
    service_idx: usize,
    action_idx: usize,
    key: String,
}

impl FlatRecord {
    /// Lowercase `service:action`, used only for substring search
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn service_index(&self) -> usize {
        self.service_idx
    }

    #[must_use]
    pub const fn action_index(&self) -> usize {
        self.action_idx
    }
}

/// Borrowed view of a record joined with its service and action
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub record: &'a FlatRecord,
    pub service: &'a Service,
    pub action: &'a Action,
}

impl RecordView<'_> {
    /// Display identifier `service:Action`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.service.service, self.action.name)
    }
}

/// An action's reference by name, resolved against its own service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a, T> {
    Defined(&'a T),
    Bare(&'a str),
}

impl<T> Resolved<'_, T> {
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        matches!(self, Resolved::Defined(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DependentLink<'a> {
    pub id: &'a str,
    /// Present when the identifier is well formed and names a loaded action
    pub target: Option<RecordView<'a>>,
}

/// Immutable flattened view over one dataset load
#[derive(Debug, Clone)]
pub struct Catalog {
    dataset: Arc<Dataset>,
    records: Vec<FlatRecord>,
    by_key: HashMap<String, usize>,
    issues: Vec<ShapeIssue>,
}

impl Catalog {
    /// Flatten a dataset, absorbing shape problems as issues.
    pub fn build(dataset: Arc<Dataset>) -> Self {
        let issues = dataset.validate();
        for issue in &issues {
            if issue.is_severe() {
                log::warn!("Dataset shape: {issue}");
            } else {
                log::debug!("Dataset shape: {issue}");
            }
        }

        let mut records = Vec::with_capacity(dataset.action_count());
        let mut by_key = HashMap::with_capacity(dataset.action_count());
        for (service_idx, service) in dataset.services.iter().enumerate() {
            for (action_idx, action) in service.actions.iter().enumerate() {
                let key = format!("{}:{}", service.service, action.name).to_lowercase();
                by_key.entry(key.clone()).or_insert(records.len());
                records.push(FlatRecord {
                    service_idx,
                    action_idx,
                    key,
                });
            }
        }

        log::debug!(
            "Flattened {} services into {} records ({} shape issues)",
            dataset.services.len(),
            records.len(),
            issues.len()
        );

        Self {
            dataset,
            records,
            by_key,
            issues,
        }
    }

    /// Like [`Catalog::build`], but a `totalServices` mismatch is an error.
    pub fn build_strict(dataset: Arc<Dataset>) -> Result<Self> {
        dataset.check_service_count()?;
        Ok(Self::build(dataset))
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[ShapeIssue] {
        &self.issues
    }

    #[must_use]
    pub fn view<'a>(&'a self, record: &'a FlatRecord) -> RecordView<'a> {
        let service = &self.dataset.services[record.service_idx];
        RecordView {
            record,
            service,
            action: &service.actions[record.action_idx],
        }
    }

    #[must_use]
    pub fn view_at(&self, index: usize) -> Option<RecordView<'_>> {
        self.records.get(index).map(|record| self.view(record))
    }

    /// Look up `service:Action`, ignoring case
    #[must_use]
    pub fn find(&self, id: &str) -> Option<RecordView<'_>> {
        let key = id.trim().to_lowercase();
        self.by_key.get(&key).and_then(|&idx| self.view_at(idx))
    }

    /// Indices of matching records, in catalog order
    #[must_use]
    pub fn filter_indices(&self, spec: &FilterSpec) -> Vec<usize> {
        let compiled = CompiledFilter::new(spec);
        if compiled.is_pass_through() {
            return (0..self.records.len()).collect();
        }
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| compiled.matches(self.view(record)))
            .map(|(idx, _)| idx)
            .collect()
    }

    #[must_use]
    pub fn filter(&self, spec: &FilterSpec) -> Vec<RecordView<'_>> {
        self.filter_indices(spec)
            .into_iter()
            .filter_map(|idx| self.view_at(idx))
            .collect()
    }

    #[must_use]
    pub fn resources<'a>(&'a self, view: &RecordView<'a>) -> Vec<Resolved<'a, Resource>> {
        view.action
            .resources
            .iter()
            .map(|name| match view.service.find_resource(name) {
                Some(resource) => Resolved::Defined(resource),
                None => Resolved::Bare(name.as_str()),
            })
            .collect()
    }

    #[must_use]
    pub fn condition_keys<'a>(&'a self, view: &RecordView<'a>) -> Vec<Resolved<'a, ConditionKey>> {
        view.action
            .condition_keys
            .iter()
            .map(|name| match view.service.find_condition_key(name) {
                Some(key) => Resolved::Defined(key),
                None => Resolved::Bare(name.as_str()),
            })
            .collect()
    }

    #[must_use]
    pub fn dependents<'a>(&'a self, view: &RecordView<'a>) -> Vec<DependentLink<'a>> {
        view.action
            .dependent_actions
            .iter()
            .map(|id| DependentLink {
                id: id.as_str(),
                target: DependentActionRef::parse(id).and_then(|parsed| {
                    self.by_key
                        .get(&parsed.key())
                        .and_then(|&idx| self.view_at(idx))
                }),
            })
            .collect()
    }

    /// Service identifiers in dataset order
    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.dataset.services.iter().map(|s| s.service.as_str())
    }

    /// Access levels that occur in the dataset, in enum order
    #[must_use]
    pub fn access_levels(&self) -> Vec<AccessLevel> {
        let present: std::collections::BTreeSet<AccessLevel> = self
            .dataset
            .services
            .iter()
            .flat_map(|s| s.actions.iter().map(|a| a.access_level))
            .collect();
        present.into_iter().collect()
    }
}
