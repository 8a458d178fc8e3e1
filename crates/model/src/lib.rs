//! # IAM Model
//!
//! Typed view of the consolidated AWS IAM service reference document.
//!
//! ## Shape
//!
//! ```text
//! Dataset
//!     │
//!     ├──> Service (service id, display name)
//!     │    ├─> Action[]        (access level, tag flags, refs by name)
//!     │    ├─> Resource[]      (ARN formats)
//!     │    └─> ConditionKey[]  (types)
//!     │
//!     └──> totalServices / failedServices / lastUpdated
//! ```
//!
//! Everything derivable from an action's own fields (tag flags, resource-level
//! support, access level from properties) is computed once while the document
//! is deserialized and stored on the [`Action`]. Nothing downstream recomputes
//! it.
//!
//! ## Example
//!
//! ```rust
//! use iam_model::{AccessLevel, Dataset};
//!
//! let raw = r#"{
//!     "services": [{
//!         "service": "s3",
//!         "name": "Amazon S3",
//!         "actions": [{
//!             "name": "GetObject",
//!             "accessLevel": "Read",
//!             "conditionKeys": ["s3:ResourceTag/team"]
//!         }]
//!     }],
//!     "totalServices": 1
//! }"#;
//!
//! let dataset = Dataset::from_json_str(raw).unwrap();
//! let action = &dataset.services[0].actions[0];
//! assert_eq!(action.access_level, AccessLevel::Read);
//! assert!(action.has_resource_tag);
//! assert!(dataset.validate().is_empty());
//! ```

mod access;
mod dataset;
mod dependent;
mod error;
mod types;

pub use access::{AccessLevel, ActionProperty};
pub use dataset::{Dataset, DatasetStats, ShapeIssue};
pub use dependent::DependentActionRef;
pub use error::{ModelError, Result};
pub use types::{Action, ConditionKey, Resource, Service};
