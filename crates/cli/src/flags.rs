use clap::ValueEnum;
use iam_model::AccessLevel;
use iam_search::{Selector, TriState};

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum TriFlag {
    #[default]
    Any,
    Yes,
    No,
}

impl TriFlag {
    pub(crate) const fn as_domain(self) -> TriState {
        match self {
            TriFlag::Any => TriState::Any,
            TriFlag::Yes => TriState::Yes,
            TriFlag::No => TriState::No,
        }
    }
}

pub(crate) fn parse_service(raw: &str) -> Result<Selector<String>, String> {
    if raw.trim().is_empty() {
        return Err("service must not be empty".to_string());
    }
    Selector::parse(raw).map_err(|never| match never {})
}

pub(crate) fn parse_access_level(raw: &str) -> Result<Selector<AccessLevel>, String> {
    Selector::parse(raw)
}
