use once_cell::sync::Lazy;
use regex::Regex;

static DEPENDENT_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9-]+):([A-Za-z][A-Za-z0-9]*)$").expect("valid dependent action regex")
});

/// A parsed `service:Action` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentActionRef<'a> {
    pub service: &'a str,
    pub action: &'a str,
}

impl<'a> DependentActionRef<'a> {
    /// Parse an identifier; malformed identifiers yield `None` and are kept
    /// as bare strings by callers.
    #[must_use]
    pub fn parse(raw: &'a str) -> Option<Self> {
        let caps = DEPENDENT_ACTION.captures(raw.trim())?;
        let service = caps.get(1)?.as_str();
        let action = caps.get(2)?.as_str();
        Some(Self { service, action })
    }

    /// Lowercase `service:action` key, comparable with catalog search keys
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.service, self.action).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_and_action() {
        let parsed = DependentActionRef::parse("iam:PassRole").expect("parsed");
        assert_eq!(parsed.service, "iam");
        assert_eq!(parsed.action, "PassRole");
        assert_eq!(parsed.key(), "iam:passrole");
    }

    #[test]
    fn accepts_hyphenated_service_ids() {
        let parsed = DependentActionRef::parse(" access-analyzer:ValidatePolicy ").expect("parsed");
        assert_eq!(parsed.service, "access-analyzer");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert!(DependentActionRef::parse("PassRole").is_none());
        assert!(DependentActionRef::parse("IAM:PassRole").is_none());
        assert!(DependentActionRef::parse("iam:Pass Role").is_none());
        assert!(DependentActionRef::parse("iam:").is_none());
    }
}
