//! Display names from ARNs

use regex::Regex;
use std::sync::OnceLock;

/// How much of the ARN to strip to get the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// `arn:p:svc:region:acct:type:NAME`
    AfterResourceType,
    /// `arn:p:svc:region:acct:NAME`
    AfterAccount,
    /// `arn:p:svc:region:acct:type/.../NAME`
    AfterSlash,
}

fn after_resource_type() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^arn:[^:]*:[^:]*:[^:]*:[0-9]*:[^:]*:").expect("valid regex"))
}

fn after_account() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^arn:[^:]*:[^:]*:[^:]*:[0-9]*:").expect("valid regex"))
}

fn after_slash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^arn:[^:]*:[^:]*:[^:]*:[0-9]*:[^:]*/").expect("valid regex"))
}

impl NameRule {
    fn regex(&self) -> &'static Regex {
        match self {
            NameRule::AfterResourceType => after_resource_type(),
            NameRule::AfterAccount => after_account(),
            NameRule::AfterSlash => after_slash(),
        }
    }

    /// The display name, or `None` if the ARN does not have the expected shape.
    pub fn display_name<'a>(&self, arn: &'a str) -> Option<&'a str> {
        let prefix = self.regex().find(arn)?;
        let name = &arn[prefix.end()..];
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
#[path = "arn_test.rs"]
mod tests;
