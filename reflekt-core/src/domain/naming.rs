// reflekt-core/src/domain/naming.rs
//
// Naming conventions for events and properties. Everything here is pure:
// the rules come from the project configuration, the names from the plan.

use crate::domain::error::DomainError;
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    Snake,
    Camel,
    Pascal,
    Title,
    #[default]
    Any,
}

impl NameCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snake => "snake",
            Self::Camel => "camel",
            Self::Pascal => "pascal",
            Self::Title => "title",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for NameCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NameCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snake" => Ok(Self::Snake),
            "camel" => Ok(Self::Camel),
            "pascal" => Ok(Self::Pascal),
            "title" => Ok(Self::Title),
            "any" => Ok(Self::Any),
            _ => Err(format!("Unknown naming case: {}", s)),
        }
    }
}

/// Re-case `name`. `Any` is the identity.
pub fn apply_case(name: &str, case: NameCase) -> String {
    match case {
        NameCase::Snake => name.to_case(Case::Snake),
        NameCase::Camel => name.to_case(Case::Camel),
        NameCase::Pascal => name.to_case(Case::Pascal),
        NameCase::Title => name.to_case(Case::Title),
        NameCase::Any => name.to_string(),
    }
}

pub fn strip_numbers(name: &str) -> String {
    name.chars().filter(|c| !c.is_ascii_digit()).collect()
}

fn default_true() -> bool {
    true
}

/// One naming rule (`conventions.event` or `conventions.property`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingRule {
    #[serde(default)]
    pub case: NameCase,

    #[serde(default = "default_true")]
    pub allow_numbers: bool,

    #[serde(default)]
    pub reserved: Vec<String>,
}

impl Default for NamingRule {
    fn default() -> Self {
        Self {
            case: NameCase::Any,
            allow_numbers: true,
            reserved: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingViolation {
    Case { expected: String },
    Numbers,
    Reserved,
}

impl fmt::Display for NamingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case { expected } => write!(f, "name does not match case (expected '{}')", expected),
            Self::Numbers => write!(f, "numbers are not allowed in names"),
            Self::Reserved => write!(f, "name is a reserved word"),
        }
    }
}

impl NamingRule {
    pub fn new(case: NameCase, allow_numbers: bool) -> Self {
        Self {
            case,
            allow_numbers,
            reserved: Vec::new(),
        }
    }

    pub fn with_reserved<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved = words.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive membership in the reserved list.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.iter().any(|w| w.eq_ignore_ascii_case(name))
    }

    /// Case + numbers check. Reserved words are checked separately
    /// (`check_reserved`) because plan-level validation runs it on its own.
    pub fn check(&self, name: &str) -> Result<(), NamingViolation> {
        if !self.allow_numbers && name.chars().any(|c| c.is_ascii_digit()) {
            return Err(NamingViolation::Numbers);
        }

        // Digit boundaries split words in the case engine ("prop2" -> "prop_2"),
        // so a name also conforms when its digit-free form does.
        let expected = apply_case(name, self.case);
        let digit_free = strip_numbers(name);
        if expected != name && apply_case(&digit_free, self.case) != digit_free {
            let expected = if self.allow_numbers {
                expected
            } else {
                apply_case(&digit_free, self.case)
            };
            return Err(NamingViolation::Case { expected });
        }

        Ok(())
    }

    pub fn check_reserved(&self, name: &str) -> Result<(), NamingViolation> {
        if self.is_reserved(name) {
            return Err(NamingViolation::Reserved);
        }
        Ok(())
    }

    /// `check` lifted into a `DomainError` located at `path`.
    pub fn enforce(&self, path: &str, name: &str) -> Result<(), DomainError> {
        self.check(name).map_err(|v| self.violation(path, name, v))
    }

    pub fn enforce_not_reserved(&self, path: &str, name: &str) -> Result<(), DomainError> {
        self.check_reserved(name)
            .map_err(|v| self.violation(path, name, v))
    }

    fn violation(&self, path: &str, name: &str, violation: NamingViolation) -> DomainError {
        DomainError::NamingConvention {
            path: path.to_string(),
            rule: self.to_string(),
            message: format!("'{}': {}", name, violation),
        }
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "case: {}, allow_numbers: {}",
            self.case, self.allow_numbers
        )?;
        if !self.reserved.is_empty() {
            write!(f, ", reserved: [{}]", self.reserved.join(", "))?;
        }
        Ok(())
    }
}
