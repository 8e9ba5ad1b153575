use std::fmt;

use serde::Serialize;

use crate::error::JudgeError;

/// The judge's numeric identifier for a compiler/runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LanguageId(pub u32);

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Languages reference solutions may be written in, keyed the way authors name them.
const BUILTIN_LANGUAGES: &[(&str, u32)] = &[
    ("PYTHON", 71),
    ("JAVASCRIPT", 63),
    ("JAVA", 62),
    ("CPP", 54),
    ("C", 50),
    ("TYPESCRIPT", 74),
    ("GO", 60),
    ("RUST", 73),
];

/// Maps human-readable language keys to judge language ids.
///
/// Lookups are case-insensitive and never touch the network.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    registry: &'static [(&'static str, u32)],
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self {
            registry: BUILTIN_LANGUAGES,
        }
    }
}

impl LanguageResolver {
    pub fn resolve(&self, key: &str) -> Result<LanguageId, JudgeError> {
        self.registry
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key.trim()))
            .map(|&(_, id)| LanguageId(id))
            .ok_or_else(|| JudgeError::UnsupportedLanguage(key.to_string()))
    }
}
