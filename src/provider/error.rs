use std::fmt;

use super::Category;

/// Failure inside a single provider. Logged, never allowed to abort siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    Save(Category, String),
    Load(Category, String),
    Apply(Category, String),
    Remove(Category, String),
    Codec(Category, String),
}

impl ProviderError {
    pub fn category(&self) -> Category {
        match self {
            ProviderError::Save(c, _)
            | ProviderError::Load(c, _)
            | ProviderError::Apply(c, _)
            | ProviderError::Remove(c, _)
            | ProviderError::Codec(c, _) => *c,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Save(c, msg) => write!(f, "failed to save {} component: {}", c, msg),
            ProviderError::Load(c, msg) => write!(f, "failed to load {} component: {}", c, msg),
            ProviderError::Apply(c, msg) => write!(f, "failed to apply {} component: {}", c, msg),
            ProviderError::Remove(c, msg) => {
                write!(f, "failed to remove {} components: {}", c, msg)
            }
            ProviderError::Codec(c, msg) => write!(f, "{} component codec error: {}", c, msg),
        }
    }
}

impl std::error::Error for ProviderError {}
