use std::str::FromStr;

use serde::Serialize;
use tessera_core::{AppError, DomainId, ResourceId};

/// Resource reached from an accessor through `*INHERIT` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InheritedAccessor {
    /// Hops from the accessor; `0` is the accessor itself.
    pub inherit_level: u32,
    /// Reached resource.
    pub resource_id: ResourceId,
}

impl InheritedAccessor {
    /// Creates an accessor closure entry.
    #[must_use]
    pub fn new(resource_id: ResourceId, inherit_level: u32) -> Self {
        Self {
            inherit_level,
            resource_id,
        }
    }
}

/// Entry of a domain's ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AncestorDomain {
    /// Hops above the queried domain; `0` is the domain itself.
    pub domain_level: u32,
    /// Ancestor domain.
    pub domain_id: DomainId,
}

impl AncestorDomain {
    /// Creates an ancestor chain entry.
    #[must_use]
    pub fn new(domain_id: DomainId, domain_level: u32) -> Self {
        Self {
            domain_level,
            domain_id,
        }
    }
}

/// Entry of a domain's descendant closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DescendantDomain {
    /// Depth below the queried domain; `0` is the domain itself.
    pub level: u32,
    /// Descendant domain.
    pub domain_id: DomainId,
}

impl DescendantDomain {
    /// Creates a descendant closure entry.
    #[must_use]
    pub fn new(domain_id: DomainId, level: u32) -> Self {
        Self { level, domain_id }
    }
}

/// How hierarchy closures are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureStrategy {
    /// The store evaluates the closure as one fixed-point query.
    #[default]
    Recursive,
    /// Level-by-level expansion over single-hop store reads.
    Iterative,
}

impl ClosureStrategy {
    /// Returns the stable configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Iterative => "iterative",
        }
    }
}

impl FromStr for ClosureStrategy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "iterative" => Ok(Self::Iterative),
            other => Err(AppError::Validation(format!(
                "unknown closure strategy '{other}', expected 'recursive' or 'iterative'"
            ))),
        }
    }
}
