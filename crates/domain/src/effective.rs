use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::PermissionValue;

/// A resolved permission and how it was obtained.
///
/// Provenance is reporting metadata: equality and hashing only look at the permission.
#[derive(Debug, Clone, Serialize)]
pub struct EffectivePermission<P> {
    /// Resolved permission.
    pub permission: P,
    /// Resource-inheritance hops between the accessor and the grant holder.
    pub inherit_level: u32,
    /// Domain-ancestor hops between the queried domain and the grant's domain.
    pub domain_level: u32,
}

impl<P> EffectivePermission<P> {
    /// Creates an effective permission.
    #[must_use]
    pub fn new(permission: P, inherit_level: u32, domain_level: u32) -> Self {
        Self {
            permission,
            inherit_level,
            domain_level,
        }
    }

    /// Wraps a permission held directly on the queried target.
    #[must_use]
    pub fn direct(permission: P) -> Self {
        Self::new(permission, 0, 0)
    }

    fn provenance(&self) -> (u32, u32) {
        (self.inherit_level, self.domain_level)
    }
}

impl<P: PartialEq> PartialEq for EffectivePermission<P> {
    fn eq(&self, other: &Self) -> bool {
        self.permission == other.permission
    }
}

impl<P: Eq> Eq for EffectivePermission<P> {}

impl<P: Hash> Hash for EffectivePermission<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.permission.hash(state);
    }
}

/// Merges collected permissions into a deterministic effective set.
///
/// Entries equal ignoring grant option collapse into one: the grantable copy
/// wins, then the lowest `(inherit_level, domain_level)`. The output is sorted by
/// rendered permission.
#[must_use]
pub fn merge_effective_permissions<P: PermissionValue>(
    collected: impl IntoIterator<Item = EffectivePermission<P>>,
) -> Vec<EffectivePermission<P>> {
    let mut merged: Vec<EffectivePermission<P>> = Vec::new();

    for candidate in collected {
        let existing = merged.iter_mut().find(|entry| {
            entry
                .permission
                .equals_ignoring_grant_option(&candidate.permission)
        });

        match existing {
            None => merged.push(candidate),
            Some(entry) => {
                if outranks(&candidate, entry) {
                    *entry = candidate;
                }
            }
        }
    }

    merged.sort_by_cached_key(|entry| entry.permission.to_string());
    merged
}

fn outranks<P: PermissionValue>(
    candidate: &EffectivePermission<P>,
    current: &EffectivePermission<P>,
) -> bool {
    let candidate_grant = candidate.permission.is_with_grant_option();
    let current_grant = current.permission.is_with_grant_option();
    if candidate_grant != current_grant {
        return candidate_grant;
    }

    candidate.provenance() < current.provenance()
}
