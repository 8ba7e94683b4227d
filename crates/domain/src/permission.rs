use std::fmt::Display;
use std::hash::Hash;

use crate::PermissionFamily;

/// Behaviour shared by the four permission families.
///
/// See [`is_grantable_from`] and [`is_satisfied_by`] for the grant-option rules.
pub trait PermissionValue: Clone + Eq + Hash + Display {
    /// Family of the implementing type.
    fn family() -> PermissionFamily;

    /// Returns whether the holder may re-grant this permission.
    fn is_with_grant_option(&self) -> bool;

    /// Returns a copy of this permission with the grant option set.
    ///
    /// Create-family permissions also set the grant option of the wrapped
    /// post-create permission.
    #[must_use]
    fn regrantable(&self) -> Self;

    /// Equality without the outer grant option.
    ///
    /// A wrapped post-create permission still compares with its own grant option.
    fn equals_ignoring_grant_option(&self, other: &Self) -> bool;

    /// Equality of identity only: system id or custom name, and the identity of
    /// any wrapped post-create permission. All grant options are ignored.
    fn same_identity(&self, other: &Self) -> bool;

    /// Grant option of the wrapped post-create permission, if any.
    fn post_create_grant_option(&self) -> Option<bool> {
        None
    }
}

/// Returns whether `requested` may be granted by a holder of `held`.
///
/// The holder needs the grant option, the same identity, and a wrapped
/// post-create permission at least as strong as the requested one.
pub fn is_grantable_from<P: PermissionValue>(requested: &P, held: &P) -> bool {
    held.is_with_grant_option()
        && requested.same_identity(held)
        && post_create_dominated(requested, held)
}

/// Returns whether holding `held` covers a request for `requested`.
///
/// Identity must match and `held` must dominate on every grant option.
pub fn is_satisfied_by<P: PermissionValue>(requested: &P, held: &P) -> bool {
    requested.same_identity(held)
        && (!requested.is_with_grant_option() || held.is_with_grant_option())
        && post_create_dominated(requested, held)
}

fn post_create_dominated<P: PermissionValue>(requested: &P, held: &P) -> bool {
    !matches!(
        (
            requested.post_create_grant_option(),
            held.post_create_grant_option()
        ),
        (Some(true), Some(false))
    )
}
