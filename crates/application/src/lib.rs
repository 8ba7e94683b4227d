//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_ports;
mod authorization_service;
mod domain_cascade_service;
mod hierarchy_closure;

pub use authorization_ports::{
    DomainGrantRemover, GrantRepository, HierarchyRepository, RecursiveHierarchyRepository,
    ResourceDirectory,
};
pub use authorization_service::{AuthorizationService, PermissionsByDomainAndClass};
pub use domain_cascade_service::DomainCascadeService;
pub use hierarchy_closure::{
    HierarchyClosure, IterativeHierarchyClosure, RecursiveHierarchyClosure, hierarchy_closure_for,
};
