use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use tessera_core::{AppError, AppResult, DomainId, ResourceId};
use tessera_domain::{AncestorDomain, ClosureStrategy, DescendantDomain, InheritedAccessor};

use crate::authorization_ports::{HierarchyRepository, RecursiveHierarchyRepository};

use super::{
    HierarchyClosure, IterativeHierarchyClosure, RecursiveHierarchyClosure, hierarchy_closure_for,
};

/// Edge store whose "native" closures return every path length, unsorted.
#[derive(Default)]
struct EdgeStore {
    inherit: BTreeSet<(i64, i64)>,
    parents: BTreeMap<i64, i64>,
}

impl EdgeStore {
    fn with_inherit(edges: &[(i64, i64)]) -> Self {
        Self {
            inherit: edges.iter().copied().collect(),
            parents: BTreeMap::new(),
        }
    }

    fn with_parents(edges: &[(i64, i64)]) -> Self {
        Self {
            inherit: BTreeSet::new(),
            parents: edges.iter().copied().collect(),
        }
    }

    /// Every `(node, walk length)` pair up to eight hops, longest first.
    fn walk(start: i64, next: impl Fn(i64) -> Vec<i64>) -> Vec<(i64, u32)> {
        let mut reached = vec![(start, 0)];
        let mut frontier = BTreeSet::from([start]);
        for depth in 1..=8 {
            frontier = frontier.into_iter().flat_map(&next).collect();
            reached.extend(frontier.iter().map(|node| (*node, depth)));
        }
        reached.reverse();
        reached
    }
}

#[async_trait]
impl HierarchyRepository for EdgeStore {
    async fn list_inherit_donors(&self, accessor_ids: &[ResourceId]) -> AppResult<Vec<ResourceId>> {
        Ok(self
            .inherit
            .iter()
            .filter(|(accessor, _)| accessor_ids.contains(&ResourceId::new(*accessor)))
            .map(|(_, donor)| ResourceId::new(*donor))
            .collect())
    }

    async fn find_parent_domain(&self, domain_id: DomainId) -> AppResult<Option<DomainId>> {
        Ok(self
            .parents
            .get(&domain_id.as_i64())
            .map(|parent| DomainId::new(*parent)))
    }

    async fn list_child_domains(&self, domain_ids: &[DomainId]) -> AppResult<Vec<DomainId>> {
        Ok(self
            .parents
            .iter()
            .filter(|(_, parent)| domain_ids.contains(&DomainId::new(**parent)))
            .map(|(child, _)| DomainId::new(*child))
            .collect())
    }
}

#[async_trait]
impl RecursiveHierarchyRepository for EdgeStore {
    async fn accessor_closure(
        &self,
        accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        let next = |node: i64| -> Vec<i64> {
            self.inherit
                .iter()
                .filter(|(accessor, _)| *accessor == node)
                .map(|(_, donor)| *donor)
                .collect()
        };
        Ok(Self::walk(accessor_id.as_i64(), next)
            .into_iter()
            .map(|(id, level)| InheritedAccessor::new(ResourceId::new(id), level))
            .collect())
    }

    async fn ancestor_domains(&self, domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        let next =
            |node: i64| -> Vec<i64> { self.parents.get(&node).copied().into_iter().collect() };
        Ok(Self::walk(domain_id.as_i64(), next)
            .into_iter()
            .map(|(id, level)| AncestorDomain::new(DomainId::new(id), level))
            .collect())
    }

    async fn descendant_domains(&self, domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        let next = |node: i64| -> Vec<i64> {
            self.parents
                .iter()
                .filter(|(_, parent)| **parent == node)
                .map(|(child, _)| *child)
                .collect()
        };
        Ok(Self::walk(domain_id.as_i64(), next)
            .into_iter()
            .map(|(id, level)| DescendantDomain::new(DomainId::new(id), level))
            .collect())
    }
}

fn accessor_levels(closure: &[InheritedAccessor]) -> Vec<(i64, u32)> {
    closure
        .iter()
        .map(|entry| (entry.resource_id.as_i64(), entry.inherit_level))
        .collect()
}

#[tokio::test]
async fn mutual_inheritance_terminates_with_both_resources() {
    let store = Arc::new(EdgeStore::with_inherit(&[(1, 2), (2, 1)]));

    for closure in [
        hierarchy_closure_for(ClosureStrategy::Iterative, store.clone()),
        hierarchy_closure_for(ClosureStrategy::Recursive, store.clone()),
    ] {
        let result = closure.accessor_closure(ResourceId::new(1)).await;
        assert_eq!(
            result.map(|closure| accessor_levels(&closure)).ok(),
            Some(vec![(1, 0), (2, 1)])
        );
    }
}

#[tokio::test]
async fn shortest_hop_count_is_reported() {
    let store = Arc::new(EdgeStore::with_inherit(&[(1, 2), (2, 3), (1, 3), (3, 4)]));
    let closure = IterativeHierarchyClosure::new(store);

    let result = closure.accessor_closure(ResourceId::new(1)).await;
    assert_eq!(
        result.map(|closure| accessor_levels(&closure)).ok(),
        Some(vec![(1, 0), (2, 1), (3, 1), (4, 2)])
    );
}

#[tokio::test]
async fn ancestors_run_from_domain_to_root() {
    let store = Arc::new(EdgeStore::with_parents(&[(2, 1), (3, 2), (4, 2)]));

    for closure in [
        hierarchy_closure_for(ClosureStrategy::Iterative, store.clone()),
        hierarchy_closure_for(ClosureStrategy::Recursive, store.clone()),
    ] {
        let ancestors: Vec<(i64, u32)> = closure
            .ancestor_domains(DomainId::new(3))
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|entry| (entry.domain_id.as_i64(), entry.domain_level))
            .collect();
        assert_eq!(ancestors, vec![(3, 0), (2, 1), (1, 2)]);
    }
}

#[tokio::test]
async fn descendants_are_tagged_with_relative_level() {
    let store = Arc::new(EdgeStore::with_parents(&[(2, 1), (3, 2), (4, 2), (5, 4)]));

    for closure in [
        hierarchy_closure_for(ClosureStrategy::Iterative, store.clone()),
        hierarchy_closure_for(ClosureStrategy::Recursive, store.clone()),
    ] {
        let descendants: Vec<(i64, u32)> = closure
            .descendant_domains(DomainId::new(2))
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|entry| (entry.domain_id.as_i64(), entry.level))
            .collect();
        assert_eq!(descendants, vec![(2, 0), (3, 1), (4, 1), (5, 2)]);
    }
}

struct MisbehavingStore;

#[async_trait]
impl RecursiveHierarchyRepository for MisbehavingStore {
    async fn accessor_closure(
        &self,
        _accessor_id: ResourceId,
    ) -> AppResult<Vec<InheritedAccessor>> {
        Ok(Vec::new())
    }

    async fn ancestor_domains(&self, _domain_id: DomainId) -> AppResult<Vec<AncestorDomain>> {
        Ok(Vec::new())
    }

    async fn descendant_domains(&self, _domain_id: DomainId) -> AppResult<Vec<DescendantDomain>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn recursive_closure_rejects_result_without_seed() {
    let closure = RecursiveHierarchyClosure::new(Arc::new(MisbehavingStore));

    let result = closure.accessor_closure(ResourceId::new(7)).await;
    assert!(matches!(result, Err(AppError::Internal(_))));
}

fn edges() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0_i64..6, 0_i64..6), 0..14)
}

/// Child-to-parent links where every parent has a lower id than its child.
fn parent_forest() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..8).prop_map(
        |parents| {
            parents
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(child, parent)| {
                    let parent = parent.as_ref()?.index(child);
                    Some((i64::try_from(child).ok()?, i64::try_from(parent).ok()?))
                })
                .collect()
        },
    )
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(error) => panic!("failed to build test runtime: {error}"),
    }
}

proptest! {
    #[test]
    fn strategies_agree_on_cyclic_graphs(edges in edges(), start in 0_i64..6) {
        let runtime = runtime();
        let store = Arc::new(EdgeStore::with_inherit(&edges));
        let iterative = IterativeHierarchyClosure::new(store.clone());
        let recursive = RecursiveHierarchyClosure::new(store);

        let (left, right, repeated) = runtime.block_on(async {
            (
                iterative.accessor_closure(ResourceId::new(start)).await,
                recursive.accessor_closure(ResourceId::new(start)).await,
                iterative.accessor_closure(ResourceId::new(start)).await,
            )
        });

        prop_assert_eq!(left.as_ref().ok(), repeated.as_ref().ok());
        prop_assert_eq!(left.ok(), right.ok());
    }

    #[test]
    fn strategies_agree_on_random_domain_forests(
        forest in parent_forest(),
        start in 0_i64..8,
    ) {
        let runtime = runtime();
        let store = Arc::new(EdgeStore::with_parents(&forest));
        let iterative = IterativeHierarchyClosure::new(store.clone());
        let recursive = RecursiveHierarchyClosure::new(store);
        let domain_id = DomainId::new(start);

        let (walked_up, native_up, walked_down, native_down, repeated_down) =
            runtime.block_on(async {
                (
                    iterative.ancestor_domains(domain_id).await,
                    recursive.ancestor_domains(domain_id).await,
                    iterative.descendant_domains(domain_id).await,
                    recursive.descendant_domains(domain_id).await,
                    recursive.descendant_domains(domain_id).await,
                )
            });

        let levels: Vec<u32> = walked_up
            .as_ref()
            .map(|chain| chain.iter().map(|ancestor| ancestor.domain_level).collect())
            .unwrap_or_default();
        let unbroken: Vec<u32> = (0..).take(levels.len()).collect();
        prop_assert_eq!(levels, unbroken);
        prop_assert_eq!(walked_up.ok(), native_up.ok());
        prop_assert_eq!(native_down.as_ref().ok(), repeated_down.as_ref().ok());
        prop_assert_eq!(walked_down.ok(), native_down.ok());
    }
}
