//! Conflict resolution between matched capabilities.
//!
//! Candidates arrive in registry order. A candidate made redundant by an
//! accepted one is discarded; a candidate that makes accepted ones
//! redundant replaces them. Two unrelated primary candidates claiming a
//! common ability cannot both stay: the one registered first wins. Derived
//! capabilities never conflict, they only read what primaries maintain.

use std::collections::BTreeSet;

use capahub_domain::ability::Ability;

use crate::capability::{CapabilityKind, Role};
use crate::registry::CapabilityDescriptor;

/// A descriptor that matched, with the abilities it matched on.
#[derive(Debug, Clone)]
pub struct Candidate {
    descriptor: CapabilityDescriptor,
    abilities: BTreeSet<Ability>,
}

impl Candidate {
    #[must_use]
    pub fn new(descriptor: CapabilityDescriptor, abilities: BTreeSet<Ability>) -> Self {
        Self {
            descriptor,
            abilities,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        self.descriptor.kind
    }

    #[must_use]
    pub fn abilities(&self) -> &BTreeSet<Ability> {
        &self.abilities
    }

    fn subsumes(&self, other: &Self) -> bool {
        self.descriptor.subsumes.contains(&other.kind())
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.descriptor.role() == Role::Primary
            && other.descriptor.role() == Role::Primary
            && !self.subsumes(other)
            && !other.subsumes(self)
            && !self.abilities.is_disjoint(&other.abilities)
    }
}

/// Reduce `candidates` to a conflict-free set, in acceptance order.
#[must_use]
pub fn resolve(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if let Some(winner) = accepted.iter().find(|a| a.subsumes(&candidate)) {
            tracing::debug!(discarded = %candidate.kind(), by = %winner.kind(), "subsumed capability");
            continue;
        }
        if let Some(winner) = accepted.iter().find(|a| a.conflicts_with(&candidate)) {
            tracing::debug!(discarded = %candidate.kind(), by = %winner.kind(), "conflicting capability");
            continue;
        }
        accepted.retain(|a| {
            let keep = !candidate.subsumes(a);
            if !keep {
                tracing::debug!(replaced = %a.kind(), by = %candidate.kind(), "subsumed capability");
            }
            keep
        });
        accepted.push(candidate);
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Predicate;
    use capahub_domain::ability::ns;

    fn candidate(kind: CapabilityKind, abilities: &[&str]) -> Candidate {
        Candidate::new(
            CapabilityDescriptor::builtin(kind),
            abilities.iter().copied().map(Ability::from).collect(),
        )
    }

    fn kinds(resolved: &[Candidate]) -> Vec<CapabilityKind> {
        resolved.iter().map(Candidate::kind).collect()
    }

    #[test]
    fn should_drop_subsumed_candidate_in_either_order() {
        let toggle = candidate(CapabilityKind::Toggle, &[ns::CONTROL_TOGGLE]);
        let togglex = candidate(CapabilityKind::ToggleX, &[ns::CONTROL_TOGGLEX]);

        let forward = resolve([toggle.clone(), togglex.clone()]);
        let backward = resolve([togglex, toggle]);

        assert_eq!(kinds(&forward), vec![CapabilityKind::ToggleX]);
        assert_eq!(kinds(&backward), vec![CapabilityKind::ToggleX]);
    }

    #[test]
    fn should_keep_first_of_unrelated_candidates_sharing_an_ability() {
        let first = candidate(CapabilityKind::Spray, &[ns::CONTROL_SPRAY]);
        let second = Candidate::new(
            CapabilityDescriptor {
                kind: CapabilityKind::DiffuserSpray,
                predicate: Predicate::Abilities(&[ns::CONTROL_SPRAY]),
                subsumes: &[],
            },
            [Ability::from(ns::CONTROL_SPRAY)].into_iter().collect(),
        );

        assert_eq!(kinds(&resolve([first, second])), vec![CapabilityKind::Spray]);
    }

    #[test]
    fn should_exempt_derived_candidates_from_conflicts() {
        let luminance = candidate(CapabilityKind::Luminance, &[ns::CONTROL_LUMINANCE]);
        let plant = candidate(CapabilityKind::PlantLight, &[ns::CONTROL_LUMINANCE, ns::SYSTEM_ALL]);

        assert_eq!(
            kinds(&resolve([luminance, plant])),
            vec![CapabilityKind::Luminance, CapabilityKind::PlantLight]
        );
    }

    #[test]
    fn should_keep_candidates_with_disjoint_abilities() {
        let resolved = resolve([
            candidate(CapabilityKind::SystemAll, &[ns::SYSTEM_ALL]),
            candidate(CapabilityKind::Luminance, &[ns::CONTROL_LUMINANCE]),
            candidate(CapabilityKind::ToggleX, &[ns::CONTROL_TOGGLEX]),
        ]);
        assert_eq!(resolved.len(), 3);
    }
}
