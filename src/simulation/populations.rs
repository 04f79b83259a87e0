//! Named groups of stars sharing a sampling law
//!
//! Members are tracked by `ParticleId`, so removals elsewhere never
//! invalidate them. The positional index range of a population is derived on
//! demand; because bodies are only appended per population and removals keep
//! relative order, ranges stay contiguous and non-overlapping.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::simulation::context::Simulation;
use crate::simulation::states::ParticleId;

#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub name: String,
    pub target: usize,             // configured N
    pub members: Vec<ParticleId>,  // in insertion order
}

impl Population {
    pub fn new(name: impl Into<String>, target: usize) -> Self {
        Self {
            name: name.into(),
            target,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current positional index range of the surviving members
    pub fn index_range(&self, sim: &Simulation) -> Option<RangeInclusive<usize>> {
        let indices = sim.index_map();
        let (lo, hi) = self
            .members
            .iter()
            .filter_map(|id| indices.get(id).copied())
            .fold((usize::MAX, 0), |(lo, hi), i| (lo.min(i), hi.max(i)));
        (lo <= hi).then_some(lo..=hi)
    }

    /// Drop removed members; returns how many were in this population
    pub fn forget(&mut self, removed: &HashSet<ParticleId>) -> usize {
        let before = self.members.len();
        self.members.retain(|id| !removed.contains(id));
        before - self.members.len()
    }
}

/// Remove each population's members beyond its target, walking populations
/// in reverse and each population from its highest index down. Members no
/// longer in the simulation are dropped first and do not count towards the
/// target. Returns the number of bodies removed.
pub fn truncate_to_targets(sim: &mut Simulation, populations: &mut [Population]) -> usize {
    let mut removed = 0;
    for pop in populations.iter_mut().rev() {
        pop.members.retain(|id| sim.index_of(*id).is_some());
        if pop.members.len() <= pop.target {
            continue;
        }
        let excess = pop.members.split_off(pop.target);
        for id in excess.iter().rev() {
            if sim.remove_id(*id).is_some() {
                removed += 1;
            }
        }
    }
    removed
}
