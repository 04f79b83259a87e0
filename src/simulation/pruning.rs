//! Removal of primordial binaries
//!
//! Binary identification depends on the cluster's tidal field, which changes
//! as stars are removed, so pruning repeats until a pass finds nothing:
//!
//! 1. integrate to t = 1e-15 so the state is consistent,
//! 2. find bound pairs; none -> done,
//! 3. remove the higher-index member of every pair, highest index first,
//! 4. integrate forward by a relative 1e-14 and update population membership,
//! 5. go to 2.
//!
//! Nothing guarantees a fixed point is reached; `max_rounds` bounds the loop
//! when set.

use std::collections::HashSet;

use log::{debug, info, warn};
use thiserror::Error;

use crate::simulation::binaries::BinaryPair;
use crate::simulation::context::{Simulation, StepEvent};
use crate::simulation::populations::Population;
use crate::simulation::states::ParticleId;

/// Integration target that materializes the initial state
pub const WARMUP_TIME: f64 = 1.0e-15;

/// Relative time advance between rounds
pub const ROUND_ADVANCE: f64 = 1.0e-14;

#[derive(Debug, Error)]
pub enum PruneError {
    #[error("binary pruning did not converge after {rounds} rounds ({remaining} binaries left)")]
    NotConverged { rounds: usize, remaining: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneOutcome {
    pub rounds: usize,  // passes that removed something
    pub removed: usize, // bodies removed in total
}

/// Indices to delete for a set of pairs: the higher index of each pair,
/// de-duplicated, in descending order. Index 0 is never returned.
pub fn removal_order(pairs: &[BinaryPair]) -> Vec<usize> {
    let mut indices: Vec<usize> = pairs
        .iter()
        .map(|p| p.index1.max(p.index2))
        .filter(|&i| i > 0)
        .collect();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();
    indices
}

/// Remove binaries until none are left (or `max_rounds` passes removed
/// something and binaries remain).
pub fn prune_binaries(
    sim: &mut Simulation,
    populations: &mut [Population],
    max_rounds: Option<usize>,
) -> Result<PruneOutcome, PruneError> {
    let mut outcome = PruneOutcome::default();

    sim.move_to_com();
    let escaped = escaped_ids(&sim.integrate(WARMUP_TIME));
    if !escaped.is_empty() {
        debug!("{} stars left the box during warm-up", escaped.len());
        for pop in populations.iter_mut() {
            pop.forget(&escaped);
        }
    }

    loop {
        let pairs = sim.find_binaries();
        if pairs.is_empty() {
            info!(
                "binary pruning converged after {} rounds, {} stars removed",
                outcome.rounds, outcome.removed
            );
            return Ok(outcome);
        }

        if let Some(limit) = max_rounds {
            if outcome.rounds >= limit {
                warn!("binary pruning stopped at the round limit with {} binaries left", pairs.len());
                return Err(PruneError::NotConverged {
                    rounds: outcome.rounds,
                    remaining: pairs.len(),
                });
            }
        }

        let to_delete = removal_order(&pairs);
        let mut removed: HashSet<ParticleId> = to_delete
            .iter()
            .filter_map(|&index| sim.remove(index))
            .map(|b| b.id)
            .collect();

        let pruned = removed.len();

        let t = sim.t();
        let escaped = escaped_ids(&sim.integrate(t + t * ROUND_ADVANCE));
        removed.extend(escaped);

        for pop in populations.iter_mut() {
            pop.forget(&removed);
        }

        outcome.rounds += 1;
        outcome.removed += pruned;
        debug!(
            "pruning round {}: {} binaries, {} stars removed, {} bodies left",
            outcome.rounds,
            pairs.len(),
            pruned,
            sim.len()
        );
    }
}

/// Ids of bodies that left an open boundary
fn escaped_ids(events: &[StepEvent]) -> HashSet<ParticleId> {
    events
        .iter()
        .filter_map(|event| match event {
            StepEvent::Escape { id, .. } => Some(*id),
            StepEvent::Collision(_) => None,
        })
        .collect()
}
