//! Randomized node selection with partial connectivity.
//!
//! Gives visual variety across repeated views of the same dataset:
//! 1. ~70% of the budget is drawn uniformly at random.
//! 2. The rest grows breadth-first from a random already-chosen node, with
//!    neighbors ordered by degree plus a random bias, reseeding from another
//!    chosen node whenever the frontier runs dry.
//! 3. Anything still missing (isolated regions) is filled uniformly.
//!
//! The generator is seeded, so a fixed seed yields a fixed selection.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::graph::GraphDataset;

/// Share of the node budget drawn uniformly.
const RANDOM_SHARE: f64 = 0.7;

/// Upper bound of the random bias added to a neighbor's degree.
const DEGREE_BIAS: f64 = 2.0;

/// Select exactly `min(max_nodes, node_count)` node slots.
pub(super) fn select_slots(dataset: &GraphDataset, max_nodes: usize, seed: u64) -> Vec<usize> {
    let node_count = dataset.node_count();
    let budget = max_nodes.min(node_count);
    if budget == 0 {
        return Vec::new();
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let random_count = ((budget as f64 * RANDOM_SHARE).ceil() as usize).clamp(1, budget);

    let mut order: Vec<usize> = (0..node_count).collect();
    order.shuffle(&mut rng);

    let mut chosen = vec![false; node_count];
    let mut selected = Vec::with_capacity(budget);
    for &slot in order.iter().take(random_count) {
        chosen[slot] = true;
        selected.push(slot);
    }

    let mut expanded = vec![false; node_count];
    let mut frontier = VecDeque::new();
    if let Some(&start) = selected.choose(&mut rng) {
        frontier.push_back(start);
    }

    while selected.len() < budget {
        let current = match frontier.pop_front() {
            Some(slot) => slot,
            None => {
                let candidates: Vec<usize> = selected
                    .iter()
                    .copied()
                    .filter(|&slot| !expanded[slot])
                    .collect();
                match candidates.choose(&mut rng) {
                    Some(&slot) => slot,
                    None => break,
                }
            }
        };
        if expanded[current] {
            continue;
        }
        expanded[current] = true;

        for neighbor in biased_neighbors(dataset, current, &mut rng) {
            if selected.len() >= budget {
                break;
            }
            if chosen[neighbor] {
                continue;
            }
            chosen[neighbor] = true;
            selected.push(neighbor);
            frontier.push_back(neighbor);
        }
    }

    for &slot in order.iter().skip(random_count) {
        if selected.len() >= budget {
            break;
        }
        if !chosen[slot] {
            chosen[slot] = true;
            selected.push(slot);
        }
    }

    selected
}

/// Distinct neighbors ordered by degree plus a random bias, highest first.
fn biased_neighbors(dataset: &GraphDataset, slot: usize, rng: &mut SmallRng) -> Vec<usize> {
    let mut neighbors = dataset.neighbor_slots(slot);
    neighbors.sort_unstable();
    neighbors.dedup();

    let mut keyed: Vec<(usize, f64)> = neighbors
        .into_iter()
        .map(|neighbor| {
            let bias = rng.gen_range(0.0..DEGREE_BIAS);
            (neighbor, dataset.degree_at(neighbor) as f64 + bias)
        })
        .collect();
    keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
    keyed.into_iter().map(|(neighbor, _)| neighbor).collect()
}
