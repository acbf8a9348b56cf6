//! Simulated annealing placement
//!
//! Minimizes a weighted wirelength + congestion cost by iterative random
//! perturbation with a geometrically decreasing acceptance temperature.

use super::{ComponentPlacement, PlacementOutcome, PlacerConfig};
use crate::budget::Budget;
use crate::design::Design;
use crate::error::Result;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Move operation for simulated annealing
#[derive(Debug, Clone)]
enum Move {
    /// Swap the positions of two components
    Swap(usize, usize),
    /// Move a component to a new grid cell
    Relocate(usize, (i64, i64)),
}

/// Simulated annealing placer
pub struct SimulatedAnnealing<'a> {
    design: &'a Design,
    config: &'a PlacerConfig,
}

impl<'a> SimulatedAnnealing<'a> {
    /// Create a new annealer over the given design
    pub fn new(design: &'a Design, config: &'a PlacerConfig) -> Self {
        Self { design, config }
    }

    /// Run the annealing schedule and return the best placement found
    pub fn place(&self, budget: &Budget) -> Result<PlacementOutcome> {
        let n = self.design.components.len();
        let (die_w, die_h) = self.design.die_size();
        let grid_w = die_w.ceil() as i64;
        let grid_h = die_h.ceil() as i64;

        let mut positions = initial_grid(n, grid_w, grid_h);
        let nets = net_indices(self.design);

        if n < 2 {
            let (wirelength, congestion) = score(&positions, &nets);
            return Ok(self.outcome(positions, wirelength, congestion, 0, true));
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.config.seed);
        let mut current = positions.clone();
        let mut current_cost = self.cost(&current, &nets);
        let mut best = current.clone();
        let mut best_cost = current_cost;

        let mut temperature = self.config.initial_temperature;
        let moves_per_level = n.max(100);
        let max_dist = (grid_w.max(grid_h) / 4).max(2);

        let mut levels = 0;
        let mut calm_levels = 0;
        let mut converged = false;

        for _ in 0..self.config.max_iterations {
            budget.check("placement")?;
            let level_start_cost = current_cost;

            for _ in 0..moves_per_level {
                let move_op = self.generate_move(&current, n, max_dist, grid_w, grid_h, &mut rng);
                let candidate = apply_move(&current, &move_op);
                let candidate_cost = self.cost(&candidate, &nets);
                let delta = candidate_cost - current_cost;

                let accept = if delta <= 0.0 {
                    true
                } else {
                    rng.gen::<f64>() < (-delta / temperature).exp()
                };

                if accept {
                    current = candidate;
                    current_cost = candidate_cost;
                    if current_cost < best_cost {
                        best = current.clone();
                        best_cost = current_cost;
                    }
                }
            }

            levels += 1;
            temperature *= self.config.cooling_rate;

            // Convergence window: K consecutive levels with negligible gain
            let improvement = if level_start_cost > 0.0 {
                (level_start_cost - current_cost) / level_start_cost
            } else {
                0.0
            };
            if improvement.abs() < self.config.convergence_epsilon {
                calm_levels += 1;
                if calm_levels >= self.config.convergence_window {
                    converged = true;
                    break;
                }
            } else {
                calm_levels = 0;
            }

            if temperature < self.config.min_temperature {
                converged = true;
                break;
            }
        }

        positions = best;
        let (wirelength, congestion) = score(&positions, &nets);
        log::debug!(
            "annealing finished: cost {:.2}, {} levels, converged={}",
            best_cost,
            levels,
            converged
        );
        Ok(self.outcome(positions, wirelength, congestion, levels, converged))
    }

    fn generate_move<R: Rng>(
        &self,
        positions: &[(i64, i64)],
        n: usize,
        max_dist: i64,
        grid_w: i64,
        grid_h: i64,
        rng: &mut R,
    ) -> Move {
        let idx = rng.gen_range(0..n);
        if rng.gen::<f64>() < 0.7 {
            let mut other = rng.gen_range(0..n);
            if other == idx {
                other = (other + 1) % n;
            }
            Move::Swap(idx, other)
        } else {
            let (x, y) = positions[idx];
            let dx = rng.gen_range(-max_dist..=max_dist);
            let dy = rng.gen_range(-max_dist..=max_dist);
            let nx = (x + dx).clamp(0, grid_w - 1);
            let ny = (y + dy).clamp(0, grid_h - 1);
            Move::Relocate(idx, (nx, ny))
        }
    }

    fn cost(&self, positions: &[(i64, i64)], nets: &[(usize, usize)]) -> f64 {
        let (wirelength, congestion) = score(positions, nets);
        self.config.wirelength_weight * wirelength + self.config.congestion_weight * congestion
    }

    fn outcome(
        &self,
        positions: Vec<(i64, i64)>,
        wirelength: f64,
        congestion: f64,
        iterations: usize,
        converged: bool,
    ) -> PlacementOutcome {
        let placements = self
            .design
            .components
            .iter()
            .zip(&positions)
            .map(|(component, &(x, y))| ComponentPlacement {
                component: component.id.clone(),
                x: x as f64,
                y: y as f64,
                layer: 0,
            })
            .collect();
        let cost =
            self.config.wirelength_weight * wirelength + self.config.congestion_weight * congestion;
        PlacementOutcome {
            placements,
            wirelength,
            congestion,
            cost,
            iterations,
            converged,
        }
    }
}

/// Deterministic row-major starting placement
fn initial_grid(n: usize, grid_w: i64, grid_h: i64) -> Vec<(i64, i64)> {
    (0..n as i64)
        .map(|i| (i % grid_w, (i / grid_w) % grid_h))
        .collect()
}

/// Resolve connections to component index pairs
pub(super) fn net_indices(design: &Design) -> Vec<(usize, usize)> {
    let index: HashMap<&str, usize> = design
        .components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();
    design
        .connections
        .iter()
        .filter_map(|conn| {
            let s = index.get(conn.source.as_str())?;
            let t = index.get(conn.target.as_str())?;
            Some((*s, *t))
        })
        .collect()
}

/// Half-perimeter wirelength plus congestion overuse for a placement
fn score(positions: &[(i64, i64)], nets: &[(usize, usize)]) -> (f64, f64) {
    let mut wirelength = 0.0;
    for &(s, t) in nets {
        let (sx, sy) = positions[s];
        let (tx, ty) = positions[t];
        wirelength += ((sx - tx).abs() + (sy - ty).abs()) as f64;
    }

    // One component per site; extras count as overuse
    let mut occupancy: HashMap<(i64, i64), usize> = HashMap::new();
    for &pos in positions {
        *occupancy.entry(pos).or_insert(0) += 1;
    }
    let congestion = occupancy
        .values()
        .map(|&count| count.saturating_sub(1) as f64)
        .sum();

    (wirelength, congestion)
}

fn apply_move(positions: &[(i64, i64)], move_op: &Move) -> Vec<(i64, i64)> {
    let mut next = positions.to_vec();
    match *move_op {
        Move::Swap(a, b) => next.swap(a, b),
        Move::Relocate(idx, pos) => next[idx] = pos,
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;

    fn design_with_chain(n: usize) -> Design {
        let mut design = Design::new("chain");
        for i in 0..n {
            design.add_component(format!("c{i}"), "logic", 1.0, 1.0);
        }
        for i in 1..n {
            design.add_connection(format!("n{i}"), format!("c{}", i - 1), format!("c{i}"));
        }
        design
    }

    #[test]
    fn covers_every_component_exactly_once() {
        let design = design_with_chain(8);
        let config = PlacerConfig::default();
        let outcome = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();

        assert_eq!(outcome.placements.len(), 8);
        let mut ids: Vec<_> = outcome
            .placements
            .iter()
            .map(|p| p.component.clone())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn improves_over_random_scatter() {
        let design = design_with_chain(12);
        let config = PlacerConfig::default();
        let outcome = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();

        // A chain of 12 cells has an optimal wirelength of 11
        assert!(outcome.wirelength < 40.0, "wirelength {}", outcome.wirelength);
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let design = design_with_chain(6);
        let config = PlacerConfig::default();
        let a = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        let b = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn tight_die_reports_overuse_as_congestion() {
        // 8 cells cannot fit on a 2x2 die; the overflow shows up in the
        // congestion score instead of failing the placement
        let mut design = design_with_chain(8);
        design.constraints.max_width = Some(2.0);
        design.constraints.max_height = Some(2.0);
        let config = PlacerConfig::default();
        let outcome = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();

        assert_eq!(outcome.placements.len(), 8);
        assert!(outcome.congestion > 0.0);
        for placement in &outcome.placements {
            assert!(placement.x < 2.0 && placement.y < 2.0);
        }
    }

    #[test]
    fn single_component_design_places_trivially() {
        let mut design = Design::new("one");
        design.add_component("c0", "logic", 1.0, 1.0);
        let config = PlacerConfig::default();
        let outcome = SimulatedAnnealing::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        assert_eq!(outcome.placements.len(), 1);
        assert!(outcome.converged);
    }
}
