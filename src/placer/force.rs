//! Force-directed placement
//!
//! Models connections as springs and components as mutually repelling bodies,
//! integrating position updates until the residual force settles below a
//! threshold or the iteration budget runs out.

use super::{ComponentPlacement, PlacementOutcome, PlacerConfig};
use crate::budget::Budget;
use crate::design::Design;
use crate::error::{OptimizeError, Result};
use std::collections::HashMap;

/// Residual force above this multiple of the threshold counts as divergence
const DIVERGENCE_FACTOR: f64 = 10.0;

/// Force-directed placer
pub struct ForceDirected<'a> {
    design: &'a Design,
    config: &'a PlacerConfig,
}

impl<'a> ForceDirected<'a> {
    /// Create a new force-directed placer over the given design
    pub fn new(design: &'a Design, config: &'a PlacerConfig) -> Self {
        Self { design, config }
    }

    /// Iterate spring/repulsion updates until the system settles
    pub fn place(&self, budget: &Budget) -> Result<PlacementOutcome> {
        let n = self.design.components.len();
        let (die_w, die_h) = self.design.die_size();

        // Deterministic spread as the starting state
        let cols = (n as f64).sqrt().ceil().max(1.0);
        let mut positions: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let col = (i as f64) % cols;
                let row = ((i / cols as usize) as f64) + 0.5;
                (
                    (col + 0.5) * die_w / cols,
                    (row * die_h / cols).min(die_h - 0.5),
                )
            })
            .collect();

        let nets = super::annealing::net_indices(self.design);

        let mut iterations = 0;
        let mut converged = n < 2;
        let mut max_force = 0.0;

        for _ in 0..self.config.max_iterations {
            if converged {
                break;
            }
            budget.check("placement")?;
            iterations += 1;
            max_force = 0.0;

            let mut forces = vec![(0.0f64, 0.0f64); n];

            // Spring attraction along nets
            for &(s, t) in &nets {
                let dx = positions[t].0 - positions[s].0;
                let dy = positions[t].1 - positions[s].1;
                let fx = self.config.spring_constant * dx;
                let fy = self.config.spring_constant * dy;
                forces[s].0 += fx;
                forces[s].1 += fy;
                forces[t].0 -= fx;
                forces[t].1 -= fy;
            }

            // Pairwise repulsion keeps cells from collapsing onto one site
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = positions[i].0 - positions[j].0;
                    let dy = positions[i].1 - positions[j].1;
                    let dist_sq = (dx * dx + dy * dy).max(0.01);
                    let dist = dist_sq.sqrt();
                    let magnitude = self.config.repulsion_constant / dist_sq;
                    let fx = magnitude * dx / dist;
                    let fy = magnitude * dy / dist;
                    forces[i].0 += fx;
                    forces[i].1 += fy;
                    forces[j].0 -= fx;
                    forces[j].1 -= fy;
                }
            }

            for i in 0..n {
                let (fx, fy) = forces[i];
                let magnitude = (fx * fx + fy * fy).sqrt();
                if magnitude > max_force {
                    max_force = magnitude;
                }
                positions[i].0 = (positions[i].0 + self.config.damping * fx).clamp(0.0, die_w);
                positions[i].1 = (positions[i].1 + self.config.damping * fy).clamp(0.0, die_h);
            }

            if max_force < self.config.force_threshold {
                converged = true;
            }
        }

        if !converged && max_force > self.config.force_threshold * DIVERGENCE_FACTOR {
            return Err(OptimizeError::NonConvergence(format!(
                "force-directed placement still unsettled after {} iterations (residual force {:.3})",
                iterations, max_force
            )));
        }

        let placements: Vec<ComponentPlacement> = self
            .design
            .components
            .iter()
            .zip(&positions)
            .map(|(component, &(x, y))| ComponentPlacement {
                component: component.id.clone(),
                x,
                y,
                layer: 0,
            })
            .collect();

        let (wirelength, congestion) = continuous_score(&positions, &nets);
        let cost =
            self.config.wirelength_weight * wirelength + self.config.congestion_weight * congestion;
        log::debug!(
            "force-directed finished: {} iterations, residual force {:.3}, converged={}",
            iterations,
            max_force,
            converged
        );
        Ok(PlacementOutcome {
            placements,
            wirelength,
            congestion,
            cost,
            iterations,
            converged,
        })
    }
}

/// Euclidean wirelength and unit-bin overuse for continuous positions
fn continuous_score(positions: &[(f64, f64)], nets: &[(usize, usize)]) -> (f64, f64) {
    let mut wirelength = 0.0;
    for &(s, t) in nets {
        let dx = positions[s].0 - positions[t].0;
        let dy = positions[s].1 - positions[t].1;
        wirelength += (dx * dx + dy * dy).sqrt();
    }

    let mut occupancy: HashMap<(i64, i64), usize> = HashMap::new();
    for &(x, y) in positions {
        *occupancy.entry((x.floor() as i64, y.floor() as i64)).or_insert(0) += 1;
    }
    let congestion = occupancy
        .values()
        .map(|&count| count.saturating_sub(1) as f64)
        .sum();

    (wirelength, congestion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;

    fn star_design() -> Design {
        let mut design = Design::new("star");
        design.add_component("hub", "logic", 1.0, 1.0);
        for i in 0..4 {
            design.add_component(format!("leaf{i}"), "logic", 1.0, 1.0);
            design.add_connection(format!("n{i}"), "hub", format!("leaf{i}"));
        }
        design
    }

    #[test]
    fn places_every_component() {
        let design = star_design();
        let config = PlacerConfig::default();
        let outcome = ForceDirected::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        assert_eq!(outcome.placements.len(), 5);
    }

    #[test]
    fn positions_stay_inside_die() {
        let design = star_design();
        let config = PlacerConfig::default();
        let outcome = ForceDirected::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        let (die_w, die_h) = design.die_size();
        for placement in &outcome.placements {
            assert!(placement.x >= 0.0 && placement.x <= die_w);
            assert!(placement.y >= 0.0 && placement.y <= die_h);
        }
    }

    #[test]
    fn empty_design_converges_immediately() {
        let design = Design::new("empty");
        let config = PlacerConfig::default();
        let outcome = ForceDirected::new(&design, &config)
            .place(&Budget::unbounded())
            .unwrap();
        assert!(outcome.placements.is_empty());
        assert!(outcome.converged);
    }
}
