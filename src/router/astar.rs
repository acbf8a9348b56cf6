//! A* shortest-path router
//!
//! Grid search per connection with Euclidean-distance heuristic; step cost is
//! segment length scaled by the congestion factor of the entered cell.

use super::{RouterConfig, RoutingGrid};
use crate::budget::Budget;
use crate::design::Waypoint;
use crate::error::Result;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Budget check cadence during node expansion
const CHECK_INTERVAL: usize = 1024;

/// A* search node
#[derive(Clone)]
struct AStarNode {
    cell: (u32, u32),
    f_score: f64,
}

impl Eq for AStarNode {}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* router over a routing grid
pub struct AStarRouter<'a> {
    grid: &'a RoutingGrid,
    config: &'a RouterConfig,
}

impl<'a> AStarRouter<'a> {
    /// Create a new A* router
    pub fn new(grid: &'a RoutingGrid, config: &'a RouterConfig) -> Self {
        Self { grid, config }
    }

    /// Find a path from source to target cell
    ///
    /// Returns `None` when the target is unreachable (all approaches at hard
    /// capacity). Endpoint cells are always expandable.
    pub fn find_path(
        &self,
        source: (u32, u32),
        target: (u32, u32),
        budget: &Budget,
    ) -> Result<Option<Vec<Waypoint>>> {
        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
        let mut g_scores: HashMap<(u32, u32), f64> = HashMap::new();
        let mut closed_set: HashSet<(u32, u32)> = HashSet::new();

        g_scores.insert(source, 0.0);
        open_set.push(AStarNode {
            cell: source,
            f_score: heuristic(source, target),
        });

        let mut expanded = 0usize;
        while let Some(current) = open_set.pop() {
            if current.cell == target {
                return Ok(Some(reconstruct(source, target, &came_from)));
            }

            if !closed_set.insert(current.cell) {
                continue;
            }

            expanded += 1;
            if expanded % CHECK_INTERVAL == 0 {
                budget.check("routing")?;
            }

            let current_g = g_scores.get(&current.cell).copied().unwrap_or(f64::MAX);

            for neighbor in self.grid.neighbors(current.cell) {
                if closed_set.contains(&neighbor) {
                    continue;
                }
                // Full cells are obstacles, except the endpoints themselves
                if neighbor != target && neighbor != source && self.grid.is_full(neighbor) {
                    continue;
                }

                let step_cost = self.grid.cost_factor(
                    neighbor,
                    self.config.congestion_penalty,
                    self.config.history_cost_factor,
                );
                let tentative_g = current_g + step_cost;

                let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f64::MAX);
                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.cell);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(AStarNode {
                        cell: neighbor,
                        f_score: tentative_g + heuristic(neighbor, target),
                    });
                }
            }
        }

        Ok(None)
    }
}

/// Euclidean distance heuristic
fn heuristic(cell: (u32, u32), target: (u32, u32)) -> f64 {
    let dx = cell.0 as f64 - target.0 as f64;
    let dy = cell.1 as f64 - target.1 as f64;
    (dx * dx + dy * dy).sqrt()
}

fn reconstruct(
    source: (u32, u32),
    target: (u32, u32),
    came_from: &HashMap<(u32, u32), (u32, u32)>,
) -> Vec<Waypoint> {
    let mut cells = vec![target];
    let mut current = target;
    while current != source {
        match came_from.get(&current) {
            Some(&prev) => {
                cells.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    cells.reverse();
    cells
        .into_iter()
        .map(|(x, y)| Waypoint { x, y })
        .collect()
}
