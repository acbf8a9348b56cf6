//! Routing engine
//!
//! Determines physical wire paths for every connection over a routing grid
//! derived from placement coordinates:
//! - A* shortest-path search with a congestion-aware cost function
//! - Lee-style maze routing (breadth-first wavefront expansion)
//!
//! Congestion is negotiated PathFinder-style within a single routing run:
//! cells accumulate a history cost as nets over-subscribe them, steering
//! later nets away.

mod astar;
mod maze;

pub use astar::AStarRouter;
pub use maze::MazeRouter;

use crate::budget::Budget;
use crate::design::{Design, Position, Waypoint};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Routing algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAlgorithm {
    /// A* shortest-path search with congestion penalties
    #[default]
    AStar,
    /// Lee-style breadth-first maze routing
    MazeRouting,
}

impl RoutingAlgorithm {
    /// Resolve an algorithm name, falling back to the default
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("a_star") => Self::AStar,
            Some("maze_routing") => Self::MazeRouting,
            Some(other) => {
                log::warn!(
                    "unknown routing algorithm '{}', falling back to {}",
                    other,
                    Self::default().as_str()
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Canonical algorithm name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AStar => "a_star",
            Self::MazeRouting => "maze_routing",
        }
    }
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Hard capacity per grid cell; cells at capacity become obstacles
    pub cell_capacity: usize,
    /// Cost multiplier applied per unit of present congestion
    pub congestion_penalty: f64,
    /// History cost weight for cells that were over-subscribed earlier
    pub history_cost_factor: f64,
    /// Margin of empty cells around the placement bounding box
    pub grid_margin: u32,
    /// Wall-clock timeout for a single routing run
    pub timeout: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cell_capacity: 4,
            congestion_penalty: 0.5,
            history_cost_factor: 0.3,
            grid_margin: 2,
            timeout: None,
        }
    }
}

/// Outcome of routing a single connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RouteStatus {
    /// Path found; ordered waypoints from source to target
    Routed { waypoints: Vec<Waypoint> },
    /// No path exists on the grid for this connection
    Unroutable { reason: String },
}

/// Per-connection routing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedPath {
    /// Connection id
    pub connection: String,
    /// Routed waypoints or the unroutable marker
    #[serde(flatten)]
    pub status: RouteStatus,
}

/// Result of a routing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingOutcome {
    /// Exactly one entry per design connection
    pub paths: Vec<RoutedPath>,
    /// Total length of all routed paths in grid steps
    pub total_wirelength: u64,
    /// Bend count across all routed paths (via proxy)
    pub via_count: u64,
    /// Highest cell usage observed relative to capacity
    pub max_congestion: f64,
    /// Connections that could not be routed
    pub unrouted: usize,
    /// Routing grid width
    pub grid_width: u32,
    /// Routing grid height
    pub grid_height: u32,
}

/// Routing grid shared by both algorithms
///
/// Tracks per-cell usage and PathFinder-style history cost accumulated while
/// routing the nets of one run.
pub struct RoutingGrid {
    width: u32,
    height: u32,
    capacity: usize,
    usage: HashMap<(u32, u32), usize>,
    history: HashMap<(u32, u32), f64>,
}

impl RoutingGrid {
    fn new(width: u32, height: u32, capacity: usize) -> Self {
        Self {
            width,
            height,
            capacity,
            usage: HashMap::new(),
            history: HashMap::new(),
        }
    }

    /// Grid dimensions
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a cell is at hard capacity
    pub fn is_full(&self, cell: (u32, u32)) -> bool {
        self.usage.get(&cell).copied().unwrap_or(0) >= self.capacity
    }

    /// Congestion-aware cost multiplier for stepping into a cell
    pub fn cost_factor(&self, cell: (u32, u32), penalty: f64, history_factor: f64) -> f64 {
        let usage = self.usage.get(&cell).copied().unwrap_or(0) as f64;
        let history = self.history.get(&cell).copied().unwrap_or(0.0);
        1.0 + penalty * usage + history_factor * history
    }

    /// Orthogonal neighbors of a cell
    pub fn neighbors(&self, cell: (u32, u32)) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (x, y) = cell;
        let deltas = [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)];
        deltas.into_iter().filter_map(move |(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && ny >= 0 && (nx as u32) < self.width && (ny as u32) < self.height {
                Some((nx as u32, ny as u32))
            } else {
                None
            }
        })
    }

    /// Commit a routed path, updating usage and history costs
    fn commit(&mut self, waypoints: &[Waypoint]) {
        for wp in waypoints {
            let count = self.usage.entry((wp.x, wp.y)).or_insert(0);
            *count += 1;
            if *count > self.capacity {
                *self.history.entry((wp.x, wp.y)).or_insert(0.0) += 1.0;
            }
        }
    }

    fn max_congestion(&self) -> f64 {
        self.usage
            .values()
            .map(|&u| u as f64 / self.capacity as f64)
            .fold(0.0, f64::max)
    }
}

/// Endpoints of every connection resolved to grid cells
pub(crate) struct RoutingProblem {
    pub grid: RoutingGrid,
    /// (connection id, source cell, target cell)
    pub nets: Vec<(String, (u32, u32), (u32, u32))>,
}

/// Build the routing problem from the design's placement overlay
///
/// A design that has not been placed yet gets a deterministic row-major
/// default placement so routing stays independently invocable.
pub(crate) fn build_problem(design: &Design, config: &RouterConfig) -> RoutingProblem {
    let positions: IndexMap<String, Position> = match &design.placement {
        Some(placement) => placement.clone(),
        None => default_positions(design),
    };

    let margin = config.grid_margin;
    let max_x = positions.values().map(|p| p.x).fold(0.0f64, f64::max);
    let max_y = positions.values().map(|p| p.y).fold(0.0f64, f64::max);
    let width = max_x.ceil() as u32 + margin * 2 + 1;
    let height = max_y.ceil() as u32 + margin * 2 + 1;

    let cell_of = |position: &Position| -> (u32, u32) {
        (
            position.x.round().max(0.0) as u32 + margin,
            position.y.round().max(0.0) as u32 + margin,
        )
    };

    let nets = design
        .connections
        .iter()
        .map(|conn| {
            let source = positions
                .get(&conn.source)
                .map(&cell_of)
                .unwrap_or((margin, margin));
            let target = positions
                .get(&conn.target)
                .map(&cell_of)
                .unwrap_or((margin, margin));
            (conn.id.clone(), source, target)
        })
        .collect();

    RoutingProblem {
        grid: RoutingGrid::new(width, height, config.cell_capacity),
        nets,
    }
}

fn default_positions(design: &Design) -> IndexMap<String, Position> {
    let cols = (design.components.len() as f64).sqrt().ceil().max(1.0) as usize;
    design
        .components
        .iter()
        .enumerate()
        .map(|(i, component)| {
            (
                component.id.clone(),
                Position {
                    x: (i % cols) as f64 * 2.0,
                    y: (i / cols) as f64 * 2.0,
                    layer: 0,
                },
            )
        })
        .collect()
}

/// Run the selected routing algorithm over every connection
pub fn route(
    design: &Design,
    algorithm: RoutingAlgorithm,
    config: &RouterConfig,
    budget: &Budget,
) -> Result<RoutingOutcome> {
    let mut problem = build_problem(design, config);
    let mut paths = Vec::with_capacity(problem.nets.len());
    let mut total_wirelength = 0u64;
    let mut via_count = 0u64;
    let mut unrouted = 0usize;

    let nets = std::mem::take(&mut problem.nets);
    for (connection, source, target) in nets {
        budget.check("routing")?;

        let found = match algorithm {
            RoutingAlgorithm::AStar => {
                AStarRouter::new(&problem.grid, config).find_path(source, target, budget)?
            }
            RoutingAlgorithm::MazeRouting => {
                MazeRouter::new(&problem.grid).find_path(source, target, budget)?
            }
        };

        match found {
            Some(waypoints) => {
                total_wirelength += waypoints.len().saturating_sub(1) as u64;
                via_count += bends(&waypoints);
                problem.grid.commit(&waypoints);
                paths.push(RoutedPath {
                    connection,
                    status: RouteStatus::Routed { waypoints },
                });
            }
            None => {
                unrouted += 1;
                paths.push(RoutedPath {
                    connection,
                    status: RouteStatus::Unroutable {
                        reason: "no path through routing grid".to_string(),
                    },
                });
            }
        }
    }

    let (grid_width, grid_height) = problem.grid.size();
    log::debug!(
        "routing finished: {}/{} routed, wirelength {}",
        paths.len() - unrouted,
        paths.len(),
        total_wirelength
    );
    Ok(RoutingOutcome {
        max_congestion: problem.grid.max_congestion(),
        paths,
        total_wirelength,
        via_count,
        unrouted,
        grid_width,
        grid_height,
    })
}

/// Direction changes along a path, used as a via-count proxy
fn bends(waypoints: &[Waypoint]) -> u64 {
    waypoints
        .windows(3)
        .filter(|w| {
            let d1 = (w[1].x as i64 - w[0].x as i64, w[1].y as i64 - w[0].y as i64);
            let d2 = (w[2].x as i64 - w[1].x as i64, w[2].y as i64 - w[1].y as i64);
            d1 != d2
        })
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(
            RoutingAlgorithm::from_name(Some("wormhole")),
            RoutingAlgorithm::AStar
        );
        assert_eq!(
            RoutingAlgorithm::from_name(Some("maze_routing")),
            RoutingAlgorithm::MazeRouting
        );
    }

    #[test]
    fn unroutable_connection_gets_an_explicit_entry() {
        let mut design = Design::new("tight");
        design
            .add_component("c0", "logic", 1.0, 1.0)
            .add_component("c1", "logic", 1.0, 1.0)
            .add_connection("n1", "c0", "c1");
        design.placement = Some(
            [
                ("c0".to_string(), Position { x: 0.0, y: 0.0, layer: 0 }),
                ("c1".to_string(), Position { x: 4.0, y: 0.0, layer: 0 }),
            ]
            .into_iter()
            .collect(),
        );
        // Zero capacity leaves only the endpoint cells passable, and the
        // endpoints are too far apart to touch
        let config = RouterConfig {
            cell_capacity: 0,
            ..Default::default()
        };

        for algorithm in [RoutingAlgorithm::AStar, RoutingAlgorithm::MazeRouting] {
            let outcome = route(&design, algorithm, &config, &Budget::unbounded()).unwrap();
            assert_eq!(outcome.paths.len(), 1);
            assert_eq!(outcome.unrouted, 1);
            assert!(matches!(
                outcome.paths[0].status,
                RouteStatus::Unroutable { .. }
            ));
        }
    }

    #[test]
    fn bend_counting() {
        let straight = [
            Waypoint { x: 0, y: 0 },
            Waypoint { x: 1, y: 0 },
            Waypoint { x: 2, y: 0 },
        ];
        assert_eq!(bends(&straight), 0);

        let elbow = [
            Waypoint { x: 0, y: 0 },
            Waypoint { x: 1, y: 0 },
            Waypoint { x: 1, y: 1 },
        ];
        assert_eq!(bends(&elbow), 1);
    }
}
