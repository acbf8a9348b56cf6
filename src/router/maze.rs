//! Lee-style maze router
//!
//! Breadth-first wavefront expansion from source to target. Finds a path
//! whenever one exists on the grid; otherwise the connection is reported
//! unroutable.

use super::RoutingGrid;
use crate::budget::Budget;
use crate::design::Waypoint;
use crate::error::Result;
use std::collections::{HashMap, VecDeque};

/// Budget check cadence during wavefront expansion
const CHECK_INTERVAL: usize = 1024;

/// Maze router over a routing grid
pub struct MazeRouter<'a> {
    grid: &'a RoutingGrid,
}

impl<'a> MazeRouter<'a> {
    /// Create a new maze router
    pub fn new(grid: &'a RoutingGrid) -> Self {
        Self { grid }
    }

    /// Expand a wavefront from source until the target is reached
    ///
    /// Cells at hard capacity block the wave; endpoints are always passable.
    /// Returns `None` when the wave exhausts the grid without reaching the
    /// target.
    pub fn find_path(
        &self,
        source: (u32, u32),
        target: (u32, u32),
        budget: &Budget,
    ) -> Result<Option<Vec<Waypoint>>> {
        if source == target {
            return Ok(Some(vec![Waypoint {
                x: source.0,
                y: source.1,
            }]));
        }

        let mut frontier = VecDeque::new();
        let mut came_from: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
        frontier.push_back(source);
        came_from.insert(source, source);

        let mut expanded = 0usize;
        while let Some(current) = frontier.pop_front() {
            expanded += 1;
            if expanded % CHECK_INTERVAL == 0 {
                budget.check("routing")?;
            }

            for neighbor in self.grid.neighbors(current) {
                if came_from.contains_key(&neighbor) {
                    continue;
                }
                if neighbor != target && neighbor != source && self.grid.is_full(neighbor) {
                    continue;
                }
                came_from.insert(neighbor, current);
                if neighbor == target {
                    return Ok(Some(backtrace(source, target, &came_from)));
                }
                frontier.push_back(neighbor);
            }
        }

        Ok(None)
    }
}

fn backtrace(
    source: (u32, u32),
    target: (u32, u32),
    came_from: &HashMap<(u32, u32), (u32, u32)>,
) -> Vec<Waypoint> {
    let mut cells = vec![target];
    let mut current = target;
    while current != source {
        current = came_from[&current];
        cells.push(current);
    }
    cells.reverse();
    cells
        .into_iter()
        .map(|(x, y)| Waypoint { x, y })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;
    use crate::router::{build_problem, RouterConfig};

    fn grid_for(n: usize) -> RoutingGrid {
        let mut design = Design::new("grid");
        for i in 0..n {
            design.add_component(format!("c{i}"), "logic", 1.0, 1.0);
        }
        build_problem(&design, &RouterConfig::default()).grid
    }

    #[test]
    fn finds_shortest_manhattan_path() {
        let grid = grid_for(9);
        let router = MazeRouter::new(&grid);
        let path = router
            .find_path((2, 2), (4, 4), &Budget::unbounded())
            .unwrap()
            .unwrap();

        // BFS guarantees a minimal path: manhattan distance + 1 cells
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&Waypoint { x: 2, y: 2 }));
        assert_eq!(path.last(), Some(&Waypoint { x: 4, y: 4 }));
    }

    #[test]
    fn saturated_neighbors_block_the_wave() {
        let mut design = Design::new("grid");
        for i in 0..9 {
            design.add_component(format!("c{i}"), "logic", 1.0, 1.0);
        }
        let config = RouterConfig {
            cell_capacity: 1,
            ..Default::default()
        };
        let mut grid = build_problem(&design, &config).grid;
        // Fill the four cells around the source; the wave has nowhere to go
        grid.commit(&[
            Waypoint { x: 1, y: 2 },
            Waypoint { x: 3, y: 2 },
            Waypoint { x: 2, y: 1 },
            Waypoint { x: 2, y: 3 },
        ]);

        let router = MazeRouter::new(&grid);
        let path = router
            .find_path((2, 2), (5, 2), &Budget::unbounded())
            .unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn adjacent_cells_route_directly() {
        let grid = grid_for(4);
        let router = MazeRouter::new(&grid);
        let path = router
            .find_path((1, 1), (1, 2), &Budget::unbounded())
            .unwrap()
            .unwrap();
        assert_eq!(path.len(), 2);
    }
}
