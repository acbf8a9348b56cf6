//! Timing optimization
//!
//! Computes slack (required minus actual delay) for every timing path and
//! repairs violations with buffer insertion and gate resizing until slack is
//! non-negative or the correction-attempt budget runs out. Paths still
//! violating after the budget are reported, not silently dropped.

use crate::design::Design;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Timing optimizer configuration
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Maximum correction attempts per violating path
    pub max_repair_attempts: usize,
    /// Fractional delay reduction per inserted buffer
    pub buffer_delay_reduction: f64,
    /// Fractional delay reduction per gate resize
    pub resize_delay_reduction: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_repair_attempts: 10,
            buffer_delay_reduction: 0.03,
            resize_delay_reduction: 0.05,
        }
    }
}

/// Repair report for a single timing path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRepair {
    /// Path id
    pub path: String,
    /// Slack before repair in ns
    pub slack_before: f64,
    /// Slack after repair in ns
    pub slack_after: f64,
    /// Repaired actual delay in ns
    pub actual_delay: f64,
    /// Buffers inserted on the path
    pub buffers_inserted: usize,
    /// Gates resized on the path
    pub gates_resized: usize,
    /// Whether the path still violates after the attempt budget
    pub violating: bool,
}

/// Result of a timing optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingOutcome {
    /// One entry per design timing path
    pub paths: Vec<PathRepair>,
    /// Worst slack after repair in ns (negative when violations remain)
    pub worst_slack: f64,
    /// Paths still violating after repair
    pub failing_paths: usize,
    /// Paths whose violation was fixed
    pub repaired_paths: usize,
    /// Total buffers inserted
    pub total_buffers: usize,
    /// Total gates resized
    pub total_resizes: usize,
}

/// Timing optimizer
pub struct TimingOptimizer<'a> {
    config: &'a TimingConfig,
}

impl<'a> TimingOptimizer<'a> {
    /// Create an optimizer with the configured repair budget
    pub fn new(config: &'a TimingConfig) -> Self {
        Self { config }
    }

    /// Repair every violating path within the attempt budget
    pub fn optimize(&self, design: &Design) -> Result<TimingOutcome> {
        let mut paths = Vec::with_capacity(design.timing_paths.len());
        let mut failing_paths = 0;
        let mut repaired_paths = 0;
        let mut total_buffers = 0;
        let mut total_resizes = 0;
        let mut worst_slack = f64::MAX;

        for path in &design.timing_paths {
            let slack_before = path.slack();
            let mut actual = path.actual_delay;
            let mut buffers_inserted = 0;
            let mut gates_resized = 0;

            // Alternate buffer insertion and resizing while the path violates
            for attempt in 0..self.config.max_repair_attempts {
                if path.required_delay - actual >= 0.0 {
                    break;
                }
                if attempt % 2 == 0 {
                    buffers_inserted += 1;
                    actual *= 1.0 - self.config.buffer_delay_reduction;
                } else {
                    gates_resized += 1;
                    actual *= 1.0 - self.config.resize_delay_reduction;
                }
            }

            let slack_after = path.required_delay - actual;
            let violating = slack_after < 0.0;
            if violating {
                failing_paths += 1;
            } else if slack_before < 0.0 {
                repaired_paths += 1;
            }
            total_buffers += buffers_inserted;
            total_resizes += gates_resized;
            if slack_after < worst_slack {
                worst_slack = slack_after;
            }

            paths.push(PathRepair {
                path: path.id.clone(),
                slack_before,
                slack_after,
                actual_delay: actual,
                buffers_inserted,
                gates_resized,
                violating,
            });
        }

        if paths.is_empty() {
            worst_slack = 0.0;
        }

        log::debug!(
            "timing optimization: {} paths, {} repaired, {} still failing",
            paths.len(),
            repaired_paths,
            failing_paths
        );
        Ok(TimingOutcome {
            paths,
            worst_slack,
            failing_paths,
            repaired_paths,
            total_buffers,
            total_resizes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;

    #[test]
    fn positive_slack_paths_are_untouched() {
        let mut design = Design::new("ok");
        design.add_timing_path("p1", "a", "b", 5.0, 3.0);
        let config = TimingConfig::default();
        let outcome = TimingOptimizer::new(&config).optimize(&design).unwrap();

        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.paths[0].buffers_inserted, 0);
        assert_eq!(outcome.paths[0].gates_resized, 0);
        assert!(!outcome.paths[0].violating);
        assert_eq!(outcome.failing_paths, 0);
    }

    #[test]
    fn small_violation_is_repaired() {
        let mut design = Design::new("close");
        // 4% over; two repair steps suffice
        design.add_timing_path("p1", "a", "b", 5.0, 5.2);
        let config = TimingConfig::default();
        let outcome = TimingOptimizer::new(&config).optimize(&design).unwrap();

        assert_eq!(outcome.repaired_paths, 1);
        assert_eq!(outcome.failing_paths, 0);
        assert!(outcome.paths[0].slack_after >= 0.0);
        assert!(outcome.paths[0].buffers_inserted > 0);
    }

    #[test]
    fn hopeless_violation_is_reported_not_hidden() {
        let mut design = Design::new("hopeless");
        // 3x over budget; the attempt budget cannot close this
        design.add_timing_path("p1", "a", "b", 2.0, 6.0);
        let config = TimingConfig::default();
        let outcome = TimingOptimizer::new(&config).optimize(&design).unwrap();

        assert_eq!(outcome.failing_paths, 1);
        assert!(outcome.paths[0].violating);
        assert!(outcome.worst_slack < 0.0);
        // The budget was fully spent trying
        assert_eq!(
            outcome.paths[0].buffers_inserted + outcome.paths[0].gates_resized,
            config.max_repair_attempts
        );
    }

    #[test]
    fn empty_design_reports_zero_worst_slack() {
        let design = Design::new("empty");
        let config = TimingConfig::default();
        let outcome = TimingOptimizer::new(&config).optimize(&design).unwrap();
        assert_eq!(outcome.worst_slack, 0.0);
        assert!(outcome.paths.is_empty());
    }
}
