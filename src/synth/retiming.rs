//! Register retiming
//!
//! Balances pipeline-stage delay by moving registers between adjacent
//! stages. The move set is cycle-count preserving: the number of registers
//! never changes, stages only shift within the existing pipeline depth, and
//! no stage ever goes below zero registers.

use super::SynthConfig;
use crate::budget::Budget;
use crate::design::Design;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One register relocation applied by retiming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterMove {
    /// Register id
    pub register: String,
    /// Stage the register was in
    pub from_stage: u32,
    /// Stage the register moved to
    pub to_stage: u32,
}

/// Result of a retiming run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetimingOutcome {
    /// Moves applied, in order
    pub moves: Vec<RegisterMove>,
    /// Per-stage delay before retiming
    pub stage_delays_before: Vec<f64>,
    /// Per-stage delay after retiming
    pub stage_delays_after: Vec<f64>,
    /// Whether the stage delays ended within the balance tolerance
    pub balanced: bool,
    /// Register stage assignments after retiming
    pub stages: Vec<(String, u32)>,
}

/// Retiming engine
pub struct Retimer<'a> {
    config: &'a SynthConfig,
}

impl<'a> Retimer<'a> {
    /// Create a retimer with the configured move budget and tolerance
    pub fn new(config: &'a SynthConfig) -> Self {
        Self { config }
    }

    /// Rebalance pipeline stages by moving registers
    pub fn retime(&self, design: &Design, budget: &Budget) -> Result<RetimingOutcome> {
        let max_stage = design.registers.iter().map(|r| r.stage).max().unwrap_or(0);
        let stage_count = max_stage as usize + 1;

        // Delay contribution per register: the combinational delay launched
        // from it, taken from timing paths where available
        let contributions: Vec<f64> = design
            .registers
            .iter()
            .map(|register| {
                let launched: f64 = design
                    .timing_paths
                    .iter()
                    .filter(|p| p.source == register.id)
                    .map(|p| p.actual_delay)
                    .sum();
                if launched > 0.0 {
                    launched
                } else {
                    1.0
                }
            })
            .collect();

        let mut stages: Vec<u32> = design.registers.iter().map(|r| r.stage).collect();
        let stage_delays = |stages: &[u32]| -> Vec<f64> {
            let mut delays = vec![0.0f64; stage_count];
            for (i, &stage) in stages.iter().enumerate() {
                delays[stage as usize] += contributions[i];
            }
            delays
        };

        let before = stage_delays(&stages);
        let mut moves = Vec::new();
        let mut balanced = stage_count <= 1 || design.registers.is_empty();

        for _ in 0..self.config.max_retiming_moves {
            if balanced {
                break;
            }
            budget.check("retiming")?;

            let delays = stage_delays(&stages);
            let (worst_stage, &worst) = delays
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .unwrap_or((0, &0.0));
            let best = delays.iter().cloned().fold(f64::MAX, f64::min);

            if worst <= 0.0 || (worst - best) / worst <= self.config.balance_tolerance {
                balanced = true;
                break;
            }

            // Move the lightest register out of the worst stage into the
            // less-loaded adjacent stage
            let target = adjacent_target(worst_stage, &delays);
            let candidate = stages
                .iter()
                .enumerate()
                .filter(|(_, &s)| s as usize == worst_stage)
                .min_by(|a, b| {
                    contributions[a.0]
                        .partial_cmp(&contributions[b.0])
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);

            let Some(idx) = candidate else {
                balanced = false;
                break;
            };

            // Only move when it actually reduces the spread
            if delays[target] + contributions[idx] >= worst {
                break;
            }

            moves.push(RegisterMove {
                register: design.registers[idx].id.clone(),
                from_stage: worst_stage as u32,
                to_stage: target as u32,
            });
            stages[idx] = target as u32;
        }

        let after = stage_delays(&stages);
        if !balanced {
            let worst = after.iter().cloned().fold(0.0f64, f64::max);
            let best = after.iter().cloned().fold(f64::MAX, f64::min);
            balanced = worst <= 0.0 || (worst - best) / worst <= self.config.balance_tolerance;
        }

        log::debug!(
            "retiming: {} moves over {} stages, balanced={}",
            moves.len(),
            stage_count,
            balanced
        );
        Ok(RetimingOutcome {
            moves,
            stage_delays_before: before,
            stage_delays_after: after,
            balanced,
            stages: design
                .registers
                .iter()
                .zip(&stages)
                .map(|(r, &s)| (r.id.clone(), s))
                .collect(),
        })
    }
}

/// Adjacent stage with the smaller load; clamped to the pipeline depth
fn adjacent_target(stage: usize, delays: &[f64]) -> usize {
    let left = stage.checked_sub(1);
    let right = if stage + 1 < delays.len() {
        Some(stage + 1)
    } else {
        None
    };
    match (left, right) {
        (Some(l), Some(r)) => {
            if delays[l] <= delays[r] {
                l
            } else {
                r
            }
        }
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;

    fn pipelined_design() -> Design {
        let mut design = Design::new("pipe");
        design
            .add_register("r0", 0)
            .add_register("r1", 0)
            .add_register("r2", 0)
            .add_register("r3", 1);
        // Stage 0 launches most of the delay
        design
            .add_timing_path("p0", "r0", "r3", 10.0, 4.0)
            .add_timing_path("p1", "r1", "r3", 10.0, 4.0)
            .add_timing_path("p2", "r2", "r3", 10.0, 4.0)
            .add_timing_path("p3", "r3", "r0", 10.0, 2.0);
        design
    }

    #[test]
    fn preserves_register_count() {
        let design = pipelined_design();
        let config = SynthConfig::default();
        let outcome = Retimer::new(&config)
            .retime(&design, &Budget::unbounded())
            .unwrap();
        assert_eq!(outcome.stages.len(), design.registers.len());
    }

    #[test]
    fn moves_registers_out_of_the_loaded_stage() {
        let design = pipelined_design();
        let config = SynthConfig::default();
        let outcome = Retimer::new(&config)
            .retime(&design, &Budget::unbounded())
            .unwrap();

        assert!(!outcome.moves.is_empty());
        let spread_before = spread(&outcome.stage_delays_before);
        let spread_after = spread(&outcome.stage_delays_after);
        assert!(spread_after < spread_before);
    }

    #[test]
    fn stages_never_leave_the_pipeline_depth() {
        let design = pipelined_design();
        let config = SynthConfig::default();
        let outcome = Retimer::new(&config)
            .retime(&design, &Budget::unbounded())
            .unwrap();
        for (_, stage) in &outcome.stages {
            assert!(*stage <= 1);
        }
    }

    #[test]
    fn single_stage_design_is_already_balanced() {
        let mut design = Design::new("flat");
        design.add_register("r0", 0).add_register("r1", 0);
        let config = SynthConfig::default();
        let outcome = Retimer::new(&config)
            .retime(&design, &Budget::unbounded())
            .unwrap();
        assert!(outcome.balanced);
        assert!(outcome.moves.is_empty());
    }

    fn spread(delays: &[f64]) -> f64 {
        let max = delays.iter().cloned().fold(0.0f64, f64::max);
        let min = delays.iter().cloned().fold(f64::MAX, f64::min);
        max - min
    }
}
