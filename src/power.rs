//! Power optimization
//!
//! Applies a sequence of low-power techniques, each contributing an
//! independently bounded fractional savings estimate derived from the design
//! structure. Savings combine multiplicatively and the cumulative total is
//! capped to stay physically plausible.

use crate::design::Design;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Low-power technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerTechnique {
    ClockGating,
    PowerGating,
    BodyBiasing,
    MultiVt,
    Dvfs,
}

impl PowerTechnique {
    /// All techniques in application order
    pub const ALL: [PowerTechnique; 5] = [
        PowerTechnique::ClockGating,
        PowerTechnique::PowerGating,
        PowerTechnique::BodyBiasing,
        PowerTechnique::MultiVt,
        PowerTechnique::Dvfs,
    ];

    /// Canonical technique name
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerTechnique::ClockGating => "clock_gating",
            PowerTechnique::PowerGating => "power_gating",
            PowerTechnique::BodyBiasing => "body_biasing",
            PowerTechnique::MultiVt => "multi_threshold_voltage",
            PowerTechnique::Dvfs => "dynamic_voltage_frequency_scaling",
        }
    }
}

/// Power optimizer configuration
#[derive(Debug, Clone)]
pub struct PowerConfig {
    /// Techniques to apply, in order
    pub techniques: Vec<PowerTechnique>,
    /// Cumulative savings cap; defaults to 0.8
    pub max_total_savings: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            techniques: PowerTechnique::ALL.to_vec(),
            max_total_savings: 0.8,
        }
    }
}

/// One applied technique and its savings estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedTechnique {
    /// Technique applied
    pub technique: PowerTechnique,
    /// Fractional savings contributed, in [0, 1)
    pub savings: f64,
}

/// Result of a power optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerOutcome {
    /// Techniques that were applicable to this design
    pub techniques: Vec<AppliedTechnique>,
    /// Cumulative fractional savings, capped
    pub total_savings: f64,
    /// Estimated power before optimization in mW
    pub power_before_mw: f64,
    /// Estimated power after optimization in mW
    pub power_after_mw: f64,
    /// Whether the result fits the design's power budget, if one is set
    pub within_budget: Option<bool>,
}

/// Power optimizer
pub struct PowerOptimizer<'a> {
    config: &'a PowerConfig,
}

impl<'a> PowerOptimizer<'a> {
    /// Create an optimizer with the configured technique sequence
    pub fn new(config: &'a PowerConfig) -> Self {
        Self { config }
    }

    /// Apply the technique sequence to the design
    pub fn optimize(&self, design: &Design) -> Result<PowerOutcome> {
        let mut applied = Vec::new();
        let mut remaining = 1.0f64;

        for &technique in &self.config.techniques {
            if let Some(savings) = estimate_savings(design, technique) {
                remaining *= 1.0 - savings;
                applied.push(AppliedTechnique { technique, savings });
            }
        }

        let total_savings = (1.0 - remaining).min(self.config.max_total_savings);
        let power_before_mw = baseline_power(design);
        let power_after_mw = power_before_mw * (1.0 - total_savings);
        let within_budget = design
            .constraints
            .power_budget
            .map(|budget| power_after_mw <= budget);

        log::debug!(
            "power optimization: {} techniques, {:.1}% savings",
            applied.len(),
            total_savings * 100.0
        );
        Ok(PowerOutcome {
            techniques: applied,
            total_savings,
            power_before_mw,
            power_after_mw,
            within_budget,
        })
    }
}

/// Nominal power estimate in mW before optimization
fn baseline_power(design: &Design) -> f64 {
    design.gates.len() as f64 * 0.5
        + design.registers.len() as f64 * 0.8
        + design.components.len() as f64 * 0.2
        + design.clocks.len() as f64 * 1.5
}

/// Savings estimate for one technique, `None` when inapplicable
fn estimate_savings(design: &Design, technique: PowerTechnique) -> Option<f64> {
    let gates = design.gates.len() as f64;
    let registers = design.registers.len() as f64;

    match technique {
        PowerTechnique::ClockGating => {
            if design.registers.is_empty() || design.clocks.is_empty() {
                return None;
            }
            let register_fraction = registers / (gates + registers);
            Some((0.05 + 0.25 * register_fraction).min(0.30))
        }
        PowerTechnique::PowerGating => {
            if design.components.is_empty() {
                return None;
            }
            // Components on no net are gateable idle blocks
            let connected: std::collections::HashSet<&str> = design
                .connections
                .iter()
                .flat_map(|c| [c.source.as_str(), c.target.as_str()])
                .collect();
            let idle = design
                .components
                .iter()
                .filter(|c| !connected.contains(c.id.as_str()))
                .count() as f64;
            let idle_fraction = idle / design.components.len() as f64;
            Some((0.05 + 0.20 * idle_fraction).min(0.25))
        }
        PowerTechnique::BodyBiasing => {
            if design.gates.is_empty() {
                return None;
            }
            Some(0.05)
        }
        PowerTechnique::MultiVt => {
            if design.gates.is_empty() {
                return None;
            }
            // Paths with slack to spare can take high-Vt cells
            let paths = design.timing_paths.len();
            let relaxed_fraction = if paths == 0 {
                0.5
            } else {
                design
                    .timing_paths
                    .iter()
                    .filter(|p| p.slack() > 0.0)
                    .count() as f64
                    / paths as f64
            };
            Some((0.04 + 0.12 * relaxed_fraction).min(0.16))
        }
        PowerTechnique::Dvfs => {
            if design.clocks.is_empty() {
                return None;
            }
            Some((0.10 + 0.02 * design.clocks.len() as f64).min(0.25))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{Design, GateFunction};

    fn busy_design() -> Design {
        let mut design = Design::new("busy");
        for i in 0..10 {
            design.add_component(format!("c{i}"), "logic", 1.0, 1.0);
            design.add_gate(format!("g{i}"), GateFunction::Nand);
        }
        for i in 0..4 {
            design.add_register(format!("r{i}"), 0);
        }
        design.add_clock("clk", 100.0);
        design
    }

    #[test]
    fn total_savings_never_exceed_cap() {
        let design = busy_design();
        let config = PowerConfig::default();
        let outcome = PowerOptimizer::new(&config).optimize(&design).unwrap();

        assert!(outcome.total_savings <= 0.8);
        assert!(outcome.total_savings > 0.0);
        assert!(outcome.power_after_mw < outcome.power_before_mw);
    }

    #[test]
    fn cap_holds_even_with_repeated_techniques() {
        let design = busy_design();
        let config = PowerConfig {
            techniques: PowerTechnique::ALL
                .iter()
                .cycle()
                .take(50)
                .copied()
                .collect(),
            max_total_savings: 0.8,
        };
        let outcome = PowerOptimizer::new(&config).optimize(&design).unwrap();
        assert!(outcome.total_savings <= 0.8);
    }

    #[test]
    fn clockless_design_skips_clock_techniques() {
        let mut design = busy_design();
        design.clocks.clear();
        let config = PowerConfig::default();
        let outcome = PowerOptimizer::new(&config).optimize(&design).unwrap();

        assert!(outcome
            .techniques
            .iter()
            .all(|t| t.technique != PowerTechnique::ClockGating
                && t.technique != PowerTechnique::Dvfs));
    }

    #[test]
    fn individual_savings_are_bounded() {
        let design = busy_design();
        let config = PowerConfig::default();
        let outcome = PowerOptimizer::new(&config).optimize(&design).unwrap();
        for applied in &outcome.techniques {
            assert!(applied.savings > 0.0 && applied.savings < 1.0);
        }
    }

    #[test]
    fn power_budget_constraint_is_reported() {
        let mut design = busy_design();
        design.constraints.power_budget = Some(1000.0);
        let config = PowerConfig::default();
        let outcome = PowerOptimizer::new(&config).optimize(&design).unwrap();
        assert_eq!(outcome.within_budget, Some(true));
    }
}
