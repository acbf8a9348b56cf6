//! Benefit estimation
//!
//! Fast, non-mutating heuristics that bound the improvement an optimization
//! could deliver, without running the full algorithm. Every estimate is a
//! fraction in [0, 1] and every metric advertised for a type is always
//! present. Cost is a single O(n) scan of the design.

use crate::design::Design;
use crate::outcome::OptimizationKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-metric improvement estimates for one optimization type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitEstimate {
    /// Optimization type the estimate applies to
    pub kind: OptimizationKind,
    /// Metric name to fractional improvement in [0, 1]
    pub metrics: IndexMap<String, f64>,
}

/// Metric names advertised per optimization type
pub fn metric_names(kind: OptimizationKind) -> &'static [&'static str] {
    match kind {
        OptimizationKind::Placement => &[
            "wirelength_reduction",
            "congestion_improvement",
            "performance_gain",
        ],
        OptimizationKind::Routing => &[
            "wirelength_reduction",
            "via_reduction",
            "congestion_improvement",
        ],
        OptimizationKind::LogicSynthesis => {
            &["area_reduction", "delay_reduction", "power_reduction"]
        }
        OptimizationKind::Power => &["power_reduction", "leakage_reduction"],
        OptimizationKind::Timing => &["slack_improvement", "frequency_gain"],
    }
}

/// Estimate the benefit of running the given optimization type
pub fn estimate(design: &Design, kind: OptimizationKind) -> BenefitEstimate {
    let components = design.components.len() as f64;
    let connections = design.connections.len() as f64;
    let gates = design.gates.len() as f64;
    let registers = design.registers.len() as f64;

    // Average net degree; dense designs have more slack to optimize
    let density = if components > 0.0 {
        connections / components
    } else {
        0.0
    };
    let (die_w, die_h) = design.die_size();
    let utilization = if die_w * die_h > 0.0 {
        (design
            .components
            .iter()
            .map(|c| c.width * c.height)
            .sum::<f64>()
            / (die_w * die_h))
            .min(1.0)
    } else {
        0.0
    };
    let violating_fraction = if design.timing_paths.is_empty() {
        0.0
    } else {
        design
            .timing_paths
            .iter()
            .filter(|p| p.slack() < 0.0)
            .count() as f64
            / design.timing_paths.len() as f64
    };

    let values: Vec<f64> = match kind {
        OptimizationKind::Placement => vec![
            0.10 + 0.06 * density,
            0.05 + 0.30 * utilization,
            0.05 + 0.03 * density,
        ],
        OptimizationKind::Routing => vec![
            0.08 + 0.04 * density,
            0.05 + 0.03 * density,
            0.04 + 0.25 * utilization,
        ],
        OptimizationKind::LogicSynthesis => vec![
            0.10 + 0.002 * gates,
            0.08 + 0.001 * gates,
            0.06 + 0.001 * gates,
        ],
        OptimizationKind::Power => {
            let register_fraction = if gates + registers > 0.0 {
                registers / (gates + registers)
            } else {
                0.0
            };
            vec![0.15 + 0.15 * register_fraction, 0.08 + 0.10 * register_fraction]
        }
        OptimizationKind::Timing => vec![
            0.10 + 0.60 * violating_fraction,
            0.05 + 0.30 * violating_fraction,
        ],
    };

    let metrics = metric_names(kind)
        .iter()
        .zip(values)
        .map(|(name, value)| (name.to_string(), value.clamp(0.0, 1.0)))
        .collect();

    BenefitEstimate { kind, metrics }
}
