//! Top-level optimization engine
//!
//! Provides the public operations: one per optimization type, a sequential
//! multi-objective orchestrator, benefit estimation and history queries.
//! Every operation validates the design, runs the selected algorithm,
//! captures any fault into a structured error result, and appends exactly
//! one history record under a freshly minted process id.

use crate::budget::{Budget, CancelToken};
use crate::design::Design;
use crate::error::Result;
use crate::estimate::{self, BenefitEstimate};
use crate::history::HistoryStore;
use crate::outcome::{
    OptimizationKind, OptimizationPayload, OptimizationRecord, OptimizationResult, ProcessId,
};
use crate::placer::{self, PlacementAlgorithm, PlacerConfig};
use crate::power::{PowerConfig, PowerOptimizer};
use crate::router::{self, RouterConfig, RoutingAlgorithm};
use crate::synth::{self, SynthAlgorithm, SynthConfig, SynthOutcome};
use crate::timing::{TimingConfig, TimingOptimizer};
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Engine configuration, one section per subsystem
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Placer configuration
    pub placer: PlacerConfig,
    /// Router configuration
    pub router: RouterConfig,
    /// Synthesis configuration
    pub synth: SynthConfig,
    /// Power optimizer configuration
    pub power: PowerConfig,
    /// Timing optimizer configuration
    pub timing: TimingConfig,
}

impl EngineConfig {
    /// Config for fast turnaround (lower quality)
    pub fn fast() -> Self {
        Self {
            placer: PlacerConfig {
                max_iterations: 100,
                initial_temperature: 50.0,
                ..Default::default()
            },
            synth: SynthConfig {
                max_retiming_moves: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Config for high quality (slower)
    pub fn high_quality() -> Self {
        Self {
            placer: PlacerConfig {
                max_iterations: 2000,
                initial_temperature: 200.0,
                cooling_rate: 0.99,
                ..Default::default()
            },
            timing: TimingConfig {
                max_repair_attempts: 25,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Result of a multi-objective optimization sequence
#[derive(Debug, Clone)]
pub struct MultiObjectiveResult {
    /// Process id covering the whole sequence
    pub process_id: ProcessId,
    /// Per-objective results, in execution order
    pub results: IndexMap<OptimizationKind, OptimizationResult>,
    /// Final working design with successful payloads merged in
    pub design: Design,
}

/// Multi-algorithm chip-layout optimization engine
///
/// Operations take `&self` and may run concurrently across distinct designs;
/// the history store and the process-id counter are the only shared state.
pub struct OptimizationEngine {
    config: EngineConfig,
    history: Arc<HistoryStore>,
    next_process: AtomicU64,
    cancel: CancelToken,
}

impl OptimizationEngine {
    /// Create an engine with its own in-memory history store
    pub fn new(config: EngineConfig) -> Self {
        Self::with_history(config, Arc::new(HistoryStore::new()))
    }

    /// Create an engine over an injected history store
    pub fn with_history(config: EngineConfig, history: Arc<HistoryStore>) -> Self {
        Self {
            config,
            history,
            next_process: AtomicU64::new(1),
            cancel: CancelToken::new(),
        }
    }

    /// Handle for cancelling in-flight algorithm iterations
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The engine's history store
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Optimize component placement
    pub fn optimize_placement(
        &self,
        design: &Design,
        algorithm: Option<&str>,
    ) -> (ProcessId, OptimizationResult) {
        self.run(design, OptimizationKind::Placement, algorithm)
    }

    /// Route every connection
    pub fn optimize_routing(
        &self,
        design: &Design,
        algorithm: Option<&str>,
    ) -> (ProcessId, OptimizationResult) {
        self.run(design, OptimizationKind::Routing, algorithm)
    }

    /// Run logic synthesis (technology mapping or retiming)
    pub fn optimize_logic(
        &self,
        design: &Design,
        algorithm: Option<&str>,
    ) -> (ProcessId, OptimizationResult) {
        self.run(design, OptimizationKind::LogicSynthesis, algorithm)
    }

    /// Apply the low-power technique sequence
    pub fn optimize_power(&self, design: &Design) -> (ProcessId, OptimizationResult) {
        self.run(design, OptimizationKind::Power, None)
    }

    /// Repair timing violations
    pub fn optimize_timing(&self, design: &Design) -> (ProcessId, OptimizationResult) {
        self.run(design, OptimizationKind::Timing, None)
    }

    /// Run one optimization under a freshly minted process id
    ///
    /// Appends exactly one history record, success or error.
    pub fn run(
        &self,
        design: &Design,
        kind: OptimizationKind,
        algorithm: Option<&str>,
    ) -> (ProcessId, OptimizationResult) {
        let process_id = self.mint();
        let result = self.execute(design, kind, algorithm);
        self.record(&process_id, &result);
        (process_id, result)
    }

    /// Sequentially compose several optimizations over one design
    ///
    /// Objectives run strictly in the caller-supplied order; each step sees
    /// the working design with all earlier successful payloads merged in.
    /// A failing step is recorded and reported but does not abort the
    /// sequence: later steps continue from the last successful state
    /// (fail-soft). One history record is appended per executed objective,
    /// all under the single returned process id.
    pub fn multi_objective_optimization(
        &self,
        design: &Design,
        objectives: &[OptimizationKind],
    ) -> MultiObjectiveResult {
        let process_id = self.mint();
        let mut working = design.clone();
        let mut results = IndexMap::with_capacity(objectives.len());

        log::info!(
            "[{process_id}] multi-objective sequence over '{}': {:?}",
            design.name,
            objectives
        );
        for &kind in objectives {
            let result = self.execute(&working, kind, None);
            self.record(&process_id, &result);
            if let Some(payload) = result.payload.as_ref() {
                merge_payload(&mut working, payload);
            } else {
                log::warn!(
                    "[{process_id}] {kind} step failed, continuing from last good design: {}",
                    result.message.as_deref().unwrap_or("unknown error")
                );
            }
            results.insert(kind, result);
        }

        MultiObjectiveResult {
            process_id,
            results,
            design: working,
        }
    }

    /// Estimate the benefit of an optimization without running it
    ///
    /// Read-only; appends nothing to history.
    pub fn estimate_optimization_benefit(
        &self,
        design: &Design,
        kind: OptimizationKind,
    ) -> BenefitEstimate {
        estimate::estimate(design, kind)
    }

    /// Tag-string variant of benefit estimation for the ingestion boundary
    ///
    /// Unknown tags yield `UnsupportedOptimizationType`.
    pub fn estimate_optimization_benefit_tag(
        &self,
        design: &Design,
        tag: &str,
    ) -> Result<BenefitEstimate> {
        let kind: OptimizationKind = tag.parse()?;
        Ok(estimate::estimate(design, kind))
    }

    /// Records for one process id, in invocation order (empty if unknown)
    pub fn get_optimization_history(&self, process_id: &ProcessId) -> Vec<OptimizationRecord> {
        self.history.records_for(process_id)
    }

    /// Snapshot of every known process id and its records
    pub fn get_full_history(&self) -> IndexMap<ProcessId, Vec<OptimizationRecord>> {
        self.history.snapshot()
    }

    fn mint(&self) -> ProcessId {
        ProcessId::mint(self.next_process.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, process_id: &ProcessId, result: &OptimizationResult) {
        self.history.append(OptimizationRecord {
            process_id: process_id.clone(),
            kind: result.kind,
            algorithm: result.algorithm.clone(),
            timestamp: Utc::now(),
            result: result.clone(),
        });
    }

    /// Validate, dispatch, and capture faults into a structured result
    fn execute(
        &self,
        design: &Design,
        kind: OptimizationKind,
        algorithm: Option<&str>,
    ) -> OptimizationResult {
        let name = self.resolved_algorithm(kind, algorithm);

        if let Err(error) = design.validate() {
            log::warn!("{kind} rejected design '{}': {error}", design.name);
            return OptimizationResult::failure(kind, name, &error);
        }

        let outcome = self.dispatch(design, kind, algorithm);
        match outcome {
            Ok(payload) => {
                log::info!("{kind} ({name}) finished on '{}'", design.name);
                OptimizationResult::success(kind, name, payload)
            }
            Err(error) => {
                log::warn!("{kind} ({name}) failed on '{}': {error}", design.name);
                OptimizationResult::failure(kind, name, &error)
            }
        }
    }

    fn dispatch(
        &self,
        design: &Design,
        kind: OptimizationKind,
        algorithm: Option<&str>,
    ) -> Result<OptimizationPayload> {
        match kind {
            OptimizationKind::Placement => {
                let algo = PlacementAlgorithm::from_name(algorithm);
                let budget = Budget::new(self.config.placer.timeout, self.cancel.clone());
                placer::place(design, algo, &self.config.placer, &budget)
                    .map(OptimizationPayload::Placement)
            }
            OptimizationKind::Routing => {
                let algo = RoutingAlgorithm::from_name(algorithm);
                let budget = Budget::new(self.config.router.timeout, self.cancel.clone());
                router::route(design, algo, &self.config.router, &budget)
                    .map(OptimizationPayload::Routing)
            }
            OptimizationKind::LogicSynthesis => {
                let algo = SynthAlgorithm::from_name(algorithm);
                let budget = Budget::new(None, self.cancel.clone());
                synth::synthesize(design, algo, &self.config.synth, &budget)
                    .map(OptimizationPayload::LogicSynthesis)
            }
            OptimizationKind::Power => PowerOptimizer::new(&self.config.power)
                .optimize(design)
                .map(OptimizationPayload::Power),
            OptimizationKind::Timing => TimingOptimizer::new(&self.config.timing)
                .optimize(design)
                .map(OptimizationPayload::Timing),
        }
    }

    /// Name of the algorithm that will actually run after default fallback
    fn resolved_algorithm(&self, kind: OptimizationKind, algorithm: Option<&str>) -> String {
        match kind {
            OptimizationKind::Placement => PlacementAlgorithm::from_name(algorithm).as_str(),
            OptimizationKind::Routing => RoutingAlgorithm::from_name(algorithm).as_str(),
            OptimizationKind::LogicSynthesis => SynthAlgorithm::from_name(algorithm).as_str(),
            OptimizationKind::Power => "technique_sequence",
            OptimizationKind::Timing => "slack_repair",
        }
        .to_string()
    }
}

/// Shallow field-level overlay of a successful payload onto a working design
///
/// New fields are added, overlapping fields replaced; the core collections
/// are only touched where an algorithm legitimately restructured them
/// (register stages after retiming, repaired path delays after timing).
fn merge_payload(design: &mut Design, payload: &OptimizationPayload) {
    match payload {
        OptimizationPayload::Placement(placement) => {
            design.placement = Some(
                placement
                    .placements
                    .iter()
                    .map(|p| {
                        (
                            p.component.clone(),
                            crate::design::Position {
                                x: p.x,
                                y: p.y,
                                layer: p.layer,
                            },
                        )
                    })
                    .collect(),
            );
        }
        OptimizationPayload::Routing(routing) => {
            let mut overlay = crate::design::RoutingOverlay::default();
            for path in &routing.paths {
                if let crate::router::RouteStatus::Routed { waypoints } = &path.status {
                    overlay
                        .paths
                        .insert(path.connection.clone(), waypoints.clone());
                }
            }
            design.routing = Some(overlay);
        }
        OptimizationPayload::LogicSynthesis(SynthOutcome::Retiming(retiming)) => {
            for (register_id, stage) in &retiming.stages {
                if let Some(register) =
                    design.registers.iter_mut().find(|r| &r.id == register_id)
                {
                    register.stage = *stage;
                }
            }
        }
        OptimizationPayload::LogicSynthesis(SynthOutcome::Mapping(_)) => {
            // Mapped cells live in the payload; the abstract gate list stays
        }
        OptimizationPayload::Power(_) => {
            // Savings estimates carry no structural change
        }
        OptimizationPayload::Timing(timing) => {
            for repair in &timing.paths {
                if let Some(path) = design.timing_paths.iter_mut().find(|p| p.id == repair.path) {
                    path.actual_delay = repair.actual_delay;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OptimizationStatus;

    fn triangle_design() -> Design {
        let mut design = Design::new("triangle");
        design
            .add_component("c1", "logic", 1.0, 1.0)
            .add_component("c2", "logic", 1.0, 1.0)
            .add_component("c3", "logic", 1.0, 1.0)
            .add_connection("n1", "c1", "c2")
            .add_connection("n2", "c2", "c3");
        design
    }

    #[test]
    fn placement_records_one_history_entry() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        let design = triangle_design();
        let (pid, result) = engine.optimize_placement(&design, Some("simulated_annealing"));

        assert!(result.is_success());
        assert_eq!(result.algorithm, "simulated_annealing");
        assert_eq!(engine.get_optimization_history(&pid).len(), 1);
    }

    #[test]
    fn invalid_design_short_circuits_but_is_recorded() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        let mut design = triangle_design();
        design.add_connection("n3", "c3", "ghost");

        let (pid, result) = engine.optimize_routing(&design, None);
        assert_eq!(result.status, OptimizationStatus::Error);
        assert!(result.message.as_deref().unwrap().contains("ghost"));

        let records = engine.get_optimization_history(&pid);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result.status, OptimizationStatus::Error);
    }

    #[test]
    fn unknown_algorithm_falls_back_to_default() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        let design = triangle_design();
        let (_, result) = engine.optimize_placement(&design, Some("does_not_exist"));
        assert!(result.is_success());
        assert_eq!(result.algorithm, "simulated_annealing");
    }

    #[test]
    fn distinct_operations_mint_distinct_process_ids() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        let design = triangle_design();
        let (pid_a, _) = engine.optimize_power(&design);
        let (pid_b, _) = engine.optimize_power(&design);
        assert_ne!(pid_a, pid_b);
    }

    #[test]
    fn cancelled_engine_reports_budget_exceeded() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        engine.cancel_token().cancel();
        let design = triangle_design();
        let (_, result) = engine.optimize_placement(&design, None);
        assert_eq!(result.status, OptimizationStatus::Error);
        assert!(result.message.as_deref().unwrap().contains("cancelled"));
    }

    #[test]
    fn merge_applies_placement_overlay() {
        let engine = OptimizationEngine::new(EngineConfig::fast());
        let design = triangle_design();
        let outcome =
            engine.multi_objective_optimization(&design, &[OptimizationKind::Placement]);
        assert!(outcome.design.placement.is_some());
        assert_eq!(outcome.design.placement.unwrap().len(), 3);
    }
}
