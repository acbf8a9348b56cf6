//! pdopt — multi-algorithm chip-layout optimization engine
//!
//! This crate handles:
//! - Placement (simulated annealing, force-directed)
//! - Routing (A*, Lee-style maze routing)
//! - Logic synthesis (technology mapping, register retiming)
//! - Power optimization (clock/power gating, body biasing, multi-Vt, DVFS)
//! - Timing optimization (slack repair via buffers and resizing)
//!
//! Operations can be chained by the multi-objective orchestrator, which
//! threads each step's output into the next step's working design. Every
//! invocation is recorded in an append-only history store keyed by process
//! id. The engine is a library-level component: it performs no I/O besides
//! history appends, and designs are supplied (already validated and
//! deserialized) by the caller.
//!
//! ```
//! use pdopt::{Design, EngineConfig, OptimizationEngine, OptimizationKind};
//!
//! let mut design = Design::new("adder");
//! design
//!     .add_component("c1", "logic", 1.0, 1.0)
//!     .add_component("c2", "logic", 1.0, 1.0)
//!     .add_connection("n1", "c1", "c2");
//!
//! let engine = OptimizationEngine::new(EngineConfig::fast());
//! let outcome = engine.multi_objective_optimization(
//!     &design,
//!     &[OptimizationKind::Placement, OptimizationKind::Routing],
//! );
//! assert!(outcome.results.values().all(|r| r.is_success()));
//! ```

pub mod budget;
pub mod design;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod history;
pub mod outcome;
pub mod placer;
pub mod power;
pub mod router;
pub mod synth;
pub mod timing;

pub use budget::CancelToken;
pub use design::{Component, Connection, Design, DesignConstraints, GateFunction};
pub use engine::{EngineConfig, MultiObjectiveResult, OptimizationEngine};
pub use error::{OptimizeError, Result};
pub use estimate::BenefitEstimate;
pub use history::HistoryStore;
pub use outcome::{
    OptimizationKind, OptimizationPayload, OptimizationRecord, OptimizationResult,
    OptimizationStatus, ProcessId,
};
