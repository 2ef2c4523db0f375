/*!

An agent-based SEIR epidemic model over a city divided into polygonal districts.

People are placed at random inside their home district, wander on an integer grid of steps, and
expose Susceptible neighbors within a fixed distance when Infected. Probabilities of transmission,
incubation, death and recovery are looked up by age group and district. The model keeps running
compartment counts, peaks and cumulative totals per district.

All state of a run lives in a [`Context`]. Build one with [`initialize`], advance it with
[`ContextSchedulerExt::step`] or [`run`], and read results through [`ContextAggregationExt`] and
[`ContextSnapshotExt`].

*/

pub mod agent;
pub mod aggregation;
pub mod context;
pub mod district;
pub mod error;
pub mod log;
pub mod matrix;
pub mod model;
pub mod parameters;
pub mod population;
pub mod random;
pub mod rate_tables;
pub mod scheduler;
pub mod snapshot;
pub mod spatial_index;

// Re-exported for `define_rng!`.
pub use rand;

pub use agent::{AgentSettings, Compartment, ContextAgentExt, PersonAgent, TerminalOutcome};
pub use aggregation::{
    AggregationState, ContextAggregationExt, PeakKind, PeakSummary, TotalKind, TotalSummary,
};
pub use context::{Context, DataPlugin};
pub use district::{BoundingBox, ContextDistrictExt, DistrictRegistry, Point, Polygon};
pub use error::ModelError;
pub use matrix::{AgeDistrictMatrix, AgeGroup, DistrictId};
pub use model::{initialize, run};
pub use parameters::{
    load_parameters_from_json, load_population_from_json, DistrictDefinition, InitialPopulation,
    Parameters,
};
pub use population::ContextPopulationExt;
pub use random::{ContextRandomExt, RngId, SimulationRng};
pub use rate_tables::{ContextRateTablesExt, RateKind, RateTables};
pub use scheduler::ContextSchedulerExt;
pub use snapshot::{ContextSnapshotExt, SeirCounts, Snapshot};
pub use spatial_index::SpatialIndex;

// All modules import `crate::TypeId` in case we want to change the underlying type of `TypeId`.
pub(crate) use std::any::TypeId;

pub(crate) type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

// Replace with `typeid::of as type_of` if necessary.
#[inline(always)]
pub fn type_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

/// Identifies a person for the whole run. Ids are never reused, even after removal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}
