/*!

Per-step output. Before each activation pass the scheduler records a [`Snapshot`] of the
aggregates; the history can be written as a CSV time series and the final aggregates as JSON.

*/

use crate::{
    agent::Compartment,
    aggregation::{AggregationState, ContextAggregationExt, PeakSummary, TotalSummary},
    context::{Context, DataPlugin},
    district::ContextDistrictExt,
    error::ModelError,
    matrix::{AgeDistrictMatrix, DistrictId},
    scheduler::ContextSchedulerExt,
};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufWriter, path::Path};

/// Live S/E/I/R counts of one district, or of the whole city.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct SeirCounts {
    pub susceptible: u64,
    pub exposed: u64,
    pub infected: u64,
    pub removed: u64,
}

impl SeirCounts {
    fn of_district(aggregation: &AggregationState, district: DistrictId) -> Self {
        SeirCounts {
            susceptible: aggregation.district_count_of(Compartment::Susceptible, district),
            exposed: aggregation.district_count_of(Compartment::Exposed, district),
            infected: aggregation.district_count_of(Compartment::Infected, district),
            removed: aggregation.district_count_of(Compartment::Removed, district),
        }
    }

    fn of_city(aggregation: &AggregationState) -> Self {
        SeirCounts {
            susceptible: aggregation.city_count_of(Compartment::Susceptible),
            exposed: aggregation.city_count_of(Compartment::Exposed),
            infected: aggregation.city_count_of(Compartment::Infected),
            removed: aggregation.city_count_of(Compartment::Removed),
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.susceptible + self.exposed + self.infected + self.removed
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Snapshot {
    pub step: usize,
    /// Indexed by district, in registration order.
    pub districts: Vec<SeirCounts>,
    pub city: SeirCounts,
    pub peaks: Vec<PeakSummary>,
    pub totals: Vec<TotalSummary>,
    pub dead: AgeDistrictMatrix<u64>,
    pub recovered: AgeDistrictMatrix<u64>,
}

#[derive(Default)]
pub struct SnapshotHistory {
    snapshots: Vec<Snapshot>,
}

impl DataPlugin for SnapshotHistory {
    const new: &'static dyn Fn() -> Self = &SnapshotHistory::default;
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HistoryRow {
    step: usize,
    district: String,
    susceptible: u64,
    exposed: u64,
    infected: u64,
    removed: u64,
}

#[derive(Serialize)]
struct DistrictSummary<'a> {
    district: &'a str,
    #[serde(flatten)]
    peak: &'a PeakSummary,
    #[serde(flatten)]
    total: &'a TotalSummary,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    steps: usize,
    city: SeirCounts,
    districts: Vec<DistrictSummary<'a>>,
    dead: &'a AgeDistrictMatrix<u64>,
    recovered: &'a AgeDistrictMatrix<u64>,
}

pub trait ContextSnapshotExt {
    /// The aggregates as they are right now.
    fn snapshot(&self) -> Snapshot;

    /// Appends the current snapshot to the history.
    fn record_snapshot(&mut self);

    /// Every recorded snapshot, in step order.
    fn get_snapshot_history(&self) -> &[Snapshot];

    /// Writes one row per recorded step and district: step, district, S, E, I, R.
    fn write_history_csv(&self, path: &Path) -> Result<(), ModelError>;

    /// Writes the current peaks, totals, dead and recovered tables as JSON.
    fn write_summary_json(&self, path: &Path) -> Result<(), ModelError>;
}

impl ContextSnapshotExt for Context {
    fn snapshot(&self) -> Snapshot {
        let aggregation = self.get_aggregation();
        Snapshot {
            step: self.get_current_step(),
            districts: self
                .get_districts()
                .ids()
                .map(|district| SeirCounts::of_district(aggregation, district))
                .collect(),
            city: SeirCounts::of_city(aggregation),
            peaks: aggregation.peaks().to_vec(),
            totals: aggregation.totals().to_vec(),
            dead: aggregation.dead().clone(),
            recovered: aggregation.recovered().clone(),
        }
    }

    fn record_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.get_data_container_mut::<SnapshotHistory>()
            .snapshots
            .push(snapshot);
    }

    fn get_snapshot_history(&self) -> &[Snapshot] {
        self.get_data_container::<SnapshotHistory>()
            .map(|history| history.snapshots.as_slice())
            .unwrap_or_default()
    }

    fn write_history_csv(&self, path: &Path) -> Result<(), ModelError> {
        let registry = self.get_districts();
        let mut writer = csv::Writer::from_path(path)?;
        for snapshot in self.get_snapshot_history() {
            for (district, counts) in registry.ids().zip(&snapshot.districts) {
                writer.serialize(HistoryRow {
                    step: snapshot.step,
                    district: registry.name(district).to_string(),
                    susceptible: counts.susceptible,
                    exposed: counts.exposed,
                    infected: counts.infected,
                    removed: counts.removed,
                })?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_summary_json(&self, path: &Path) -> Result<(), ModelError> {
        let registry = self.get_districts();
        let aggregation = self.get_aggregation();
        let summary = RunSummary {
            steps: self.get_current_step(),
            city: SeirCounts::of_city(aggregation),
            districts: registry
                .ids()
                .map(|district| DistrictSummary {
                    district: registry.name(district),
                    peak: &aggregation.peaks()[district.index()],
                    total: &aggregation.totals()[district.index()],
                })
                .collect(),
            dead: aggregation.dead(),
            recovered: aggregation.recovered(),
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &summary)?;
        Ok(())
    }
}
