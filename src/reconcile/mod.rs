//! Reconciliation of a declarative configuration into a live chart instance.
//!
//! A pass runs leaf-first: the matcher pairs datasets by identity, the
//! carrier stages new entries with the state they inherit, and the merger
//! writes everything into the live tree before the instance redraws once.

mod carrier;
mod matcher;
mod merger;

pub use carrier::{StagedDataset, carry_state};
pub use matcher::{
    DatasetId, DatasetIdKey, DatasetIdentity, DatasetKey, MatchPlan, match_datasets,
};
pub use merger::{MergeReport, MergeTarget, merge_into};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{ChartKind, DatasetGroup, InstanceId, OptionsTree};
use crate::engine::ChartInstance;

/// Props with `data` resolved against the current surface.
///
/// Always an owned copy; the caller's values are never written through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    #[serde(default)]
    pub data: DatasetGroup,
    #[serde(default)]
    pub options: OptionsTree,
}

/// Outcome of one in-place reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub instance: InstanceId,
    pub matched: usize,
    pub merge: MergeReport,
}

/// Runs matcher, carrier and merger against `instance`, then calls its
/// `update()` exactly once.
pub fn reconcile_instance<I: ChartInstance>(
    instance: &mut I,
    next: &DeclarativeConfig,
    identity: &DatasetIdentity,
) -> ReconcileReport {
    let live = instance.config_mut();
    let plan = match_datasets(&live.data.datasets, &next.data.datasets, identity);
    let staged = carry_state(&live.data.datasets, &next.data.datasets, &plan);
    let merge = merge_into(
        live,
        MergeTarget {
            kind: &next.kind,
            labels: &next.data.labels,
            options: &next.options,
        },
        staged,
    );

    instance.update();

    let report = ReconcileReport {
        instance: instance.id(),
        matched: plan.matched(),
        merge,
    };
    trace!(
        instance = %report.instance,
        matched = report.matched,
        carried = merge.carried,
        fresh = merge.fresh,
        kind_changed = merge.kind_changed,
        labels_changed = merge.labels_changed,
        options_changed = merge.options_changed,
        "reconciled chart instance"
    );
    report
}
