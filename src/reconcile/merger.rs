use serde::{Deserialize, Serialize};

use crate::core::{ChartKind, Label, LiveConfig, LiveDataset, OptionsTree};

use super::carrier::StagedDataset;

/// What a merge pass wrote into the live configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub kind_changed: bool,
    pub labels_changed: bool,
    pub options_changed: bool,
    /// Datasets that kept their previous live entry and state.
    pub carried: usize,
    /// Datasets that start without engine state.
    pub fresh: usize,
}

/// Declarative values written by [`merge_into`] besides the datasets.
#[derive(Debug, Clone, Copy)]
pub struct MergeTarget<'a> {
    pub kind: &'a ChartKind,
    pub labels: &'a [Label],
    pub options: &'a OptionsTree,
}

/// Writes staged datasets and declarative values into `live` in place.
///
/// Only differing subtrees are replaced. A staged dataset with an origin
/// reuses the previous live dataset, so engine-side fields hung off it stay
/// put; `live.engine_cache` is never touched.
pub fn merge_into(
    live: &mut LiveConfig,
    target: MergeTarget<'_>,
    staged: Vec<StagedDataset>,
) -> MergeReport {
    let mut report = MergeReport::default();

    if live.kind != *target.kind {
        live.kind = target.kind.clone();
        report.kind_changed = true;
    }

    if live.data.labels.as_slice() != target.labels {
        live.data.labels = target.labels.to_vec();
        report.labels_changed = true;
    }

    let mut previous: Vec<Option<LiveDataset>> = std::mem::take(&mut live.data.datasets)
        .into_iter()
        .map(Some)
        .collect();

    live.data.datasets = staged
        .into_iter()
        .map(|staged| {
            let reused = staged
                .origin
                .and_then(|origin| previous.get_mut(origin).and_then(Option::take));
            let carried = staged.internal_state.is_some();
            let dataset = match reused {
                Some(mut dataset) => {
                    dataset.apply_entry(&staged.entry);
                    dataset.internal_state = staged.internal_state;
                    dataset
                }
                None => LiveDataset::from_entry(staged.entry, staged.internal_state),
            };
            if carried {
                report.carried += 1;
            } else {
                report.fresh += 1;
            }
            dataset
        })
        .collect();

    report.options_changed = live.options.reconcile_from(target.options);
    report
}
