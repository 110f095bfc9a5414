use smallvec::SmallVec;

use crate::core::{DatasetEntry, InternalState, LiveDataset};

use super::matcher::MatchPlan;

/// New declarative entry staged for the merge step.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedDataset {
    /// Owned copy of the caller's entry.
    pub entry: DatasetEntry,
    /// State carried from the matched previous dataset, if any.
    pub internal_state: Option<InternalState>,
    /// Index of the previous dataset the state came from.
    pub origin: Option<usize>,
}

impl StagedDataset {
    #[must_use]
    pub fn is_carried(&self) -> bool {
        self.internal_state.is_some()
    }
}

/// Stages `next` for merging, carrying internal state along the plan.
///
/// State moves only when the pair is matched, the previous dataset already
/// has engine state, and the incoming entry still supplies data. Everything
/// else is staged fresh so the engine initializes it on its next update.
///
/// A previous dataset hands its state to at most one entry: when `next`
/// repeats a key, only the first claimant inherits it.
#[must_use]
pub fn carry_state(
    previous: &[LiveDataset],
    next: &[DatasetEntry],
    plan: &MatchPlan,
) -> Vec<StagedDataset> {
    let mut claimed: SmallVec<[bool; 8]> = SmallVec::from_elem(false, previous.len());
    next.iter()
        .enumerate()
        .map(|(index, entry)| {
            let carried = plan
                .get(index)
                .filter(|_| entry.data.is_some())
                .filter(|&origin| claimed.get(origin).is_some_and(|taken| !taken))
                .and_then(|origin| {
                    previous
                        .get(origin)
                        .and_then(|dataset| dataset.internal_state.clone())
                        .map(|state| (origin, state))
                });
            if let Some((origin, _)) = carried {
                claimed[origin] = true;
            }

            match carried {
                Some((origin, state)) => StagedDataset {
                    entry: entry.clone(),
                    internal_state: Some(state),
                    origin: Some(origin),
                },
                None => StagedDataset {
                    entry: entry.clone(),
                    internal_state: None,
                    origin: None,
                },
            }
        })
        .collect()
}
