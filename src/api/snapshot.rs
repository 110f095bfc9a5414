use serde::{Deserialize, Serialize};

use crate::core::{ChartKind, InstanceId, Label};
use crate::engine::{ChartEngine, ChartInstance};
use crate::error::{BindingError, BindingResult};

use super::{ChartBinding, LifecyclePhase};

pub const BINDING_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;

/// Running counters of a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingStats {
    /// Instances created so far.
    pub epochs: u64,
    /// In-place reconcile passes, including the one after a lazy mount.
    pub reconcile_passes: u64,
    pub recreations: u64,
    pub deferred_creations: u64,
    pub ignored_callbacks: u64,
}

/// Serializable view of a binding and its live instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSnapshot {
    pub phase: LifecyclePhase,
    pub instance_id: Option<InstanceId>,
    pub kind: Option<ChartKind>,
    pub dataset_labels: Vec<Option<Label>>,
    pub datasets_with_state: usize,
    pub stats: BindingStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: BindingSnapshot,
}

impl BindingSnapshot {
    pub fn to_json_contract_v1_pretty(&self) -> BindingResult<String> {
        let payload = BindingSnapshotJsonContractV1 {
            schema_version: BINDING_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            BindingError::InvalidConfig(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    /// Accepts either a bare snapshot or a versioned contract payload.
    pub fn from_json_compat_str(input: &str) -> BindingResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<BindingSnapshot>(input) {
            return Ok(snapshot);
        }
        let payload: BindingSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            BindingError::InvalidConfig(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != BINDING_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(BindingError::InvalidConfig(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}

impl<E: ChartEngine> ChartBinding<E> {
    #[must_use]
    pub fn snapshot(&self) -> BindingSnapshot {
        let live = self.with_instance(|instance| {
            let config = instance.config();
            (
                instance.id(),
                config.kind.clone(),
                config
                    .data
                    .datasets
                    .iter()
                    .map(|dataset| dataset.label.clone())
                    .collect::<Vec<_>>(),
                config
                    .data
                    .datasets
                    .iter()
                    .filter(|dataset| dataset.internal_state.is_some())
                    .count(),
            )
        });

        match live {
            Some((id, kind, dataset_labels, datasets_with_state)) => BindingSnapshot {
                phase: self.phase(),
                instance_id: Some(id),
                kind: Some(kind),
                dataset_labels,
                datasets_with_state,
                stats: self.stats(),
            },
            None => BindingSnapshot {
                phase: self.phase(),
                instance_id: None,
                kind: None,
                dataset_labels: Vec::new(),
                datasets_with_state: 0,
                stats: self.stats(),
            },
        }
    }

    pub fn snapshot_json_contract_v1_pretty(&self) -> BindingResult<String> {
        self.snapshot().to_json_contract_v1_pretty()
    }
}
