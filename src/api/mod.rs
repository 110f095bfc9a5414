mod binding;
mod binding_config;
mod lifecycle;
mod props;
mod reference_slot;
mod snapshot;

pub use binding::ChartBinding;
pub use binding_config::{BindingConfig, KindChangePolicy};
pub use lifecycle::{LifecyclePhase, RecreateReason};
pub use props::{ChartProps, DataSource};
pub use reference_slot::{InstanceRef, ReferenceSlot, SlotHandle};
pub use snapshot::{
    BINDING_SNAPSHOT_JSON_SCHEMA_V1, BindingSnapshot, BindingSnapshotJsonContractV1, BindingStats,
};
