pub mod dataset;
pub mod internal_state;
pub mod options;
pub mod types;

pub use dataset::{DatasetEntry, DatasetGroup, LiveConfig, LiveData, LiveDataset};
pub use internal_state::InternalState;
pub use options::OptionsTree;
pub use types::{ChartKind, InstanceId, Label};
