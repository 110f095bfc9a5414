//! chart-bind: keeps a stateful chart engine instance in sync with a
//! declarative configuration coming from a host UI framework.
//!
//! The crate splits the work into a reconcile pipeline (dataset matching,
//! state carrying, in-place config merging) and a lifecycle controller that
//! decides between in-place updates and destroy-and-recreate.

pub mod api;
pub mod core;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod telemetry;

pub use api::{BindingConfig, ChartBinding, ChartProps, DataSource, ReferenceSlot, SlotHandle};
pub use engine::{ChartEngine, ChartInstance};
pub use error::{BindingError, BindingResult, DataSourceError, EngineError};
