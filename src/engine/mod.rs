mod null_engine;

pub use null_engine::{
    EngineEvent, NullChartCache, NullEngine, NullInstance, NullSeriesState, NullSurface,
};

use crate::core::{InstanceId, LiveConfig};
use crate::error::EngineError;

/// Factory side of a rendering engine.
///
/// Implementations own whatever global state the engine needs (id counters,
/// registries) and build one instance per binding epoch.
pub trait ChartEngine {
    /// Already resolved drawing surface handle.
    type Surface;
    type Instance: ChartInstance;

    fn create(
        &mut self,
        surface: &Self::Surface,
        config: LiveConfig,
    ) -> Result<Self::Instance, EngineError>;
}

/// Live, stateful chart object kept in sync by the binding.
pub trait ChartInstance {
    fn id(&self) -> InstanceId;
    fn config(&self) -> &LiveConfig;
    fn config_mut(&mut self) -> &mut LiveConfig;
    /// Re-reads the live configuration and redraws.
    fn update(&mut self);
    fn destroy(&mut self) -> Result<(), EngineError>;
}
