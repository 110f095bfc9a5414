use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{InstanceId, InternalState, LiveConfig};
use crate::error::EngineError;

use super::{ChartEngine, ChartInstance};

/// Drawing surface understood by [`NullEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullSurface {
    pub width: u32,
    pub height: u32,
}

impl NullSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Lifecycle event recorded by [`NullEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    Created { instance: InstanceId },
    Updated { instance: InstanceId },
    Destroyed { instance: InstanceId },
}

/// Per-chart cache hung off the live configuration by [`NullEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullChartCache {
    pub instance: InstanceId,
}

/// Per-series payload attached by [`NullEngine`] instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullSeriesState {
    pub instance: InstanceId,
    pub serial: u64,
}

type EventLog = Rc<RefCell<Vec<EngineEvent>>>;

/// Headless engine used by tests, benches and hosts without a backend.
///
/// It assigns sequential instance ids and attaches a fresh
/// [`NullSeriesState`] to every dataset that has none, both at creation and
/// on every `update()`, the way a real engine initializes series metadata.
#[derive(Debug, Default)]
pub struct NullEngine {
    next_id: u64,
    events: EventLog,
}

impl NullEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lifecycle event recorded so far, across all instances.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    /// Shared handle to the event log; stays readable after the engine is
    /// dropped together with its binding.
    #[must_use]
    pub fn event_log(&self) -> Rc<RefCell<Vec<EngineEvent>>> {
        Rc::clone(&self.events)
    }

    #[must_use]
    pub fn update_count(&self, instance: InstanceId) -> usize {
        self.count(|event| *event == EngineEvent::Updated { instance })
    }

    #[must_use]
    pub fn destroy_count(&self, instance: InstanceId) -> usize {
        self.count(|event| *event == EngineEvent::Destroyed { instance })
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.count(|event| matches!(event, EngineEvent::Created { .. }))
    }

    fn count(&self, predicate: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| predicate(event)).count()
    }
}

impl ChartEngine for NullEngine {
    type Surface = NullSurface;
    type Instance = NullInstance;

    fn create(
        &mut self,
        surface: &NullSurface,
        config: LiveConfig,
    ) -> Result<NullInstance, EngineError> {
        if !surface.is_valid() {
            return Err(EngineError::new(format!(
                "invalid surface size: width={}, height={}",
                surface.width, surface.height
            )));
        }

        self.next_id += 1;
        let id = InstanceId::new(self.next_id);
        let mut instance = NullInstance {
            id,
            config,
            next_serial: 0,
            destroyed: false,
            events: Rc::clone(&self.events),
        };
        instance.config.engine_cache = Some(InternalState::new(NullChartCache { instance: id }));
        instance.attach_missing_series_state();
        self.events.borrow_mut().push(EngineEvent::Created { instance: id });
        Ok(instance)
    }
}

/// Instance produced by [`NullEngine`].
#[derive(Debug)]
pub struct NullInstance {
    id: InstanceId,
    config: LiveConfig,
    next_serial: u64,
    destroyed: bool,
    events: EventLog,
}

impl NullInstance {
    fn attach_missing_series_state(&mut self) {
        for dataset in &mut self.config.data.datasets {
            if dataset.internal_state.is_none() {
                self.next_serial += 1;
                dataset.internal_state = Some(InternalState::new(NullSeriesState {
                    instance: self.id,
                    serial: self.next_serial,
                }));
            }
        }
    }
}

impl ChartInstance for NullInstance {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn config(&self) -> &LiveConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut LiveConfig {
        &mut self.config
    }

    fn update(&mut self) {
        self.attach_missing_series_state();
        trace!(instance = %self.id, datasets = self.config.data.datasets.len(), "null engine update");
        self.events
            .borrow_mut()
            .push(EngineEvent::Updated { instance: self.id });
    }

    fn destroy(&mut self) -> Result<(), EngineError> {
        if self.destroyed {
            return Err(EngineError::new(format!(
                "instance {} already destroyed",
                self.id
            )));
        }
        self.destroyed = true;
        self.events
            .borrow_mut()
            .push(EngineEvent::Destroyed { instance: self.id });
        Ok(())
    }
}
