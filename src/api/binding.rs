use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::core::{DatasetGroup, InstanceId, LiveConfig};
use crate::engine::{ChartEngine, ChartInstance};
use crate::error::{BindingError, BindingResult};
use crate::reconcile::{DeclarativeConfig, ReconcileReport, reconcile_instance};

use super::{
    BindingConfig, BindingStats, ChartProps, InstanceRef, KindChangePolicy, LifecyclePhase,
    RecreateReason, ReferenceSlot,
};

/// Keeps one engine instance in sync with the host's declarative props.
///
/// The host drives it through `mount`, `update` and `unmount`, serially and
/// on a single thread. The binding owns the instance for its whole life and
/// publishes it through the reference slot on every creation and
/// destruction.
pub struct ChartBinding<E: ChartEngine> {
    engine: E,
    config: BindingConfig,
    slot: ReferenceSlot<E::Instance>,
    instance: Option<Rc<RefCell<E::Instance>>>,
    phase: LifecyclePhase,
    mount_key: Option<String>,
    /// Lazy data already evaluated without a surface while creation waits.
    pending_data: Option<DatasetGroup>,
    stats: BindingStats,
}

/// Data evaluated up front so a failing source never leaves a half-built
/// instance behind.
struct Creation<'s, S> {
    surface: &'s S,
    initial: DeclarativeConfig,
    bound: Option<DeclarativeConfig>,
}

impl<E: ChartEngine> ChartBinding<E> {
    pub fn new(
        engine: E,
        config: BindingConfig,
        slot: ReferenceSlot<E::Instance>,
    ) -> BindingResult<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            slot,
            instance: None,
            phase: LifecyclePhase::Unmounted,
            mount_key: None,
            pending_data: None,
            stats: BindingStats::default(),
        })
    }

    /// Host mount callback.
    ///
    /// Without a surface the creation is deferred to a later `update`.
    pub fn mount(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&E::Surface>,
    ) -> BindingResult<()> {
        if self.phase != LifecyclePhase::Unmounted {
            return Err(BindingError::InvalidTransition {
                phase: self.phase.as_str(),
                callback: "mount",
            });
        }
        self.phase = LifecyclePhase::Deferred;
        self.mount_key.clone_from(&props.mount_key);
        self.create(props, surface)
    }

    /// Host update callback, invoked on every prop change.
    pub fn update(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&E::Surface>,
    ) -> BindingResult<()> {
        match self.phase {
            LifecyclePhase::Unmounted | LifecyclePhase::TornDown => {
                self.stats.ignored_callbacks += 1;
                warn!(phase = %self.phase, "ignoring update on a binding that is not mounted");
                Ok(())
            }
            LifecyclePhase::Destroying => Err(BindingError::InvalidTransition {
                phase: self.phase.as_str(),
                callback: "update",
            }),
            LifecyclePhase::Deferred => {
                self.mount_key.clone_from(&props.mount_key);
                self.create(props, surface)
            }
            LifecyclePhase::Mounted => match self.recreate_reason(props) {
                Some(reason) => self.recreate(props, surface, reason),
                None => self.reconcile(props, surface).map(|_| ()),
            },
        }
    }

    /// Host unmount callback. Idempotent.
    ///
    /// The slot is cleared even when the engine fails to destroy the
    /// instance; that failure is returned afterwards.
    pub fn unmount(&mut self) -> BindingResult<()> {
        match self.phase {
            LifecyclePhase::Unmounted | LifecyclePhase::TornDown => {
                self.stats.ignored_callbacks += 1;
                debug!(phase = %self.phase, "ignoring unmount on a binding that is not mounted");
                Ok(())
            }
            LifecyclePhase::Destroying => Err(BindingError::InvalidTransition {
                phase: self.phase.as_str(),
                callback: "unmount",
            }),
            LifecyclePhase::Deferred | LifecyclePhase::Mounted => {
                debug!(instance = ?self.instance_id(), "unmounting chart binding");
                self.destroy_instance(LifecyclePhase::TornDown)
            }
        }
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Read view of the current instance, if any.
    #[must_use]
    pub fn instance(&self) -> Option<InstanceRef<E::Instance>> {
        self.instance.as_ref().map(InstanceRef::new)
    }

    #[must_use]
    pub fn instance_id(&self) -> Option<InstanceId> {
        self.with_instance(|instance| instance.id())
    }

    /// Copy of the live configuration tree of the current instance.
    #[must_use]
    pub fn live_config(&self) -> Option<LiveConfig> {
        self.with_instance(|instance| instance.config().clone())
    }

    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> BindingStats {
        self.stats
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub(super) fn with_instance<R>(&self, f: impl FnOnce(&E::Instance) -> R) -> Option<R> {
        let instance = self.instance.as_ref()?;
        let guard = instance.try_borrow().ok()?;
        Some(f(&guard))
    }

    fn recreate_reason(&self, props: &ChartProps<E::Surface>) -> Option<RecreateReason> {
        if props.redraw {
            return Some(RecreateReason::Redraw);
        }
        if props.mount_key != self.mount_key {
            return Some(RecreateReason::MountKeyChanged);
        }
        if self.config.kind_change_policy == KindChangePolicy::Recreate
            && self
                .with_instance(|instance| instance.config().kind != props.kind)
                .unwrap_or(false)
        {
            return Some(RecreateReason::KindChanged);
        }
        None
    }

    /// Evaluates the data a creation needs.
    ///
    /// Lazy data is called once without a surface and once with it. When the
    /// surface is missing, the first result is kept so the deferred retry only
    /// performs the surface-bound call.
    fn evaluate_for_creation<'s>(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&'s E::Surface>,
    ) -> BindingResult<Option<Creation<'s, E::Surface>>> {
        let initial = match self.pending_data.take() {
            Some(data) if props.data.is_lazy() => DeclarativeConfig {
                kind: props.kind.clone(),
                data,
                options: props.options.clone(),
            },
            _ => props.resolve(None)?,
        };
        let Some(surface) = surface else {
            if props.data.is_lazy() {
                self.pending_data = Some(initial.data);
            }
            return Ok(None);
        };
        let bound = if props.data.is_lazy() {
            match props.resolve(Some(surface)) {
                Ok(bound) => Some(bound),
                Err(err) => {
                    self.pending_data = Some(initial.data);
                    return Err(err.into());
                }
            }
        } else {
            None
        };
        Ok(Some(Creation {
            surface,
            initial,
            bound,
        }))
    }

    fn create(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&E::Surface>,
    ) -> BindingResult<()> {
        match self.evaluate_for_creation(props, surface)? {
            Some(creation) => self.create_from(creation),
            None => {
                self.defer();
                Ok(())
            }
        }
    }

    fn defer(&mut self) {
        self.phase = LifecyclePhase::Deferred;
        self.stats.deferred_creations += 1;
        debug!("drawing surface not resolved; deferring chart creation");
    }

    fn create_from(&mut self, creation: Creation<'_, E::Surface>) -> BindingResult<()> {
        let Creation {
            surface,
            initial,
            bound,
        } = creation;
        let live = LiveConfig::from_declarative(initial.kind, initial.data, initial.options);
        let instance = match self.engine.create(surface, live) {
            Ok(instance) => instance,
            Err(err) => {
                warn!(error = %err, "engine failed to create chart instance");
                self.phase = LifecyclePhase::Deferred;
                return Err(err.into());
            }
        };
        let id = instance.id();
        let instance = Rc::new(RefCell::new(instance));
        self.instance = Some(Rc::clone(&instance));
        self.phase = LifecyclePhase::Mounted;
        self.stats.epochs += 1;
        debug!(instance = %id, epoch = self.stats.epochs, "created chart instance");

        self.slot.assign(Some(InstanceRef::new(&instance)));

        if let Some(bound) = bound {
            let mut guard = instance
                .try_borrow_mut()
                .map_err(|_| BindingError::Reentrant { callback: "mount" })?;
            reconcile_instance(&mut *guard, &bound, &self.config.dataset_identity);
            self.stats.reconcile_passes += 1;
        }
        Ok(())
    }

    fn reconcile(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&E::Surface>,
    ) -> BindingResult<ReconcileReport> {
        let next = props.resolve(surface)?;
        let Some(instance) = self.instance.as_ref() else {
            return Err(BindingError::InvalidTransition {
                phase: self.phase.as_str(),
                callback: "update",
            });
        };
        let mut guard = instance
            .try_borrow_mut()
            .map_err(|_| BindingError::Reentrant { callback: "update" })?;
        let report = reconcile_instance(&mut *guard, &next, &self.config.dataset_identity);
        self.stats.reconcile_passes += 1;
        Ok(report)
    }

    fn recreate(
        &mut self,
        props: &ChartProps<E::Surface>,
        surface: Option<&E::Surface>,
        reason: RecreateReason,
    ) -> BindingResult<()> {
        let creation = self.evaluate_for_creation(props, surface)?;
        debug!(instance = ?self.instance_id(), %reason, "recreating chart instance");

        self.mount_key.clone_from(&props.mount_key);
        self.destroy_instance(LifecyclePhase::Deferred)?;
        self.stats.recreations += 1;

        match creation {
            Some(creation) => self.create_from(creation),
            None => {
                self.defer();
                Ok(())
            }
        }
    }

    /// Destroys the current instance and moves to `next_phase`.
    ///
    /// The instance is released and the slot cleared whatever the engine
    /// returns.
    fn destroy_instance(&mut self, next_phase: LifecyclePhase) -> BindingResult<()> {
        if next_phase == LifecyclePhase::TornDown {
            self.pending_data = None;
        }
        let Some(instance) = self.instance.take() else {
            self.phase = next_phase;
            return Ok(());
        };

        let outcome = match instance.try_borrow_mut() {
            Ok(mut guard) => {
                self.phase = LifecyclePhase::Destroying;
                let id = guard.id();
                Ok((id, guard.destroy()))
            }
            Err(_) => Err(BindingError::Reentrant {
                callback: "destroy",
            }),
        };
        let (id, result) = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.instance = Some(instance);
                return Err(err);
            }
        };

        drop(instance);
        self.slot.assign(None);
        self.phase = next_phase;

        match result {
            Ok(()) => {
                trace!(instance = %id, phase = %next_phase, "destroyed chart instance");
                Ok(())
            }
            Err(source) => {
                warn!(instance = %id, error = %source, "chart instance failed to destroy cleanly");
                Err(BindingError::Destroy {
                    instance: id,
                    source,
                })
            }
        }
    }
}

impl<E: ChartEngine> Drop for ChartBinding<E> {
    fn drop(&mut self) {
        if self.instance.is_none() {
            return;
        }
        if let Err(err) = self.destroy_instance(LifecyclePhase::TornDown) {
            warn!(error = %err, "failed to destroy chart instance while dropping binding");
        }
    }
}
