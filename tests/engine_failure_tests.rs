use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chart_bind::api::{BindingConfig, ChartBinding, ChartProps, DataSource, SlotHandle};
use chart_bind::core::{DatasetEntry, DatasetGroup, InstanceId, LiveConfig};
use chart_bind::engine::{ChartEngine, ChartInstance};
use chart_bind::{BindingError, DataSourceError, EngineError};

/// Engine whose instances fail to destroy while `fail_destroy` is set.
#[derive(Default)]
struct FlakyEngine {
    next_id: u64,
    fail_destroy: Rc<Cell<bool>>,
    destroy_calls: Rc<RefCell<Vec<InstanceId>>>,
}

struct FlakyInstance {
    id: InstanceId,
    config: LiveConfig,
    fail_destroy: Rc<Cell<bool>>,
    destroy_calls: Rc<RefCell<Vec<InstanceId>>>,
}

impl ChartEngine for FlakyEngine {
    type Surface = ();
    type Instance = FlakyInstance;

    fn create(&mut self, _surface: &(), config: LiveConfig) -> Result<FlakyInstance, EngineError> {
        self.next_id += 1;
        Ok(FlakyInstance {
            id: InstanceId::new(self.next_id),
            config,
            fail_destroy: Rc::clone(&self.fail_destroy),
            destroy_calls: Rc::clone(&self.destroy_calls),
        })
    }
}

impl ChartInstance for FlakyInstance {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn config(&self) -> &LiveConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut LiveConfig {
        &mut self.config
    }

    fn update(&mut self) {}

    fn destroy(&mut self) -> Result<(), EngineError> {
        self.destroy_calls.borrow_mut().push(self.id);
        if self.fail_destroy.get() {
            return Err(EngineError::new("canvas context lost"));
        }
        Ok(())
    }
}

fn data() -> DatasetGroup {
    DatasetGroup::default()
        .with_labels(["red", "blue"])
        .with_dataset(DatasetEntry::new("colors").with_data(vec![1.0, 2.0]))
}

fn flaky_binding() -> (
    ChartBinding<FlakyEngine>,
    SlotHandle<FlakyInstance>,
    Rc<Cell<bool>>,
    Rc<RefCell<Vec<InstanceId>>>,
) {
    let engine = FlakyEngine::default();
    let fail_destroy = Rc::clone(&engine.fail_destroy);
    let destroy_calls = Rc::clone(&engine.destroy_calls);
    let handle = SlotHandle::new();
    let binding = ChartBinding::new(engine, BindingConfig::default(), handle.clone().into())
        .expect("binding init");
    (binding, handle, fail_destroy, destroy_calls)
}

#[test]
fn failed_destroy_on_unmount_still_clears_slot() {
    let (mut binding, handle, fail_destroy, destroy_calls) = flaky_binding();
    binding
        .mount(&ChartProps::new("bar", data()), Some(&()))
        .expect("mount");
    let id = binding.instance_id().expect("instance id");
    fail_destroy.set(true);

    let err = binding.unmount().expect_err("destroy failure");

    match err {
        BindingError::Destroy { instance, source } => {
            assert_eq!(instance, id);
            assert_eq!(source.message(), "canvas context lost");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(handle.is_empty());
    assert!(binding.instance().is_none());
    assert_eq!(*destroy_calls.borrow(), vec![id]);

    binding.unmount().expect("second unmount is a no-op");
    assert_eq!(destroy_calls.borrow().len(), 1);
}

#[test]
fn failed_destroy_during_redraw_leaves_binding_ready_to_retry() {
    let (mut binding, handle, fail_destroy, _destroy_calls) = flaky_binding();
    binding
        .mount(&ChartProps::new("bar", data()), Some(&()))
        .expect("mount");
    let id = binding.instance_id().expect("instance id");
    fail_destroy.set(true);

    let redraw = ChartProps::new("bar", data()).with_redraw(true);
    let err = binding.update(&redraw, Some(&())).expect_err("destroy failure");
    assert!(matches!(err, BindingError::Destroy { .. }));
    assert!(handle.is_empty());

    fail_destroy.set(false);
    binding
        .update(&ChartProps::new("bar", data()), Some(&()))
        .expect("retry creates");
    let new_id = binding.instance_id().expect("new instance");
    assert_ne!(new_id, id);
    assert!(!handle.is_empty());
}

#[test]
fn data_source_failure_propagates_and_keeps_instance() {
    let (mut binding, handle, _fail_destroy, destroy_calls) = flaky_binding();
    binding
        .mount(&ChartProps::new("bar", data()), Some(&()))
        .expect("mount");
    let id = binding.instance_id().expect("instance id");
    let before = binding.live_config().expect("live");

    let failing: DataSource<()> =
        DataSource::lazy(|_surface: Option<&()>| Err(DataSourceError::new("feed offline")));
    let err = binding
        .update(&ChartProps::new("bar", failing.clone()), Some(&()))
        .expect_err("data failure");
    assert!(matches!(err, BindingError::DataSource(ref e) if e.message() == "feed offline"));
    assert_eq!(binding.instance_id(), Some(id));
    assert_eq!(binding.live_config().expect("live"), before);

    let redraw = ChartProps::new("bar", failing).with_redraw(true);
    let err = binding.update(&redraw, Some(&())).expect_err("data failure before redraw");
    assert!(matches!(err, BindingError::DataSource(_)));
    assert_eq!(binding.instance_id(), Some(id));
    assert!(destroy_calls.borrow().is_empty());
    assert!(!handle.is_empty());
}

#[test]
fn data_source_failure_on_mount_creates_nothing() {
    let (mut binding, handle, _fail_destroy, _destroy_calls) = flaky_binding();
    let attempts = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&attempts);
    let data = DataSource::lazy(move |surface: Option<&()>| {
        counter.set(counter.get() + 1);
        match surface {
            Some(()) => Err(DataSourceError::new("bad surface data")),
            None => Ok(DatasetGroup::default()),
        }
    });

    let err = binding
        .mount(&ChartProps::new("bar", data), Some(&()))
        .expect_err("lazy data failure");

    assert!(matches!(err, BindingError::DataSource(_)));
    assert_eq!(attempts.get(), 2);
    assert!(handle.is_empty());
    assert!(binding.instance_id().is_none());
}

#[test]
fn property_identity_requires_a_name() {
    let config = BindingConfig::default()
        .with_dataset_identity(chart_bind::reconcile::DatasetIdentity::by_property(" "));
    let result = ChartBinding::new(FlakyEngine::default(), config, SlotHandle::new().into());
    assert!(matches!(result, Err(BindingError::InvalidConfig(_))));
}
