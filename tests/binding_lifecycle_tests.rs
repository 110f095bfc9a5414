use std::cell::RefCell;
use std::rc::Rc;

use chart_bind::BindingError;
use chart_bind::api::{
    BindingConfig, ChartBinding, ChartProps, DataSource, InstanceRef, KindChangePolicy,
    LifecyclePhase, ReferenceSlot, SlotHandle,
};
use chart_bind::core::{DatasetEntry, DatasetGroup, InstanceId, OptionsTree};
use chart_bind::engine::{ChartInstance, EngineEvent, NullEngine, NullInstance, NullSurface};

fn surface() -> NullSurface {
    NullSurface::new(640, 480)
}

fn data() -> DatasetGroup {
    DatasetGroup::default()
        .with_labels(["red", "blue"])
        .with_dataset(DatasetEntry::new("colors").with_data(vec![1.0, 2.0]))
}

fn props() -> ChartProps<NullSurface> {
    ChartProps::new("bar", data()).with_options(OptionsTree::new().with("responsive", false))
}

fn binding_with_slot(slot: ReferenceSlot<NullInstance>) -> ChartBinding<NullEngine> {
    ChartBinding::new(NullEngine::new(), BindingConfig::default(), slot).expect("binding init")
}

fn recording_slot() -> (ReferenceSlot<NullInstance>, Rc<RefCell<Vec<Option<InstanceId>>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&seen);
    let slot = ReferenceSlot::callback(move |instance: Option<InstanceRef<NullInstance>>| {
        let id = instance.and_then(|instance| instance.with(|i| i.id()));
        recorded.borrow_mut().push(id);
    });
    (slot, seen)
}

#[test]
fn mount_assigns_reference_slot() {
    let handle = SlotHandle::new();
    let mut binding = binding_with_slot(handle.clone().into());
    assert!(handle.is_empty());

    binding.mount(&props(), Some(&surface())).expect("mount");

    assert_eq!(binding.phase(), LifecyclePhase::Mounted);
    let id = handle.with(|instance| instance.id()).expect("slot assigned");
    assert_eq!(Some(id), binding.instance_id());
}

#[test]
fn callback_slot_sees_instance_on_mount() {
    let (slot, seen) = recording_slot();
    let mut binding = binding_with_slot(slot);

    binding.mount(&props(), Some(&surface())).expect("mount");

    assert_eq!(*seen.borrow(), vec![binding.instance_id()]);
}

#[test]
fn in_place_updates_keep_identity() {
    let (slot, seen) = recording_slot();
    let mut binding = binding_with_slot(slot);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let id = binding.instance_id().expect("instance id");

    for value in 0..5 {
        let next = ChartProps::new(
            "bar",
            DatasetGroup::default()
                .with_labels(["red", "blue"])
                .with_dataset(DatasetEntry::new("colors").with_data(vec![f64::from(value), 1.0])),
        );
        binding.update(&next, Some(&surface())).expect("update");
        assert_eq!(binding.instance_id(), Some(id));
    }

    assert_eq!(binding.engine().update_count(id), 5);
    assert_eq!(binding.engine().created_count(), 1);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(binding.stats().reconcile_passes, 5);
}

#[test]
fn redraw_destroys_and_recreates() {
    let (slot, seen) = recording_slot();
    let mut binding = binding_with_slot(slot);
    binding
        .mount(&props().with_redraw(true), Some(&surface()))
        .expect("mount");
    let id = binding.instance_id().expect("instance id");

    let new_data = DatasetGroup::default()
        .with_labels(["red", "blue"])
        .with_dataset(DatasetEntry::new("colors").with_data(vec![2.0, 1.0]));
    binding
        .update(
            &ChartProps::new("bar", new_data.clone()).with_redraw(true),
            Some(&surface()),
        )
        .expect("update");

    let new_id = binding.instance_id().expect("new instance id");
    assert_ne!(new_id, id);
    assert_eq!(binding.engine().destroy_count(id), 1);
    assert_eq!(binding.live_config().expect("live").data.to_group(), new_data);
    assert_eq!(*seen.borrow(), vec![Some(id), None, Some(new_id)]);
    assert_eq!(binding.stats().recreations, 1);
    assert_eq!(binding.stats().epochs, 2);
}

#[test]
fn redraw_does_not_carry_state() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let old_state = binding.live_config().expect("live").data.datasets[0]
        .internal_state
        .clone()
        .expect("state");

    binding
        .update(&props().with_redraw(true), Some(&surface()))
        .expect("update");

    let new_state = binding.live_config().expect("live").data.datasets[0]
        .internal_state
        .clone()
        .expect("state");
    assert!(!new_state.ptr_eq(&old_state));
}

#[test]
fn handles_taken_before_recreate_go_dead() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let stale = binding.instance().expect("instance");
    assert!(stale.is_live());

    binding
        .update(&props().with_redraw(true), Some(&surface()))
        .expect("update");

    assert!(!stale.is_live());
    assert!(stale.with(|i| i.id()).is_none());
}

#[test]
fn mount_key_change_forces_recreate() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding
        .mount(&props().with_mount_key("a"), Some(&surface()))
        .expect("mount");
    let id = binding.instance_id().expect("instance id");

    binding
        .update(&props().with_mount_key("a"), Some(&surface()))
        .expect("same key");
    assert_eq!(binding.instance_id(), Some(id));

    binding
        .update(&props().with_mount_key("b"), Some(&surface()))
        .expect("new key");
    assert_ne!(binding.instance_id(), Some(id));
}

#[test]
fn kind_change_recreates_under_recreate_policy() {
    let config = BindingConfig::default().with_kind_change_policy(KindChangePolicy::Recreate);
    let mut binding =
        ChartBinding::new(NullEngine::new(), config, ReferenceSlot::Detached).expect("binding");
    binding.mount(&props(), Some(&surface())).expect("mount");
    let id = binding.instance_id().expect("instance id");

    binding
        .update(&ChartProps::new("line", data()), Some(&surface()))
        .expect("update");

    assert_ne!(binding.instance_id(), Some(id));
    assert_eq!(binding.live_config().expect("live").kind.as_str(), "line");
}

#[test]
fn unmount_destroys_and_clears_slot() {
    let handle = SlotHandle::new();
    let mut binding = binding_with_slot(handle.clone().into());
    binding.mount(&props(), Some(&surface())).expect("mount");
    let id = binding.instance_id().expect("instance id");
    assert!(!handle.is_empty());

    binding.unmount().expect("unmount");

    assert!(handle.is_empty());
    assert_eq!(binding.phase(), LifecyclePhase::TornDown);
    assert_eq!(binding.instance_id(), None);
    assert_eq!(binding.engine().destroy_count(id), 1);
}

#[test]
fn unmount_twice_and_update_after_unmount_are_noops() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let id = binding.instance_id().expect("instance id");

    binding.unmount().expect("first unmount");
    binding.unmount().expect("second unmount");
    binding.update(&props(), Some(&surface())).expect("late update");

    assert_eq!(binding.engine().destroy_count(id), 1);
    assert_eq!(binding.engine().created_count(), 1);
    assert_eq!(binding.instance_id(), None);
    assert_eq!(binding.stats().ignored_callbacks, 2);
}

#[test]
fn mount_without_surface_defers_creation() {
    let handle = SlotHandle::new();
    let mut binding = binding_with_slot(handle.clone().into());

    binding.mount(&props(), None).expect("mount");
    assert_eq!(binding.phase(), LifecyclePhase::Deferred);
    assert!(handle.is_empty());
    assert!(binding.engine().events().is_empty());

    binding.update(&props(), None).expect("still no surface");
    assert_eq!(binding.phase(), LifecyclePhase::Deferred);

    binding.update(&props(), Some(&surface())).expect("surface ready");
    assert_eq!(binding.phase(), LifecyclePhase::Mounted);
    assert!(!handle.is_empty());
    assert_eq!(binding.stats().deferred_creations, 2);
}

#[test]
fn deferred_lazy_mount_evaluates_data_once_per_surface_state() {
    let calls = Rc::new(RefCell::new(Vec::<Option<NullSurface>>::new()));
    let recorded = Rc::clone(&calls);
    let lazy = DataSource::lazy(move |surface: Option<&NullSurface>| {
        recorded.borrow_mut().push(surface.copied());
        Ok(if surface.is_some() { data() } else { DatasetGroup::default() })
    });
    let props = ChartProps::new("bar", lazy);
    let mut binding = binding_with_slot(ReferenceSlot::Detached);

    binding.mount(&props, None).expect("mount");
    binding.update(&props, None).expect("still no surface");
    assert_eq!(*calls.borrow(), vec![None]);

    binding.update(&props, Some(&surface())).expect("surface ready");
    assert_eq!(binding.phase(), LifecyclePhase::Mounted);
    assert_eq!(*calls.borrow(), vec![None, Some(surface())]);

    let id = binding.instance_id().expect("instance id");
    assert_eq!(binding.engine().update_count(id), 1);
    assert_eq!(binding.live_config().expect("live").data.to_group(), data());
}

#[test]
fn unmount_while_deferred_never_touches_engine() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), None).expect("mount");

    binding.unmount().expect("unmount");

    assert_eq!(binding.phase(), LifecyclePhase::TornDown);
    assert!(binding.engine().events().is_empty());
}

#[test]
fn mounting_twice_is_rejected() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");

    let err = binding
        .mount(&props(), Some(&surface()))
        .expect_err("second mount");
    assert!(matches!(
        err,
        BindingError::InvalidTransition {
            callback: "mount",
            ..
        }
    ));
    assert_eq!(binding.engine().created_count(), 1);
}

#[test]
fn update_before_mount_is_ignored() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.update(&props(), Some(&surface())).expect("update");

    assert_eq!(binding.phase(), LifecyclePhase::Unmounted);
    assert!(binding.engine().events().is_empty());
}

#[test]
fn invalid_surface_surfaces_engine_error_and_stays_deferred() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);

    let err = binding
        .mount(&props(), Some(&NullSurface::new(0, 480)))
        .expect_err("zero-width surface");
    assert!(matches!(err, BindingError::Engine(_)));
    assert_eq!(binding.phase(), LifecyclePhase::Deferred);

    binding.update(&props(), Some(&surface())).expect("retry");
    assert_eq!(binding.phase(), LifecyclePhase::Mounted);
}

#[test]
fn dropping_a_mounted_binding_destroys_the_instance() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let id = binding.instance_id().expect("instance id");
    let log = binding.engine().event_log();
    let handle = binding.instance().expect("instance");

    drop(binding);

    assert!(!handle.is_live());
    assert!(log.borrow().contains(&EngineEvent::Destroyed { instance: id }));
}

#[test]
fn engine_events_follow_lifecycle_order() {
    let mut binding = binding_with_slot(ReferenceSlot::Detached);
    binding.mount(&props(), Some(&surface())).expect("mount");
    let first = binding.instance_id().expect("first");
    binding.update(&props(), Some(&surface())).expect("update");
    binding
        .update(&props().with_redraw(true), Some(&surface()))
        .expect("redraw");
    let second = binding.instance_id().expect("second");
    binding.unmount().expect("unmount");

    assert_eq!(
        binding.engine().events(),
        vec![
            EngineEvent::Created { instance: first },
            EngineEvent::Updated { instance: first },
            EngineEvent::Destroyed { instance: first },
            EngineEvent::Created { instance: second },
            EngineEvent::Destroyed { instance: second },
        ]
    );
}
