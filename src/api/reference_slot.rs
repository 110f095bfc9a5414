use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Read-only view of the live instance.
///
/// The binding keeps the only strong reference, so a handle taken before a
/// destruction reads as dead afterwards instead of exposing a stale instance.
pub struct InstanceRef<I> {
    inner: Weak<RefCell<I>>,
}

impl<I> InstanceRef<I> {
    pub(crate) fn new(instance: &Rc<RefCell<I>>) -> Self {
        Self {
            inner: Rc::downgrade(instance),
        }
    }

    /// Runs `f` against the instance while it is alive.
    ///
    /// Returns `None` once the instance was destroyed, or when called
    /// re-entrantly while the binding is writing into it.
    pub fn with<R>(&self, f: impl FnOnce(&I) -> R) -> Option<R> {
        let instance = self.inner.upgrade()?;
        let guard = instance.try_borrow().ok()?;
        Some(f(&guard))
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<I> Clone for InstanceRef<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<I> fmt::Debug for InstanceRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRef")
            .field("live", &self.is_live())
            .finish()
    }
}

/// Object-style slot the host keeps to observe the current instance.
///
/// Only the binding writes into it.
pub struct SlotHandle<I> {
    cell: Rc<RefCell<Option<InstanceRef<I>>>>,
}

impl<I> SlotHandle<I> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Rc::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<InstanceRef<I>> {
        self.cell.borrow().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell.borrow().is_none()
    }

    /// Shorthand for `get()` followed by [`InstanceRef::with`].
    pub fn with<R>(&self, f: impl FnOnce(&I) -> R) -> Option<R> {
        self.get()?.with(f)
    }

    fn set(&self, value: Option<InstanceRef<I>>) {
        *self.cell.borrow_mut() = value;
    }
}

impl<I> Default for SlotHandle<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Clone for SlotHandle<I> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<I> fmt::Debug for SlotHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHandle")
            .field("assigned", &!self.is_empty())
            .finish()
    }
}

type SlotCallback<I> = Box<dyn FnMut(Option<InstanceRef<I>>)>;

/// Where the binding publishes the current instance.
pub enum ReferenceSlot<I> {
    Detached,
    Callback(SlotCallback<I>),
    Object(SlotHandle<I>),
}

impl<I> ReferenceSlot<I> {
    pub fn callback(f: impl FnMut(Option<InstanceRef<I>>) + 'static) -> Self {
        Self::Callback(Box::new(f))
    }

    pub(crate) fn assign(&mut self, value: Option<InstanceRef<I>>) {
        match self {
            Self::Detached => {}
            Self::Callback(f) => f(value),
            Self::Object(handle) => handle.set(value),
        }
    }
}

impl<I> From<SlotHandle<I>> for ReferenceSlot<I> {
    fn from(value: SlotHandle<I>) -> Self {
        Self::Object(value)
    }
}

impl<I> fmt::Debug for ReferenceSlot<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("Detached"),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Object(handle) => f.debug_tuple("Object").field(handle).finish(),
        }
    }
}
