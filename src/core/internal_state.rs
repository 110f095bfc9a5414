use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque per-series bookkeeping owned by the rendering engine.
///
/// The binding never builds or inspects this payload. It only clones the
/// handle when a dataset keeps its identity across render passes, so both
/// sides keep pointing at the same allocation.
#[derive(Clone)]
pub struct InternalState(Rc<dyn Any>);

impl InternalState {
    #[must_use]
    pub fn new<T: Any>(payload: T) -> Self {
        Self(Rc::new(payload))
    }

    /// Engine-side access to its own payload type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` when both handles name the same payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InternalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternalState({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for InternalState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
