//! Constructed values and deferred cells
//!
//! Values are type-erased and reference counted so one constructed value can
//! be shared by every goal that needs it. A [`Deferred`] cell stands in for a
//! value that is still being built; rules that can tolerate that hold it as a
//! typed [`Knot`].

use crate::error::ResolveError;
use crate::term::TypeTerm;
use std::any::{Any, TypeId};
use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// A constructed value of some Rust type
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Wrap an existing shared value without copying it
    pub fn from_rc<T: Any>(rc: Rc<T>) -> Self {
        Self {
            inner: rc,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Rust type of the wrapped value
    pub fn value_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.inner).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.inner
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(&other.inner) as *const ()
    }

    /// The deferred cell this value stands in for, if it is one
    pub fn as_deferred(&self) -> Option<&Deferred> {
        self.downcast_ref::<Deferred>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Value({} @ {:p})",
            self.type_name,
            Rc::as_ptr(&self.inner) as *const ()
        )
    }
}

/// Rust types that know their own type term
pub trait Described: Any {
    fn type_term() -> TypeTerm;
}

impl Described for String {
    fn type_term() -> TypeTerm {
        TypeTerm::con("String")
    }
}

impl Described for i64 {
    fn type_term() -> TypeTerm {
        TypeTerm::con("Int")
    }
}

impl Described for bool {
    fn type_term() -> TypeTerm {
        TypeTerm::con("Bool")
    }
}

/// Set-once slot for a value under construction
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct Deferred {
    slot: Rc<OnceCell<Value>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell that is already tied to `value`
    pub fn tied(value: Value) -> Self {
        let slot = OnceCell::new();
        let _ = slot.set(value);
        Self {
            slot: Rc::new(slot),
        }
    }

    pub fn get(&self) -> Option<Value> {
        self.slot.get().cloned()
    }

    pub fn is_tied(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Write the slot; fails if it was written before
    pub(crate) fn tie(&self, value: Value, goal: &TypeTerm) -> Result<(), ResolveError> {
        self.slot
            .set(value)
            .map_err(|_| ResolveError::KnotAlreadyTied { goal: goal.clone() })
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the content: it may point back at whatever holds us.
        if self.is_tied() {
            f.write_str("Deferred(tied)")
        } else {
            f.write_str("Deferred(pending)")
        }
    }
}

/// Typed handle to a possibly not-yet-built value
///
/// Rules that take part in cyclic construction store a `Knot` instead of
/// reading the argument eagerly. Reading it before the goal is complete is an
/// error, not a panic.
pub struct Knot<T> {
    cell: Deferred,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> Knot<T> {
    /// Knot over an argument value, pending or complete
    pub fn from_value(value: Value) -> Self {
        let cell = match value.as_deferred() {
            Some(cell) => cell.clone(),
            None => Deferred::tied(value),
        };
        Self {
            cell,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Result<Rc<T>, ResolveError> {
        let value = self.cell.get().ok_or(ResolveError::UnsetKnot {
            type_name: std::any::type_name::<T>(),
        })?;
        value.downcast::<T>().ok_or_else(|| ResolveError::KnotType {
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    pub fn is_tied(&self) -> bool {
        self.cell.is_tied()
    }
}

impl<T> Clone for Knot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Knot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Knot<{}>({:?})", std::any::type_name::<T>(), self.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty;

    #[test]
    fn test_downcast_and_identity() {
        let value = Value::new(String::from("hello"));
        assert!(value.is::<String>());
        assert_eq!(value.downcast::<String>().unwrap().as_str(), "hello");
        assert!(value.downcast::<i64>().is_none());

        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(!value.ptr_eq(&Value::new(String::from("hello"))));
        assert_eq!(value.value_type_id(), TypeId::of::<String>());
    }

    #[test]
    fn test_deferred_is_set_once() {
        let cell = Deferred::new();
        assert!(!cell.is_tied());

        cell.tie(Value::new(1i64), &ty!("Int")).unwrap();
        assert!(cell.is_tied());

        let err = cell.tie(Value::new(2i64), &ty!("Int")).unwrap_err();
        assert_eq!(err, ResolveError::KnotAlreadyTied { goal: ty!("Int") });
        assert_eq!(*cell.get().unwrap().downcast::<i64>().unwrap(), 1);
    }

    #[test]
    fn test_knot_over_pending_cell() {
        let cell = Deferred::new();
        let knot: Knot<i64> = Knot::from_value(Value::new(cell.clone()));

        assert!(matches!(knot.get(), Err(ResolveError::UnsetKnot { .. })));

        cell.tie(Value::new(7i64), &ty!("Int")).unwrap();
        assert_eq!(*knot.get().unwrap(), 7);
    }

    #[test]
    fn test_knot_over_complete_value() {
        let knot: Knot<String> = Knot::from_value(Value::new(String::from("done")));
        assert!(knot.is_tied());
        assert_eq!(knot.get().unwrap().as_str(), "done");
    }

    #[test]
    fn test_debug_does_not_follow_content() {
        let cell = Deferred::new();
        assert_eq!(format!("{:?}", cell), "Deferred(pending)");
        cell.tie(Value::new(()), &ty!("Unit")).unwrap();
        assert_eq!(format!("{:?}", cell), "Deferred(tied)");
    }
}
