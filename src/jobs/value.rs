use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque payload produced by a job's work.
///
/// Shared rather than cloned so every waiter observes the same allocation.
pub type JobValue = Arc<dyn Any + Send + Sync>;

/// Wrap any `'static` value as a [`JobValue`].
pub fn into_value<T: Any + Send + Sync>(value: T) -> JobValue {
    Arc::new(value)
}

/// Borrow a payload as a concrete type, if it is one.
pub fn downcast_ref<T: Any>(value: &JobValue) -> Option<&T> {
    value.as_ref().downcast_ref::<T>()
}

/// Debug adapter that prints common payload types and falls back to a placeholder.
pub(crate) struct DebugValue<'a>(pub &'a JobValue);

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let any = self.0.as_ref();
        if let Some(v) = any.downcast_ref::<String>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<&str>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<i64>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<i32>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<u64>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<f64>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<bool>() {
            return write!(f, "{:?}", v);
        } else if let Some(v) = any.downcast_ref::<serde_json::Value>() {
            return write!(f, "{}", v);
        }

        write!(f, "<opaque>")
    }
}
