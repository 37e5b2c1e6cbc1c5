use thiserror::Error;

/// Failure reported by an observer while handling an update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observer '{observer}' failed: {message}")]
pub struct ObserverError {
    pub observer: String,
    pub message: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self { observer: observer.into(), message: message.into() }
    }
}

/// Receiver of updates published by a [`Subject`](crate::subject::Subject).
///
/// `data` is `None` when the subject is notified before it has ever recorded
/// a value; implementations decide what "no data yet" means for them.
/// Observers are shared through `Rc`, so any cached state needs interior
/// mutability.
pub trait Observer<T> {
    fn update(&self, data: Option<&T>) -> Result<(), ObserverError>;

    /// Label used in diagnostics.
    fn name(&self) -> &str {
        "observer"
    }
}
