//! Destination for change events

use crate::diff::ChangeEvent;
use std::convert::Infallible;

/// Anything that durably accepts change events one at a time.
///
/// An `append` that returns `Ok` must have fully recorded the event. Errors
/// are fatal to the caller; sinks do not retry internally.
pub trait EventSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record a single event
    fn append(&mut self, event: &ChangeEvent) -> Result<(), Self::Error>;
}

/// In-memory sink, mostly useful in tests
impl EventSink for Vec<ChangeEvent> {
    type Error = Infallible;

    fn append(&mut self, event: &ChangeEvent) -> Result<(), Self::Error> {
        self.push(event.clone());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    type Error = S::Error;

    fn append(&mut self, event: &ChangeEvent) -> Result<(), Self::Error> {
        (**self).append(event)
    }
}
