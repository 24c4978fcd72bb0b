//! # Veto Points
//!
//! The host's event bus is modelled as "post, then check cancelled".
//! Handlers run synchronously inside the caller; there is no deferred
//! delivery and no asynchronous cancellation token.

/// An event that handlers may veto.
pub trait Cancellable {
    /// Returns true once any handler has vetoed the event.
    fn is_cancelled(&self) -> bool;

    /// Sets or clears the veto.
    fn set_cancelled(&mut self, cancelled: bool);
}

/// A synchronous event sink for events of type `E`.
///
/// Closures taking `&mut E` are buses too, which keeps test wiring short.
pub trait EventBus<E>: Send + Sync {
    /// Delivers the event to every handler.
    fn post(&self, event: &mut E);
}

impl<E, F> EventBus<E> for F
where
    F: Fn(&mut E) + Send + Sync,
{
    fn post(&self, event: &mut E) {
        self(event);
    }
}

/// Posts `event` and reports whether it survived (was *not* cancelled).
pub fn post_and_check<E, B>(bus: &B, event: &mut E) -> bool
where
    E: Cancellable,
    B: EventBus<E> + ?Sized,
{
    bus.post(event);
    !event.is_cancelled()
}

/// A bus with no handlers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBus;

impl<E> EventBus<E> for NoopBus {
    fn post(&self, _event: &mut E) {}
}
