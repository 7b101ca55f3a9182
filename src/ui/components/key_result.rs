/// Outcome of offering a key to a component.
///
/// Views try their components in order and stop at the first one that
/// doesn't answer `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent has to react to this event
  Event(T),
  NotHandled,
}
