//! Event resolver: forwards plugin events to the arena journal.
//!
//! Plugins report what they observed as `Event` outputs.
//! The `EventResolver` appends them to `next`'s journal in output order so
//! that observers see them alongside the notifications the other resolvers
//! raised. It does not touch entity state.

use tracing::trace;

use crate::arena::Arena;
use crate::output::{OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver that journals event outputs.
///
/// # Example
///
/// ```
/// use rocketpunch_core::resolver::{EventResolver, Resolver};
/// use rocketpunch_core::output::OutputKind;
///
/// let resolver = EventResolver::new();
/// assert_eq!(resolver.handles(), &[OutputKind::Event]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventResolver;

impl EventResolver {
    /// Creates a new event resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for EventResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            if let Some(notification) = envelope.output().as_event() {
                trace!(source = %envelope.source(), kind = ?notification.kind(), "plugin event");
                next.emit(notification.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::notify::Notification;
    use crate::output::Command;
    use crate::resolver::test_support::envelope;

    #[test]
    fn events_are_journaled_in_order() {
        let first = Notification::PunchLanded {
            source: EntityId::new(1),
            target: EntityId::new(2),
            damage: 25.0,
        };
        let second = Notification::PunchLanded {
            source: EntityId::new(3),
            target: EntityId::new(2),
            damage: 25.0,
        };
        let a = envelope(first.clone(), EntityId::new(1));
        let b = envelope(second.clone(), EntityId::new(3));

        let mut arena = Arena::new();
        let current = arena.clone();
        EventResolver::new().resolve(&[&a, &b], &current, &mut arena);

        assert_eq!(arena.take_events(), vec![first, second]);
    }

    #[test]
    fn non_events_are_ignored() {
        let cmd = envelope(
            Command::Explode {
                rocket: EntityId::new(1),
                target: EntityId::new(2),
            },
            EntityId::new(1),
        );
        let mut arena = Arena::new();
        let current = arena.clone();
        EventResolver::new().resolve(&[&cmd], &current, &mut arena);
        assert!(arena.pending_events().is_empty());
    }

    #[test]
    fn journaled_on_clients_too() {
        let event = Notification::PunchLanded {
            source: EntityId::new(1),
            target: EntityId::new(2),
            damage: 25.0,
        };
        let env = envelope(event, EntityId::new(1));
        let mut arena = Arena::new();
        arena.set_authoritative(false);
        let current = arena.clone();
        EventResolver::new().resolve(&[&env], &current, &mut arena);
        assert_eq!(arena.pending_events().len(), 1);
    }
}
