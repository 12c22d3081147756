//! Synchronous publish/subscribe fan-out of game lifecycle events.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::arbiter::Capture;
use crate::command::CommandKind;
use crate::game::GameOutcome;
use crate::types::{Cell, PieceCode, PieceId};

/// Lifecycle events published by the game loop. `at` is game time in ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        at: u64,
        pieces: usize,
    },
    /// A player command changed a piece's state.
    MoveAccepted {
        at: u64,
        piece: PieceId,
        code: PieceCode,
        kind: CommandKind,
        from: Cell,
        to: Cell,
    },
    PieceCaptured {
        at: u64,
        capture: Capture,
    },
    GameEnded {
        at: u64,
        outcome: GameOutcome,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::MoveAccepted { .. } => EventKind::MoveAccepted,
            Self::PieceCaptured { .. } => EventKind::PieceCaptured,
            Self::GameEnded { .. } => EventKind::GameEnded,
        }
    }

    pub fn at(&self) -> u64 {
        match self {
            Self::GameStarted { at, .. }
            | Self::MoveAccepted { at, .. }
            | Self::PieceCaptured { at, .. }
            | Self::GameEnded { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    GameStarted,
    GameEnded,
    MoveAccepted,
    PieceCaptured,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::GameStarted,
        Self::GameEnded,
        Self::MoveAccepted,
        Self::PieceCaptured,
    ];
}

/// Receives published events. Must return promptly: delivery is synchronous
/// on the tick path.
pub trait Subscriber {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> Subscriber for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// A subscriber the caller can keep reading (a scoreboard, say) while the
/// bus owns a clone of it.
#[derive(Debug, Default)]
pub struct Shared<S>(Arc<Mutex<S>>);

impl<S> Shared<S> {
    pub fn new(inner: S) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    /// Run `f` against the current subscriber state.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        match self.0.lock() {
            Ok(inner) => f(&inner),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl<S> Clone for Shared<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S: Subscriber> Subscriber for Shared<S> {
    fn on_event(&mut self, event: &GameEvent) {
        match self.0.lock() {
            Ok(mut inner) => inner.on_event(event),
            Err(poisoned) => poisoned.into_inner().on_event(event),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interest {
    Kind(EventKind),
    All,
}

impl Interest {
    fn matches(self, kind: EventKind) -> bool {
        match self {
            Self::Kind(k) => k == kind,
            Self::All => true,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    interest: Interest,
    subscriber: Box<dyn Subscriber + Send>,
}

/// Event fan-out keyed by [`EventKind`]. Subscribers run in subscription
/// order, once per published event.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        subscriber: impl Subscriber + Send + 'static,
    ) -> SubscriptionId {
        self.add(Interest::Kind(kind), Box::new(subscriber))
    }

    /// Register one subscriber for every event kind.
    pub fn subscribe_all(&mut self, subscriber: impl Subscriber + Send + 'static) -> SubscriptionId {
        self.add(Interest::All, Box::new(subscriber))
    }

    fn add(&mut self, interest: Interest, subscriber: Box<dyn Subscriber + Send>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            interest,
            subscriber,
        });
        id
    }

    /// Returns false if the id was not (or no longer) subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver `event` to every interested subscriber. Returns how many
    /// received it.
    pub fn publish(&mut self, event: &GameEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.interest.matches(kind))
        {
            sub.subscriber.on_event(event);
            delivered += 1;
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
