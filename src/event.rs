/// Change notifications.
///
/// `Event` is a synchronous multicast dispatcher: `notify` invokes every
/// subscribed handler in subscription order before returning. Handlers
/// receive the payload and a shared reference to the source, so they can
/// read from it but cannot mutate it while the notification is in flight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Payload of the row-count-changed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCountChanged {
    pub previous: usize,
    pub current: usize,
}

/// Payload of the rows-changed notification: changed row positions, ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsChanged {
    pub rows: Vec<usize>,
}

type Handler<A, S> = Box<dyn Fn(&A, &S)>;

/// A notification channel carrying payloads of type `A` from a source `S`.
pub struct Event<A, S> {
    handlers: Vec<(SubscriptionId, Handler<A, S>)>,
    next_id: SubscriptionId,
}

impl<A, S> Default for Event<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, S> Event<A, S> {
    pub fn new() -> Self {
        Event {
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    /// Subscribes a handler.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&A, &S) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _)| *sub_id != id);
        self.handlers.len() != before
    }

    /// Invoke every handler with `args`.
    pub fn notify(&self, args: &A, source: &S) {
        for (_, handler) in &self.handlers {
            handler(args, source);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A, S> fmt::Debug for Event<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
