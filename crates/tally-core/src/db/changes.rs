//! Change notifications for reactive callers
//!
//! Every repository write publishes a `ChangeEvent` on a broadcast channel.
//! Dashboards and insights are never cached; a subscriber simply re-runs the
//! query it cares about when an event for a relevant table arrives.

use serde::Serialize;
use tokio::sync::broadcast;

use super::schema::Table;

/// Capacity for the change broadcast channel
const CHANNEL_CAPACITY: usize = 256;

/// What happened to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
    /// Whole table emptied (import, account deletion, cloud pull)
    Cleared,
}

/// A single write to the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    /// Row id; `None` for table-wide events
    pub id: Option<i64>,
}

/// Broadcaster shared by every clone of a `Database`
#[derive(Debug, Clone)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, table: Table, kind: ChangeKind, id: Option<i64>) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(ChangeEvent { table, kind, id });
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        feed.publish(Table::Expenses, ChangeKind::Inserted, Some(1));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_events_in_order() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish(Table::Incomes, ChangeKind::Inserted, Some(7));
        feed.publish(Table::Incomes, ChangeKind::Cleared, None);

        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent {
                table: Table::Incomes,
                kind: ChangeKind::Inserted,
                id: Some(7),
            }
        );
        assert_eq!(rx.try_recv().unwrap().kind, ChangeKind::Cleared);
        assert!(rx.try_recv().is_err());
    }
}
