use std::sync::RwLock;

use tracing::debug;

/// Row mutation kinds surfaced to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableChange {
    pub table: String,
    pub op: ChangeOp,
}

type Listener = Box<dyn Fn(&TableChange) + Send + Sync>;

/// In-process stand-in for the datastore's realtime change feed. Mutations
/// issued through the client fan out to registered listeners so cached views
/// can refresh opportunistically. Delivery is best-effort: a consumer that
/// misses a change still gets the truth on its next read.
pub struct ChangeHub {
    listeners: RwLock<Vec<Listener>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&TableChange) + Send + Sync + 'static,
    {
        self.listeners.write().unwrap().push(Box::new(listener));
    }

    pub fn publish(&self, change: TableChange) {
        debug!("Publishing change on table {} ({:?})", change.table, change.op);
        for listener in self.listeners.read().unwrap().iter() {
            listener(&change);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap().len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}
