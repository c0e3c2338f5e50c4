//! Pending-Operation Queue
//!
//! Append-only FIFO of unconfirmed mutations with optional journal durability.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::journal::{Journal, JournalSnapshot};
use super::operation::{DeadLetter, NewOperation, OperationKind, PendingOperation};
use crate::error::{OfflineError, Result};

#[derive(Debug, Clone)]
struct QueueState {
    next_seq: u64,
    operations: BTreeMap<u64, PendingOperation>,
    dead_letters: Vec<DeadLetter>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            next_seq: 1,
            operations: BTreeMap::new(),
            dead_letters: Vec::new(),
        }
    }
}

impl QueueState {
    fn from_snapshot(snapshot: JournalSnapshot) -> Self {
        let operations: BTreeMap<u64, PendingOperation> = snapshot
            .operations
            .into_iter()
            .map(|op| (op.id, op))
            .collect();
        let highest = operations
            .keys()
            .next_back()
            .copied()
            .into_iter()
            .chain(snapshot.dead_letters.iter().map(|d| d.operation.id))
            .max()
            .unwrap_or(0);

        Self {
            next_seq: snapshot.next_seq.max(highest + 1),
            operations,
            dead_letters: snapshot.dead_letters,
        }
    }

    fn to_snapshot(&self) -> JournalSnapshot {
        JournalSnapshot {
            format: 1,
            next_seq: self.next_seq,
            operations: self.operations.values().cloned().collect(),
            dead_letters: self.dead_letters.clone(),
        }
    }

    fn push(&mut self, op: NewOperation) -> PendingOperation {
        let pending = PendingOperation {
            id: self.next_seq,
            kind: op.kind,
            payload: op.payload,
            resource_id: op.resource_id,
            created_at: Utc::now(),
        };
        self.next_seq += 1;
        self.operations.insert(pending.id, pending.clone());
        pending
    }
}

// == Pending Queue ==
/// Queue of mutations awaiting confirmed replay.
///
/// Shared as `Arc<PendingQueue>` between application code and the sync
/// coordinator. Every mutation is committed as a whole: with a journal, the new
/// state is persisted before it becomes visible.
#[derive(Debug)]
pub struct PendingQueue {
    state: RwLock<QueueState>,
    journal: Option<Journal>,
    /// Maximum number of pending operations
    capacity: usize,
}

impl PendingQueue {
    // == Constructors ==
    /// Creates a queue that lives only in memory.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            state: RwLock::new(QueueState::default()),
            journal: None,
            capacity,
        }
    }

    /// Opens a journaled queue, restoring whatever the journal holds.
    pub async fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let journal = Journal::new(path);
        let state = match journal.load().await? {
            Some(snapshot) => QueueState::from_snapshot(snapshot),
            None => QueueState::default(),
        };
        info!(
            "Pending queue restored from {}: {} operations",
            journal.path().display(),
            state.operations.len()
        );

        Ok(Self {
            state: RwLock::new(state),
            journal: Some(journal),
            capacity,
        })
    }

    async fn commit<T>(&self, mutate: impl FnOnce(&mut QueueState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().await;
        match &self.journal {
            Some(journal) => {
                let mut next = state.clone();
                let out = mutate(&mut next)?;
                journal.write(&next.to_snapshot()).await?;
                *state = next;
                Ok(out)
            }
            None => mutate(&mut *state),
        }
    }

    // == Enqueue ==
    /// Appends an operation with the next sequence number.
    ///
    /// Fails with `QueueFull` at capacity; see [`PendingQueue::shed_oldest`].
    pub async fn enqueue(&self, op: NewOperation) -> Result<PendingOperation> {
        op.validate()?;
        let capacity = self.capacity;
        let pending = self
            .commit(|state| {
                if state.operations.len() >= capacity {
                    return Err(OfflineError::QueueFull(format!(
                        "{} operations pending",
                        state.operations.len()
                    )));
                }
                Ok(state.push(op))
            })
            .await?;

        debug!("Enqueued {} #{}", pending.kind, pending.id);
        Ok(pending)
    }

    // == Shed Oldest ==
    /// Drops the oldest operation of `kind` to make room.
    pub async fn shed_oldest(&self, kind: OperationKind) -> Result<Option<PendingOperation>> {
        let shed = self
            .commit(|state| {
                let id = state
                    .operations
                    .values()
                    .find(|op| op.kind == kind)
                    .map(|op| op.id);
                Ok(id.and_then(|id| state.operations.remove(&id)))
            })
            .await?;

        if let Some(op) = &shed {
            warn!("Queue full: dropped {} #{}", op.kind, op.id);
        }
        Ok(shed)
    }

    // == Remove ==
    /// Deletes one operation. Returns whether it was present; removing an
    /// absent id is not an error.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        if !self.state.read().await.operations.contains_key(&id) {
            return Ok(false);
        }
        let removed = self
            .commit(|state| Ok(state.operations.remove(&id).is_some()))
            .await?;
        if removed {
            debug!("Removed operation #{}", id);
        }
        Ok(removed)
    }

    // == Drain ==
    /// Returns a lazy FIFO cursor over operations of `kind` (all kinds when `None`).
    ///
    /// Each step reads the live queue, so removals and appends made while
    /// draining are observed.
    pub fn drain(self: &Arc<Self>, kind: Option<OperationKind>) -> Drain {
        Drain {
            queue: Arc::clone(self),
            kind,
            cursor: 0,
        }
    }

    // == Dead Letters ==
    /// Moves an operation to the dead-letter list.
    ///
    /// The list holds at most `capacity` letters; the oldest is dropped first.
    pub async fn dead_letter(&self, id: u64, attempts: u32, last_error: &str) -> Result<bool> {
        let capacity = self.capacity;
        let moved = self
            .commit(|state| {
                Ok(match state.operations.remove(&id) {
                    Some(operation) => {
                        state.dead_letters.push(DeadLetter {
                            operation,
                            attempts,
                            last_error: last_error.to_string(),
                            failed_at: Utc::now(),
                        });
                        if state.dead_letters.len() > capacity {
                            let dropped = state.dead_letters.remove(0);
                            warn!("Dead-letter list full: discarded #{}", dropped.operation.id);
                        }
                        true
                    }
                    None => false,
                })
            })
            .await?;

        if moved {
            warn!("Operation #{} dead-lettered after {} attempts: {}", id, attempts, last_error);
        }
        Ok(moved)
    }

    /// Puts a dead-lettered operation back at the tail of the queue with a new id.
    pub async fn requeue_dead_letter(&self, id: u64) -> Result<PendingOperation> {
        let capacity = self.capacity;
        self.commit(|state| {
            let index = state
                .dead_letters
                .iter()
                .position(|d| d.operation.id == id)
                .ok_or_else(|| OfflineError::NotFound(format!("dead letter #{}", id)))?;
            if state.operations.len() >= capacity {
                return Err(OfflineError::QueueFull(format!(
                    "{} operations pending",
                    state.operations.len()
                )));
            }
            let letter = state.dead_letters.remove(index);
            let op = letter.operation;
            Ok(state.push(NewOperation {
                kind: op.kind,
                payload: op.payload,
                resource_id: op.resource_id,
            }))
        })
        .await
    }

    /// Deletes a dead letter for good. Returns whether it was present.
    pub async fn discard_dead_letter(&self, id: u64) -> Result<bool> {
        let discarded = self
            .commit(|state| {
                let before = state.dead_letters.len();
                state.dead_letters.retain(|d| d.operation.id != id);
                Ok(state.dead_letters.len() != before)
            })
            .await?;
        if discarded {
            debug!("Discarded dead letter #{}", id);
        }
        Ok(discarded)
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.read().await.dead_letters.clone()
    }

    // == Introspection ==
    pub async fn get(&self, id: u64) -> Option<PendingOperation> {
        self.state.read().await.operations.get(&id).cloned()
    }

    /// Current operations in FIFO order.
    pub async fn snapshot(&self, kind: Option<OperationKind>) -> Vec<PendingOperation> {
        self.state
            .read()
            .await
            .operations
            .values()
            .filter(|op| kind.map_or(true, |k| op.kind == k))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.operations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn len_by_kind(&self) -> HashMap<OperationKind, usize> {
        let state = self.state.read().await;
        let mut counts: HashMap<OperationKind, usize> =
            OperationKind::ALL.iter().map(|k| (*k, 0)).collect();
        for op in state.operations.values() {
            *counts.entry(op.kind).or_default() += 1;
        }
        counts
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// == Drain ==
/// Restartable FIFO cursor returned by [`PendingQueue::drain`].
#[derive(Debug)]
pub struct Drain {
    queue: Arc<PendingQueue>,
    kind: Option<OperationKind>,
    /// Last yielded sequence number
    cursor: u64,
}

impl Drain {
    /// Next operation after the last one yielded, or `None` at the end.
    pub async fn next(&mut self) -> Option<PendingOperation> {
        let state = self.queue.state.read().await;
        let next = state
            .operations
            .range((Bound::Excluded(self.cursor), Bound::Unbounded))
            .map(|(_, op)| op)
            .find(|op| self.kind.map_or(true, |k| op.kind == k))
            .cloned();

        if let Some(op) = &next {
            self.cursor = op.id;
        }
        next
    }

    /// Collects the remaining operations.
    pub async fn collect(mut self) -> Vec<PendingOperation> {
        let mut out = Vec::new();
        while let Some(op) = self.next().await {
            out.push(op);
        }
        out
    }
}
