/**
 * Per-Board Publish Ordering
 *
 * The store numbers commits on a board while the commit is exclusive, but
 * the tasks that made them may reach the broadcaster in any order once the
 * store lock is released. `PublishQueue` holds a committed result back until
 * every lower-numbered commit on the same board has been delivered, then
 * releases the whole run in commit order.
 *
 * # Invariant
 *
 * Every number the store hands out must be offered exactly once. The
 * broadcaster has no await point between a commit returning and its
 * `release` call, so a cancelled connection task cannot leave a gap.
 */
use crate::shared::ids::BoardId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

struct BoardQueue<T> {
    next: u64,
    held: BTreeMap<u64, T>,
}

impl<T> Default for BoardQueue<T> {
    fn default() -> Self {
        Self {
            next: 1,
            held: BTreeMap::new(),
        }
    }
}

/// Reorders committed results into per-board commit order
pub struct PublishQueue<T> {
    boards: Mutex<HashMap<BoardId, BoardQueue<T>>>,
}

impl<T> Default for PublishQueue<T> {
    fn default() -> Self {
        Self {
            boards: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> PublishQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BoardId, BoardQueue<T>>> {
        self.boards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Offer commit `sequence` of `board_id`
    ///
    /// `deliver` runs, under the queue lock, for this item and for every held
    /// item it unblocks, in commit order. Returns what `deliver` returned for
    /// this item, or `None` while it waits for an earlier commit.
    pub fn release<R>(
        &self,
        board_id: &BoardId,
        sequence: u64,
        item: T,
        mut deliver: impl FnMut(T) -> R,
    ) -> Option<R> {
        let mut boards = self.lock();
        let queue = boards.entry(board_id.clone()).or_default();

        if sequence < queue.next {
            tracing::warn!(
                "[Broadcast] Commit {} on board {} arrived after {}; delivering out of order",
                sequence,
                board_id,
                queue.next
            );
            return Some(deliver(item));
        }

        queue.held.insert(sequence, item);
        if sequence > queue.next {
            tracing::debug!(
                "[Broadcast] Holding commit {} on board {} until {} is published",
                sequence,
                board_id,
                queue.next
            );
            return None;
        }

        let mut own = None;
        while let Some(item) = queue.held.remove(&queue.next) {
            let result = deliver(item);
            if queue.next == sequence {
                own = Some(result);
            }
            queue.next += 1;
        }
        own
    }
}
