//! Cooperative continuations
//!
//! Anything the match has to do "later" (after a delay, or once the camera has
//! finished moving) is parked here as a plain value of type `C` and handed back
//! to the match when it comes due. Nothing runs on its own.
//!
//! Every task is stamped with the epoch it was created in and a scope.
//! `cancel_all` starts a new epoch, so a task created before a reset can never
//! be returned after it.

use serde::{Deserialize, Serialize};

/// Handle to a pending task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    epoch: u64,
    seq: u64,
}

/// Lifetime a task is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Lives until the match is stopped or reset
    Match,
    /// Dropped when the current turn closes
    Turn,
}

/// External completion a task can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    CameraReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Wake {
    /// Due at this simulation tick
    At(u64),
    On(Signal),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task<C> {
    id: TaskId,
    scope: Scope,
    wake: Wake,
    cont: C,
}

/// Pending continuations, ordered by deadline then creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tasks<C> {
    epoch: u64,
    next_seq: u64,
    pending: Vec<Task<C>>,
}

impl<C> Default for Tasks<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Tasks<C> {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Sequence number the next task will get. Tasks created from here on
    /// compare greater than this watermark.
    #[inline]
    pub fn watermark(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn push(&mut self, scope: Scope, wake: Wake, cont: C) -> TaskId {
        let id = TaskId {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.push(Task {
            id,
            scope,
            wake,
            cont,
        });
        id
    }

    /// Run `cont` once `delay_ticks` have passed since `now`
    pub fn after(&mut self, now: u64, delay_ticks: u64, scope: Scope, cont: C) -> TaskId {
        self.push(scope, Wake::At(now + delay_ticks), cont)
    }

    /// Run `cont` the next time `signal` fires
    pub fn on_signal(&mut self, signal: Signal, scope: Scope, cont: C) -> TaskId {
        self.push(scope, Wake::On(signal), cont)
    }

    /// Drop one task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Drop every task bound to `scope`, returning how many were dropped
    pub fn cancel_scope(&mut self, scope: Scope) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.scope != scope);
        before - self.pending.len()
    }

    /// Drop everything and start a new epoch
    pub fn cancel_all(&mut self) {
        self.epoch += 1;
        self.pending.clear();
    }

    /// Take the earliest task due at or before `now`.
    ///
    /// Returns one at a time so that a continuation can cancel the ones
    /// behind it.
    pub fn pop_due(&mut self, now: u64) -> Option<C> {
        let epoch = self.epoch;
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.id.epoch == epoch)
            .filter_map(|(i, t)| match t.wake {
                Wake::At(due) if due <= now => Some((due, t.id.seq, i)),
                _ => None,
            })
            .min()
            .map(|(_, _, i)| i)?;
        Some(self.pending.remove(index).cont)
    }

    /// Take the oldest task waiting on `signal` that was created before
    /// `watermark`
    pub fn pop_signaled(&mut self, signal: Signal, watermark: u64) -> Option<C> {
        let epoch = self.epoch;
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.id.epoch == epoch && t.id.seq < watermark && t.wake == Wake::On(signal)
            })
            .min_by_key(|(_, t)| t.id.seq)
            .map(|(i, _)| i)?;
        Some(self.pending.remove(index).cont)
    }
}
