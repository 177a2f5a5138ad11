//! 确定性定时器队列实现
//! Deterministic timer queue implementation
//!
//! 该模块实现了一个基于模拟时钟的定时器设施。定时器按到期时间排序，
//! 到期时间相同的定时器按调度顺序触发。时钟只在驱动者推进时前进。
//!
//! This module implements a timer facility over a simulated clock. Timers are
//! ordered by expiry; timers with the same expiry fire in scheduling order. The
//! clock only moves when the driver advances it.

use super::{
    TimerEntry, TimerFacility, TimerHandle, TimerKind, Timestamp, stats::TimerQueueStats,
};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::trace;

/// 基于模拟时钟的定时器队列
/// Timer queue over a simulated clock
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// 当前模拟时间
    /// Current simulated time
    now: Timestamp,
    /// 按 (到期时间, 句柄) 排序的待定定时器
    /// Pending timers ordered by (expiry, handle)
    pending: BTreeMap<(Timestamp, TimerHandle), TimerKind>,
    /// 句柄到到期时间的映射，用于快速取消
    /// Handle to expiry mapping for fast cancellation
    index: HashMap<TimerHandle, Timestamp>,
    /// 下一个分配的句柄
    /// Next handle to allocate
    next_handle: u64,
    stats: TimerQueueStats,
}

impl TimerQueue {
    /// 创建时钟位于纪元的定时器队列
    /// Create a timer queue whose clock sits at the epoch
    pub fn new() -> Self {
        Self::starting_at(Timestamp::ZERO)
    }

    /// 创建时钟位于给定时间的定时器队列
    /// Create a timer queue whose clock starts at `now`
    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            now,
            next_handle: 1,
            ..Default::default()
        }
    }

    /// Removes and returns the earliest timer due at or before `until`, moving
    /// the clock to its expiry.
    ///
    /// 移除并返回在 `until` 或之前到期的最早定时器，并将时钟移动到其到期时间。
    pub fn pop_due(&mut self, until: Timestamp) -> Option<TimerEntry> {
        let (&(expiry_time, handle), _) = self.pending.first_key_value()?;
        if expiry_time > until {
            return None;
        }
        let kind = self.pending.remove(&(expiry_time, handle))?;
        self.index.remove(&handle);
        self.now = self.now.max(expiry_time);
        self.stats.fired += 1;
        trace!(%handle, ?kind, at = ?expiry_time, "Timer fired");
        Some(TimerEntry::new(handle, expiry_time, kind))
    }

    /// Moves the clock forward to `until` without firing anything. Timers due
    /// before `until` should be drained with [`pop_due`](Self::pop_due) first.
    ///
    /// 将时钟推进到 `until`，不触发任何定时器。
    pub fn advance_to(&mut self, until: Timestamp) {
        self.now = self.now.max(until);
    }

    /// 获取下次到期时间
    /// Get the next expiry time
    pub fn next_expiry(&self) -> Option<Timestamp> {
        self.pending.first_key_value().map(|(&(expiry, _), _)| expiry)
    }

    /// Whether `handle` is still waiting to fire.
    /// `handle` 是否仍在等待触发。
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// 待定定时器数
    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending timers of one kind, in firing order.
    /// 某一用途的待定定时器，按触发顺序排列。
    pub fn pending_of(&self, kind: TimerKind) -> Vec<TimerEntry> {
        self.pending
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(&(expiry, handle), &k)| TimerEntry::new(handle, expiry, k))
            .collect()
    }

    /// 获取统计信息
    /// Get statistics
    pub fn stats(&self) -> TimerQueueStats {
        TimerQueueStats {
            pending_timers: self.pending.len(),
            now: self.now,
            ..self.stats.clone()
        }
    }
}

impl TimerFacility for TimerQueue {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let expiry_time = self.now.saturating_add(delay);
        self.pending.insert((expiry_time, handle), kind);
        self.index.insert(handle, expiry_time);
        self.stats.scheduled += 1;
        trace!(%handle, ?kind, delay = ?delay, at = ?expiry_time, "Timer scheduled");
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(expiry_time) = self.index.remove(&handle) else {
            return false;
        };
        self.pending.remove(&(expiry_time, handle));
        self.stats.cancelled += 1;
        trace!(%handle, "Timer cancelled");
        true
    }
}
