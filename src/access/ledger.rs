//! TXOP历史账本 - 将延迟的HARQ反馈归属到对应的TXOP
//! TXOP History Ledger - attributes delayed HARQ feedback to its TXOP

use crate::timer::Timestamp;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Start times of granted TXOPs still awaiting feedback, oldest first.
///
/// 仍在等待反馈的已授予TXOP的开始时间，最旧的在前。
#[derive(Debug, Clone, Default)]
pub struct TxopHistoryLedger {
    entries: VecDeque<Timestamp>,
}

impl TxopHistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new TXOP start, first purging entries older than
    /// `start − expiration`.
    ///
    /// 记录新的TXOP开始时间，先清除早于 `start − expiration` 的条目。
    pub fn record(&mut self, start: Timestamp, expiration: Duration) -> usize {
        let purged = self.purge_expired(start, expiration);
        debug_assert!(
            self.entries.back().is_none_or(|last| *last <= start),
            "TXOP history must stay in grant order"
        );
        self.entries.push_back(start);
        purged
    }

    /// Drops head entries older than `now − expiration`. Returns how many were
    /// dropped.
    ///
    /// 删除早于 `now − expiration` 的头部条目，返回删除的数量。
    pub fn purge_expired(&mut self, now: Timestamp, expiration: Duration) -> usize {
        let Some(horizon) = now.checked_sub(expiration) else {
            return 0;
        };
        let before = self.entries.len();
        while self.entries.front().is_some_and(|start| *start < horizon) {
            self.entries.pop_front();
        }
        let purged = before - self.entries.len();
        if purged > 0 {
            trace!(purged, ?horizon, "Purged expired TXOP history");
        }
        purged
    }

    /// Finds the TXOP a feedback batch arriving at `now` describes.
    ///
    /// The batch belongs to the oldest entry `t` with `now − delay ≥ t`. That
    /// entry is removed so later feedback for the same TXOP is ignored.
    ///
    /// 查找在 `now` 到达的反馈批次所描述的TXOP。该条目被移除，
    /// 同一TXOP的后续反馈将被忽略。
    pub fn attribute(&mut self, now: Timestamp, delay: Duration) -> Option<Timestamp> {
        let cutoff = now.checked_sub(delay)?;
        let position = self.entries.iter().position(|start| *start <= cutoff)?;
        self.entries.remove(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按授予顺序遍历条目
    /// Iterate entries in grant order
    pub fn iter(&self) -> impl Iterator<Item = &Timestamp> {
        self.entries.iter()
    }
}
