//! 定时器队列条目
//! Timer queue entry

use super::{TimerHandle, TimerKind, Timestamp};

/// A timer that has come due in a [`TimerQueue`](super::TimerQueue).
/// 在定时器队列中到期的定时器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEntry {
    /// 条目句柄
    /// Entry handle
    pub handle: TimerHandle,
    /// 到期时间
    /// Expiration time
    pub expiry_time: Timestamp,
    /// 定时器用途
    /// Timer purpose
    pub kind: TimerKind,
}

impl TimerEntry {
    /// 创建新的定时器条目
    /// Create new timer entry
    pub fn new(handle: TimerHandle, expiry_time: Timestamp, kind: TimerKind) -> Self {
        Self {
            handle,
            expiry_time,
            kind,
        }
    }
}
