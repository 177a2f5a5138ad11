//! 定时器队列统计信息
//! Timer queue statistics

use super::Timestamp;

/// 定时器队列统计信息
/// Timer queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerQueueStats {
    /// 当前待定的定时器数
    /// Number of pending timers
    pub pending_timers: usize,
    /// 累计调度的定时器数
    /// Total timers scheduled
    pub scheduled: u64,
    /// 累计取消的定时器数
    /// Total timers cancelled
    pub cancelled: u64,
    /// 累计触发的定时器数
    /// Total timers fired
    pub fired: u64,
    /// 当前模拟时间
    /// Current simulated time
    pub now: Timestamp,
}

impl std::fmt::Display for TimerQueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimerQueueStats {{ pending: {}, scheduled: {}, cancelled: {}, fired: {}, now: {:?} }}",
            self.pending_timers, self.scheduled, self.cancelled, self.fired, self.now
        )
    }
}
