//! 定时器设施模块
//! Timer Facility Module
//!
//! 信道接入状态机通过此接口调度和取消定时器。调度器由外部注入，
//! 状态机只持有它自己发出的定时器句柄。
//!
//! The channel access state machine schedules and cancels its timers through
//! this interface. The scheduler is injected from outside; the state machine
//! only holds the handles it was issued.

mod entry;
mod queue;
mod stats;

#[cfg(test)]
mod tests;

pub use entry::TimerEntry;
pub use queue::TimerQueue;
pub use stats::TimerQueueStats;

use std::fmt;
use std::time::Duration;

/// A point in simulated time, measured from the simulation epoch.
/// 模拟时间中的一个时间点，从模拟纪元开始计量。
pub type Timestamp = Duration;

/// Identifies one scheduled timer. Handles are never reused by a facility.
/// 标识一个已调度的定时器。设施不会重复使用句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The purpose a timer was scheduled for.
/// 定时器的调度用途。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The mandatory idle defer period has elapsed.
    /// 强制空闲延迟期已结束。
    Defer,
    /// The backoff countdown has reached zero.
    /// 退避倒计时已归零。
    Backoff,
    /// The most recently known busy period may have ended.
    /// 最近已知的忙碌期可能已结束。
    BusyEnd,
    /// A reservation signal has played long enough to issue the grant.
    /// 预留信号已播放足够长时间，可以发出授权。
    ReservationComplete,
}

/// A scheduler that can fire a callback after a delay and cancel it again.
///
/// Firing is reported back to the state machine as
/// [`AccessEvent::TimerExpired`](crate::access::AccessEvent::TimerExpired)
/// carrying the kind and handle returned here. Cancelling a handle guarantees
/// that it will never be reported.
///
/// 可以在延迟后触发回调并能取消回调的调度器。
pub trait TimerFacility {
    /// Current simulated time.
    /// 当前模拟时间。
    fn now(&self) -> Timestamp;

    /// Schedules a timer of `kind` to fire `delay` from now.
    /// 调度一个在 `delay` 之后触发的 `kind` 定时器。
    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle;

    /// Cancels a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    /// 取消一个待定的定时器。若已触发或已取消则返回 `false`。
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}
