//! 信道接入统计信息
//! Channel access statistics

use super::state::ChannelAccessState;
use crate::timer::Timestamp;

/// Counters kept by a channel access manager for external measurement.
///
/// 信道接入管理器为外部测量维护的计数器。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessStats {
    /// 收到的接入请求（含被去重的）
    /// Access requests received, including de-duplicated ones
    pub requests: u64,
    /// 因已有待定请求而忽略的请求
    /// Requests ignored because one was already pending
    pub duplicate_requests: u64,
    /// 发出的授权
    /// Grants issued
    pub grants: u64,
    /// 无需延迟或退避即服务的请求
    /// Requests served without defer or backoff
    pub immediate_grants: u64,
    /// 发出的预留信号
    /// Reservation signals started
    pub reservation_signals: u64,
    /// 因过期而丢弃的请求
    /// Requests dropped as stale
    pub stale_requests: u64,
    /// 退避被忙碌信道抢占的次数
    /// Backoffs preempted by a busy channel
    pub backoff_freezes: u64,
    /// 被采纳的反馈批次
    /// Feedback batches applied to the window
    pub feedback_applied: u64,
    /// 未匹配TXOP的反馈批次
    /// Feedback batches matched to no TXOP
    pub feedback_unattributed: u64,
    /// 匹配但为空的反馈批次
    /// Matched feedback batches with no ACK or NACK
    pub feedback_empty: u64,
    /// 窗口增长次数
    /// Window growths
    pub cw_growths: u64,
    /// 窗口重置次数
    /// Window resets
    pub cw_resets: u64,
    /// 被忽略的过期定时器
    /// Stale timer expirations ignored
    pub stale_timers: u64,
}

impl std::fmt::Display for AccessStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AccessStats {{ requests: {} ({} duplicate), grants: {} ({} immediate), reservations: {}, stale: {}, freezes: {}, feedback: {}/{}/{}, cw: +{}/-{}, stale timers: {} }}",
            self.requests,
            self.duplicate_requests,
            self.grants,
            self.immediate_grants,
            self.reservation_signals,
            self.stale_requests,
            self.backoff_freezes,
            self.feedback_applied,
            self.feedback_unattributed,
            self.feedback_empty,
            self.cw_growths,
            self.cw_resets,
            self.stale_timers
        )
    }
}

/// 信道接入管理器某一时刻的可观察状态
/// Observable state of a channel access manager at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub at: Timestamp,
    pub state: ChannelAccessState,
    pub contention_window: u32,
    pub backoff_slots: u32,
    pub drawn_backoff_slots: u32,
    pub last_busy_until: Timestamp,
    pub request_pending: bool,
    pub txop_history_len: usize,
    pub stats: AccessStats,
}
