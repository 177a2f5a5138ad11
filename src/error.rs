//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use std::time::Duration;
use thiserror::Error;

/// The primary error type for the channel access library.
/// 信道接入库的主要错误类型。
///
/// Every variant except [`Error::ChannelClosed`] is a configuration error and is
/// reported when a manager is constructed, never while it is running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The configured TXOP lies outside the allowed range.
    /// 配置的TXOP超出允许范围。
    #[error("TXOP duration {txop:?} is outside the allowed range [{min:?}, {max:?}]")]
    TxopOutOfRange {
        txop: Duration,
        min: Duration,
        max: Duration,
    },

    /// `cw_min` is larger than `cw_max`.
    /// `cw_min` 大于 `cw_max`。
    #[error("contention window bounds are inverted: cw_min {cw_min} > cw_max {cw_max}")]
    InvalidContentionWindow { cw_min: u32, cw_max: u32 },

    /// The contention window growth factor must be at least 1.
    /// 竞争窗口增长因子必须至少为1。
    #[error("contention window factor must be at least 1")]
    InvalidCwFactor,

    /// A duration parameter that must be positive was zero.
    /// 必须为正的时长参数为零。
    #[error("`{field}` must be a non-zero duration")]
    ZeroDuration { field: &'static str },

    /// The reservation guard interval swallows the whole TXOP.
    /// 预留保护间隔吞掉了整个TXOP。
    #[error("reservation guard {guard:?} must be shorter than the TXOP {txop:?}")]
    GuardExceedsTxop { guard: Duration, txop: Duration },

    /// TXOP history would be purged before its feedback could ever arrive.
    /// TXOP历史会在其反馈到达前被清除。
    #[error(
        "HARQ feedback expiration {expiration:?} must not be shorter than the feedback delay {delay:?}"
    )]
    FeedbackExpiresBeforeDelay {
        delay: Duration,
        expiration: Duration,
    },

    /// A channel sense mode name could not be parsed.
    /// 无法解析的信道感知模式名称。
    #[error("unknown channel sense mode `{0}`")]
    UnknownSenseMode(String),

    /// A contention window update rule name could not be parsed.
    /// 无法解析的竞争窗口更新规则名称。
    #[error("unknown contention window update rule `{0}`")]
    UnknownCwUpdateRule(String),

    /// An internal channel for communication between tasks was closed unexpectedly.
    /// 用于任务间通信的内部通道意外关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
