//! 定义了信道接入管理器的可配置参数。
//! Defines configurable parameters for the channel access manager.

use crate::{
    access::{feedback::CwUpdateRule, policy::ChannelSenseMode},
    error::{Error, Result},
};
use std::time::Duration;

/// The smallest TXOP a manager accepts.
/// 管理器接受的最小TXOP。
pub const MIN_TXOP: Duration = Duration::from_millis(1);

/// The largest TXOP a manager accepts.
/// 管理器接受的最大TXOP。
pub const MAX_TXOP: Duration = Duration::from_millis(20);

/// A structure containing all configurable parameters of a channel access manager.
///
/// The configuration is set once at construction and never mutated afterwards.
///
/// 包含信道接入管理器所有可配置参数的结构体。构造时设置一次，之后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Slot, defer and TXOP timing parameters.
    /// 时隙、延迟和TXOP时序参数。
    pub timing: TimingConfig,

    /// Contention window parameters.
    /// 竞争窗口参数。
    pub contention: ContentionConfig,

    /// HARQ feedback parameters.
    /// HARQ反馈参数。
    pub feedback: FeedbackConfig,

    /// Channel sensing parameters.
    /// 信道感知参数。
    pub sensing: SensingConfig,
}

/// Slot, defer and TXOP timing parameters.
///
/// 时隙、延迟和TXOP时序参数。
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// The duration of one backoff slot.
    /// 一个退避时隙的时长。
    pub slot_time: Duration,
    /// The idle interval that must be sensed before any backoff may begin.
    /// 开始退避之前必须感知到的空闲间隔。
    pub defer_time: Duration,
    /// Duration of a granted transmission opportunity. Must lie in
    /// [`MIN_TXOP`, `MAX_TXOP`].
    /// 授予的传输机会时长。
    pub txop_duration: Duration,
    /// The grid TXOP boundaries are aligned to (one LTE subframe).
    /// TXOP边界对齐的时间网格（一个LTE子帧）。
    pub subframe_duration: Duration,
    /// Processing and propagation allowance subtracted from every reservation signal.
    /// 从每个预留信号中扣除的处理和传播余量。
    pub reservation_guard: Duration,
    /// Time from the start of a reservation signal after a defer or backoff
    /// until the grant is issued. Also subtracted from elapsed backoff time under
    /// reservation policies.
    /// 延迟或退避之后，从预留信号开始到发出授权的时间。
    pub reservation_airtime: Duration,
    /// Time from the start of a reservation signal on the immediate-access path
    /// until the grant is issued.
    /// 立即接入路径上，从预留信号开始到发出授权的时间。
    pub reservation_startup_delay: Duration,
}

/// Contention window parameters.
///
/// 竞争窗口参数。
#[derive(Debug, Clone, PartialEq)]
pub struct ContentionConfig {
    /// The minimum value of the contention window.
    /// 竞争窗口的最小值。
    pub cw_min: u32,
    /// The maximum value of the contention window. 63 for priority class 3,
    /// 1023 for priority class 4.
    /// 竞争窗口的最大值。
    pub cw_max: u32,
    /// Multiplication factor applied when the window grows.
    /// 窗口增长时的乘法因子。
    pub cw_factor: u32,
    /// Rule deciding whether a feedback batch grows or resets the window.
    /// 决定反馈批次使窗口增长还是重置的规则。
    pub update_rule: CwUpdateRule,
}

/// HARQ feedback parameters.
///
/// HARQ反馈参数。
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackConfig {
    /// Fixed delay between a TXOP start and the feedback describing it.
    /// TXOP开始与描述它的反馈之间的固定延迟。
    pub harq_feedback_delay: Duration,
    /// TXOPs older than this are dropped from the history on the next grant.
    /// 早于此时间的TXOP会在下一次授权时从历史中删除。
    pub harq_feedback_expiration: Duration,
}

/// Channel sensing parameters.
///
/// 信道感知参数。
#[derive(Debug, Clone, PartialEq)]
pub struct SensingConfig {
    /// Which notifications count as busy and whether a reservation signal precedes data.
    /// 哪些通知视为忙碌，以及数据之前是否发送预留信号。
    pub sense_mode: ChannelSenseMode,
    /// Forwarded to the transmitter: pad with a reservation signal when no data
    /// is ready at the start of a TXOP.
    /// 转发给发射机：TXOP开始时若无数据就绪，则用预留信号填充。
    pub use_reservation_signal: bool,
    /// Energy detection threshold handed to the sensing layer, in dBm.
    /// 交给感知层的能量检测门限（dBm）。
    pub energy_detection_threshold_dbm: f64,
}

impl Config {
    /// Checks every parameter, returning the first violation found.
    ///
    /// 检查所有参数，返回发现的第一个违规项。
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.contention.validate()?;
        self.feedback.validate()
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        if !(MIN_TXOP..=MAX_TXOP).contains(&self.txop_duration) {
            return Err(Error::TxopOutOfRange {
                txop: self.txop_duration,
                min: MIN_TXOP,
                max: MAX_TXOP,
            });
        }
        for (field, value) in [
            ("slot_time", self.slot_time),
            ("subframe_duration", self.subframe_duration),
        ] {
            if value.is_zero() {
                return Err(Error::ZeroDuration { field });
            }
        }
        if self.reservation_guard >= self.txop_duration {
            return Err(Error::GuardExceedsTxop {
                guard: self.reservation_guard,
                txop: self.txop_duration,
            });
        }
        Ok(())
    }
}

impl ContentionConfig {
    fn validate(&self) -> Result<()> {
        if self.cw_min > self.cw_max {
            return Err(Error::InvalidContentionWindow {
                cw_min: self.cw_min,
                cw_max: self.cw_max,
            });
        }
        if self.cw_factor == 0 {
            return Err(Error::InvalidCwFactor);
        }
        Ok(())
    }
}

impl FeedbackConfig {
    fn validate(&self) -> Result<()> {
        if self.harq_feedback_expiration < self.harq_feedback_delay {
            return Err(Error::FeedbackExpiresBeforeDelay {
                delay: self.harq_feedback_delay,
                expiration: self.harq_feedback_expiration,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            contention: ContentionConfig::default(),
            feedback: FeedbackConfig::default(),
            sensing: SensingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            slot_time: Duration::from_micros(20),
            defer_time: Duration::from_micros(43),
            txop_duration: Duration::from_millis(8),
            subframe_duration: Duration::from_millis(1),
            reservation_guard: Duration::from_micros(45),
            reservation_airtime: Duration::from_micros(44),
            reservation_startup_delay: Duration::from_micros(60),
        }
    }
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            cw_min: 15,
            cw_max: 1023,
            cw_factor: 2,
            update_rule: CwUpdateRule::Nacks80Percent,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            harq_feedback_delay: Duration::from_millis(5),
            harq_feedback_expiration: Duration::from_millis(100),
        }
    }
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            sense_mode: ChannelSenseMode::Ene,
            use_reservation_signal: true,
            energy_detection_threshold_dbm: -62.0,
        }
    }
}
