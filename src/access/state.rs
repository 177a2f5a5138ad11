//! Defines the channel access state of the listen-before-talk machine.
//!
//! 定义先听后说状态机的信道接入状态。

use std::fmt;

/// The state of the channel access machine.
/// 信道接入状态机的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelAccessState {
    /// No access cycle is running and the channel is not known to be busy.
    /// 没有运行中的接入周期，且信道未知为忙碌。
    #[default]
    Idle,

    /// Sensing the channel idle for the defer period.
    /// 正在感知信道空闲的延迟期。
    WaitForDefer,

    /// Counting down backoff slots.
    /// 正在倒数退避时隙。
    WaitForBackoff,

    /// The channel is busy, or a reservation signal is holding it for us.
    /// 信道忙碌，或预留信号正在为我们占用信道。
    Busy,

    /// The most recent access cycle ended with a grant.
    /// 最近的接入周期以授权结束。
    TxopGranted,
}

impl fmt::Display for ChannelAccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::WaitForDefer => "WAIT_FOR_DEFER",
            Self::WaitForBackoff => "WAIT_FOR_BACKOFF",
            Self::Busy => "BUSY",
            Self::TxopGranted => "TXOP_GRANTED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_access_state_traits() {
        let state1 = ChannelAccessState::default();
        let state2 = state1;
        assert_eq!(state1, ChannelAccessState::Idle);
        assert_eq!(state1, state2);
        assert_ne!(state1, ChannelAccessState::Busy);

        assert_eq!(format!("{:?}", ChannelAccessState::WaitForBackoff), "WaitForBackoff");
        assert_eq!(ChannelAccessState::TxopGranted.to_string(), "TXOP_GRANTED");
    }
}
