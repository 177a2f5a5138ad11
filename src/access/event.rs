//! 信道接入状态机的入站事件和出站命令
//! Inbound events and outbound commands of the channel access machine

use super::{
    feedback::FeedbackBatch,
    policy::{BusySource, PhyDirective},
};
use crate::timer::{TimerHandle, TimerKind, Timestamp};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Everything the state machine reacts to.
///
/// 状态机响应的所有事件。
#[derive(Debug, Clone, PartialEq)]
pub enum AccessEvent {
    /// The transmitter wants the channel. Idempotent while a request is pending.
    /// 发射机需要信道。请求待定期间幂等。
    RequestAccess,
    /// The sensing layer saw the channel busy for `duration`.
    /// 感知层观察到信道忙碌 `duration`。
    ChannelBusy {
        source: BusySource,
        duration: Duration,
    },
    /// A reception ended (successfully or not). The channel may still be busy.
    /// 一次接收结束（无论成功与否）。信道可能仍然忙碌。
    ChannelIdleConfirm,
    /// Our reservation signal went on air for `duration`.
    /// 我们的预留信号已发射 `duration`。
    ReservationSignalSent { duration: Duration },
    /// Delayed HARQ feedback.
    /// 延迟的HARQ反馈。
    Feedback(FeedbackBatch),
    /// A timer scheduled by the machine has fired.
    /// 状态机调度的定时器已触发。
    TimerExpired {
        kind: TimerKind,
        handle: TimerHandle,
    },
}

/// Everything the state machine asks its surroundings to do.
///
/// 状态机要求外部执行的所有操作。
#[derive(Debug, Clone, PartialEq)]
pub enum AccessCommand {
    /// Transmit for `duration` starting at `start`.
    /// 从 `start` 开始传输 `duration`。
    Grant {
        start: Timestamp,
        duration: Duration,
    },
    /// Put a channel-seizing reservation signal on air.
    /// 发射占用信道的预留信号。
    SendReservationSignal { duration: Duration },
    /// Configure the sensing and transmit layers.
    /// 配置感知层和发射层。
    ConfigurePhy(PhyDirective),
}

/// Consumer of the commands a state machine emits.
/// 状态机发出命令的消费者。
pub trait AccessCommandSink {
    fn dispatch(&mut self, command: AccessCommand);
}

impl AccessCommandSink for Vec<AccessCommand> {
    fn dispatch(&mut self, command: AccessCommand) {
        self.push(command);
    }
}

impl AccessCommandSink for mpsc::UnboundedSender<AccessCommand> {
    fn dispatch(&mut self, command: AccessCommand) {
        if let Err(e) = self.send(command) {
            warn!(command = ?e.0, "Command consumer has gone away, dropping command");
        }
    }
}

impl<S: AccessCommandSink + ?Sized> AccessCommandSink for &mut S {
    fn dispatch(&mut self, command: AccessCommand) {
        (**self).dispatch(command);
    }
}
