//! Commands sent to the channel access actor.

use crate::access::{AccessEvent, AccessSnapshot, FeedbackBatch, FeedbackOutcome};
use tokio::sync::oneshot;

/// Commands sent to the `AccessActor`.
///
/// 发送到 `AccessActor` 的命令。
#[derive(Debug)]
pub enum ServiceCommand {
    /// An event for the state machine, applied at the current tokio instant.
    /// 状态机事件，在当前tokio时刻应用。
    Event(AccessEvent),
    /// Feedback whose outcome the caller wants to see.
    /// 调用方需要得知结果的反馈。
    Feedback {
        batch: FeedbackBatch,
        response_tx: oneshot::Sender<FeedbackOutcome>,
    },
    /// 获取状态快照
    /// Get a state snapshot
    Snapshot {
        response_tx: oneshot::Sender<AccessSnapshot>,
    },
    /// Stop the actor. The final snapshot is sent back.
    /// 停止actor，并返回最终快照。
    Shutdown {
        response_tx: oneshot::Sender<AccessSnapshot>,
    },
}
