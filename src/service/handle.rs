//! The user-facing handle of a running channel access service.

use super::command::ServiceCommand;
use crate::{
    access::{AccessEvent, AccessSnapshot, BusySource, FeedbackBatch, FeedbackOutcome},
    error::{Error, Result},
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A handle to a channel access actor. Cheap to clone; the actor stops once
/// every handle is dropped or [`shutdown`](Self::shutdown) is called.
///
/// 信道接入actor的句柄。克隆开销低；所有句柄被丢弃或调用 `shutdown` 后actor停止。
#[derive(Debug, Clone)]
pub struct ChannelAccessHandle {
    command_tx: mpsc::Sender<ServiceCommand>,
}

impl ChannelAccessHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<ServiceCommand>) -> Self {
        Self { command_tx }
    }

    /// Asks for the channel. Grants arrive on the command receiver.
    ///
    /// 请求信道。授权将在命令接收端到达。
    pub async fn request_access(&self) -> Result<()> {
        self.send_event(AccessEvent::RequestAccess).await
    }

    pub async fn notify_channel_busy(&self, source: BusySource, duration: Duration) -> Result<()> {
        self.send_event(AccessEvent::ChannelBusy { source, duration })
            .await
    }

    pub async fn notify_channel_idle(&self) -> Result<()> {
        self.send_event(AccessEvent::ChannelIdleConfirm).await
    }

    pub async fn notify_reservation_signal_sent(&self, duration: Duration) -> Result<()> {
        self.send_event(AccessEvent::ReservationSignalSent { duration })
            .await
    }

    /// Delivers HARQ feedback and waits for what it did to the window.
    ///
    /// 交付HARQ反馈，并等待其对竞争窗口的影响。
    pub async fn deliver_feedback(&self, batch: FeedbackBatch) -> Result<FeedbackOutcome> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceCommand::Feedback { batch, response_tx })
            .await?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// 获取状态快照
    /// Get a state snapshot
    pub async fn snapshot(&self) -> Result<AccessSnapshot> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceCommand::Snapshot { response_tx }).await?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Stops the actor and returns its final snapshot.
    ///
    /// 停止actor并返回其最终快照。
    pub async fn shutdown(&self) -> Result<AccessSnapshot> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceCommand::Shutdown { response_tx }).await?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    async fn send_event(&self, event: AccessEvent) -> Result<()> {
        self.send(ServiceCommand::Event(event)).await
    }

    async fn send(&self, command: ServiceCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| Error::ChannelClosed)
    }
}
