//! The actor that owns a channel access manager and maps tokio time onto its
//! timer queue.
//!
//! 拥有信道接入管理器并将tokio时间映射到其定时器队列的actor。

use super::command::ServiceCommand;
use crate::{
    access::{AccessCommand, ChannelAccessManager},
    timer::{TimerQueue, Timestamp},
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, trace};

type HostedManager = ChannelAccessManager<TimerQueue, mpsc::UnboundedSender<AccessCommand>>;

/// Owns the manager. All events are serialised through its command channel.
///
/// 拥有管理器。所有事件通过其命令通道串行化。
pub(crate) struct AccessActor {
    manager: HostedManager,
    command_rx: mpsc::Receiver<ServiceCommand>,
    epoch: Instant,
}

impl AccessActor {
    pub(crate) fn new(manager: HostedManager, command_rx: mpsc::Receiver<ServiceCommand>) -> Self {
        Self {
            manager,
            command_rx,
            epoch: Instant::now(),
        }
    }

    /// Runs the actor's main event loop.
    ///
    /// 运行 actor 的主事件循环。
    pub(crate) async fn run(&mut self) {
        loop {
            let next_expiry = self.manager.timer().next_expiry();
            let deadline = self.deadline(next_expiry.unwrap_or(Timestamp::MAX));

            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else {
                        debug!("All handles dropped, stopping channel access actor");
                        break;
                    };
                    self.sync_clock();
                    if !self.handle_command(command) {
                        break;
                    }
                }
                _ = sleep_until(deadline), if next_expiry.is_some() => {
                    let fired = self.sync_clock();
                    trace!(fired, "Timers fired");
                }
            }
        }
        info!(stats = %self.manager.stats(), "Channel access actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle_command(&mut self, command: ServiceCommand) -> bool {
        match command {
            ServiceCommand::Event(event) => {
                self.manager.handle_event(event);
            }
            ServiceCommand::Feedback { batch, response_tx } => {
                let outcome = self.manager.deliver_feedback(&batch);
                let _ = response_tx.send(outcome);
            }
            ServiceCommand::Snapshot { response_tx } => {
                let _ = response_tx.send(self.manager.snapshot());
            }
            ServiceCommand::Shutdown { response_tx } => {
                let _ = response_tx.send(self.manager.snapshot());
                return false;
            }
        }
        true
    }

    /// Fires every timer due by the current tokio instant and moves the
    /// manager's clock there.
    fn sync_clock(&mut self) -> usize {
        self.manager.run_until(self.epoch.elapsed())
    }

    fn deadline(&self, at: Timestamp) -> Instant {
        // Cap far-away deadlines so the addition cannot overflow.
        let offset = at.min(Duration::from_secs(86_400 * 365));
        self.epoch + offset
    }
}
