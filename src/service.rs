//! The tokio host: runs a channel access manager inside an actor task driven by
//! the tokio clock.
//! tokio宿主：在由tokio时钟驱动的actor任务中运行信道接入管理器。

mod actor;
pub mod command;
pub mod handle;

pub use command::ServiceCommand;
pub use handle::ChannelAccessHandle;

use crate::{
    access::{AccessCommand, ChannelAccessManager},
    config::Config,
    error::Result,
    timer::TimerQueue,
};
use actor::AccessActor;
use tokio::sync::mpsc;
use tracing::info;

/// Spawns a channel access actor on the current tokio runtime.
///
/// Returns the handle used to feed it events, and the receiver of the commands
/// it emits. The `ConfigurePhy` directive is the first command on the receiver.
///
/// 在当前tokio运行时上启动信道接入actor。返回用于输入事件的句柄以及其发出命令的接收端。
pub fn spawn(
    config: Config,
    seed: u64,
) -> Result<(ChannelAccessHandle, mpsc::UnboundedReceiver<AccessCommand>)> {
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let manager = ChannelAccessManager::from_seed(config, TimerQueue::new(), output_tx, seed)?;

    let (command_tx, command_rx) = mpsc::channel(128);
    let mut actor = AccessActor::new(manager, command_rx);
    tokio::spawn(async move {
        actor.run().await;
    });
    info!(seed, "Channel access service started");

    Ok((ChannelAccessHandle::new(command_tx), output_rx))
}
