//! Listen-before-talk channel access: the state machine and its building blocks.
//! 先听后说信道接入：状态机及其组成部分。

pub mod backoff;
pub mod contention;
pub mod event;
pub mod feedback;
pub mod ledger;
pub mod manager;
pub mod policy;
pub mod state;
pub mod stats;

pub use contention::{ContentionWindow, ContentionWindowUpdate, ContentionWindowUpdateKind};
pub use event::{AccessCommand, AccessCommandSink, AccessEvent};
pub use feedback::{CwUpdateRule, FeedbackBatch, FeedbackElement, FeedbackOutcome, HarqStatus};
pub use manager::ChannelAccessManager;
pub use policy::{BusySource, ChannelSenseMode, PhyDirective};
pub use state::ChannelAccessState;
pub use stats::{AccessSnapshot, AccessStats};
