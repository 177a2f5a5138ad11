#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the listen-before-talk channel access library.
//! 先听后说信道接入库的根。
//!
//! [`access::ChannelAccessManager`] is the state machine. It is driven one
//! event at a time over an injected [`timer::TimerFacility`], and
//! [`service::spawn`] hosts it on a tokio task.

pub mod access;
pub mod config;
pub mod error;
pub mod service;
pub mod timer;

pub use access::{AccessCommand, AccessEvent, ChannelAccessManager};
pub use config::Config;
pub use error::{Error, Result};
