//! HARQ反馈与竞争窗口更新规则
//! HARQ feedback and contention window update rules
//!
//! 职责：
//! - 描述每个传输块的延迟ACK/NACK反馈
//! - 将反馈批次展平并统计NACK比例
//! - 根据配置的规则决定竞争窗口增长还是重置

use crate::{access::contention::ContentionWindowUpdate, error::Error};
use std::{fmt, str::FromStr};

/// Outcome reported for one transport block on one spatial layer.
/// 单个空间层上单个传输块的反馈结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarqStatus {
    Ack,
    Nack,
    /// Nothing was detected; carries no information about the channel.
    /// 未检测到任何内容；不携带信道信息。
    Dtx,
}

/// Feedback for one HARQ process, one status per spatial layer.
/// 一个HARQ进程的反馈，每个空间层一个状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackElement {
    pub harq_process_id: u8,
    pub statuses: Vec<HarqStatus>,
}

impl FeedbackElement {
    pub fn new(harq_process_id: u8, statuses: Vec<HarqStatus>) -> Self {
        Self {
            harq_process_id,
            statuses,
        }
    }
}

/// A batch of delayed acknowledgement feedback delivered at one instant.
///
/// 在同一时刻交付的一批延迟确认反馈。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackBatch {
    pub elements: Vec<FeedbackElement>,
}

impl FeedbackBatch {
    pub fn new(elements: Vec<FeedbackElement>) -> Self {
        Self { elements }
    }

    /// A batch with one single-layer element per status.
    /// 每个状态对应一个单层元素的批次。
    pub fn from_statuses(statuses: impl IntoIterator<Item = HarqStatus>) -> Self {
        let elements = statuses
            .into_iter()
            .enumerate()
            .map(|(id, status)| FeedbackElement::new((id % 256) as u8, vec![status]))
            .collect();
        Self { elements }
    }

    /// Flattens all layers into ACK / NACK counts. DTX is skipped.
    /// 将所有层展平为ACK / NACK计数，跳过DTX。
    pub fn summarize(&self) -> FeedbackSummary {
        self.elements
            .iter()
            .flat_map(|element| element.statuses.iter())
            .fold(FeedbackSummary::default(), |mut summary, status| {
                match status {
                    HarqStatus::Ack => summary.acks += 1,
                    HarqStatus::Nack => summary.nacks += 1,
                    HarqStatus::Dtx => {}
                }
                summary
            })
    }
}

/// ACK / NACK counts of a flattened batch.
/// 展平后批次的ACK / NACK计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub acks: u32,
    pub nacks: u32,
}

impl FeedbackSummary {
    pub fn total(&self) -> u32 {
        self.acks + self.nacks
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// 竞争窗口更新规则
/// Contention window update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CwUpdateRule {
    /// Grow when every outcome is a NACK.
    /// 所有结果都是NACK时增长。
    AllNacks,
    /// Grow on any NACK.
    /// 任一NACK即增长。
    AnyNack,
    /// Grow when at least 10% are NACKs.
    /// 至少10%为NACK时增长。
    Nacks10Percent,
    /// Grow when at least 80% are NACKs.
    /// 至少80%为NACK时增长。
    Nacks80Percent,
}

impl CwUpdateRule {
    /// Whether the window should grow for this batch. Integer arithmetic keeps
    /// the percentage thresholds exact.
    ///
    /// 此批次是否应使窗口增长。
    pub fn should_grow(self, summary: &FeedbackSummary) -> bool {
        let nacks = u64::from(summary.nacks);
        let total = u64::from(summary.total());
        if total == 0 {
            return false;
        }
        match self {
            Self::AllNacks => nacks == total,
            Self::AnyNack => nacks > 0,
            Self::Nacks10Percent => nacks * 10 >= total,
            Self::Nacks80Percent => nacks * 10 >= total * 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllNacks => "ALL_NACKS",
            Self::AnyNack => "ANY_NACK",
            Self::Nacks10Percent => "NACKS_10_PERCENT",
            Self::Nacks80Percent => "NACKS_80_PERCENT",
        }
    }
}

impl fmt::Display for CwUpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CwUpdateRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL_NACKS" | "ALL" => Ok(Self::AllNacks),
            "ANY_NACK" | "ANY" => Ok(Self::AnyNack),
            "NACKS_10_PERCENT" | "NACKS10" => Ok(Self::Nacks10Percent),
            "NACKS_80_PERCENT" | "NACKS80" => Ok(Self::Nacks80Percent),
            _ => Err(Error::UnknownCwUpdateRule(s.to_string())),
        }
    }
}

/// What delivering a feedback batch did to the contention window.
/// 交付反馈批次对竞争窗口的影响。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// No TXOP in the history matched; nothing changed.
    /// 历史中没有匹配的TXOP；无变化。
    Unattributed,
    /// Matched a TXOP but carried no ACK or NACK; nothing changed.
    /// 匹配到TXOP但没有ACK或NACK；无变化。
    Empty,
    /// The window was grown or reset.
    /// 窗口已增长或重置。
    Applied(ContentionWindowUpdate),
}
