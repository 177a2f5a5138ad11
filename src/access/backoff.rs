//! 退避计数器 - 随机退避时隙的抽取与倒计时
//! Backoff Counter - random slot draw and live countdown
//!
//! 职责：
//! - 每个接入周期抽取一次 [0, cw] 内的均匀随机时隙数
//! - 信道忙碌时冻结剩余时隙，空闲后恢复
//! - 记录本周期已消耗的时隙数

use crate::timer::Timestamp;
use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// 冻结退避的结果
/// Result of freezing a running backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeOutcome {
    /// 冻结前已消耗的时隙
    /// Slots consumed before the freeze
    pub consumed: u32,
    /// 冻结后剩余的时隙
    /// Slots left after the freeze
    pub remaining: u32,
}

/// Backoff slot counter of one access cycle.
///
/// `slots_remaining` only ever decreases between draws. It is zeroed when the
/// cycle ends (grant, reservation start, stale drop), never when the channel
/// goes busy: a busy channel freezes the count instead.
///
/// 一个接入周期的退避时隙计数器。
#[derive(Debug, Clone, Default)]
pub struct BackoffCounter {
    slots_remaining: u32,
    drawn_slots: u32,
    consumed_slots: u32,
    start_time: Option<Timestamp>,
}

impl BackoffCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a fresh slot count uniformly from `0..=cw`.
    ///
    /// 从 `0..=cw` 中均匀抽取新的时隙数。
    pub fn draw<R: Rng>(&mut self, rng: &mut R, cw: u32) -> u32 {
        let slots = rng.random_range(0..=cw);
        self.slots_remaining = slots;
        self.drawn_slots = slots;
        self.consumed_slots = 0;
        self.start_time = None;
        trace!(slots, cw, "Backoff drawn");
        slots
    }

    /// Marks the start of a countdown and returns how long it will run.
    ///
    /// 标记倒计时开始，并返回其持续时间。
    pub fn start(&mut self, now: Timestamp, slot_time: Duration) -> Duration {
        self.start_time = Some(now);
        slot_time.saturating_mul(self.slots_remaining)
    }

    /// Freezes a running countdown.
    ///
    /// Every whole or partial slot elapsed since [`start`](Self::start), less
    /// `overhead`, consumes one slot, never more than remain.
    ///
    /// 冻结正在运行的倒计时。自开始以来经过的每个完整或部分时隙消耗一个时隙。
    pub fn freeze(
        &mut self,
        now: Timestamp,
        overhead: Duration,
        slot_time: Duration,
    ) -> FreezeOutcome {
        let elapsed = self
            .start_time
            .take()
            .map(|start| now.saturating_sub(start).saturating_sub(overhead))
            .unwrap_or_default();
        let elapsed_slots = elapsed.as_nanos().div_ceil(slot_time.as_nanos().max(1));
        let consumed = u32::try_from(elapsed_slots)
            .unwrap_or(u32::MAX)
            .min(self.slots_remaining);
        self.slots_remaining -= consumed;
        self.consumed_slots += consumed;
        trace!(
            consumed,
            remaining = self.slots_remaining,
            ?elapsed,
            "Backoff frozen"
        );
        FreezeOutcome {
            consumed,
            remaining: self.slots_remaining,
        }
    }

    /// The countdown ran to zero.
    /// 倒计时已归零。
    pub fn complete(&mut self) {
        self.consumed_slots += self.slots_remaining;
        self.slots_remaining = 0;
        self.start_time = None;
    }

    /// Ends the cycle without counting the remainder as consumed.
    /// 结束周期，剩余时隙不计为已消耗。
    pub fn clear(&mut self) {
        self.slots_remaining = 0;
        self.start_time = None;
    }

    /// 剩余时隙
    /// Remaining slots
    pub fn slots_remaining(&self) -> u32 {
        self.slots_remaining
    }

    /// The most recent draw.
    /// 最近一次抽取的值。
    pub fn drawn_slots(&self) -> u32 {
        self.drawn_slots
    }

    /// 本周期已消耗的时隙
    /// Slots consumed in the current cycle
    pub fn consumed_slots(&self) -> u32 {
        self.consumed_slots
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const SLOT: Duration = Duration::from_micros(20);

    fn us(v: u64) -> Duration {
        Duration::from_micros(v)
    }

    fn counter_with(slots: u32) -> BackoffCounter {
        BackoffCounter {
            slots_remaining: slots,
            drawn_slots: slots,
            ..Default::default()
        }
    }

    #[test]
    fn test_draw_stays_within_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counter = BackoffCounter::new();
        for _ in 0..500 {
            let slots = counter.draw(&mut rng, 15);
            assert!(slots <= 15);
            assert_eq!(counter.slots_remaining(), slots);
            assert_eq!(counter.drawn_slots(), slots);
            assert_eq!(counter.consumed_slots(), 0);
        }
    }

    #[test]
    fn test_draw_with_zero_window_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut counter = BackoffCounter::new();
        assert_eq!(counter.draw(&mut rng, 0), 0);
    }

    #[test]
    fn test_start_reports_countdown_duration() {
        let mut counter = counter_with(5);
        assert_eq!(counter.start(us(100), SLOT), us(100));
        assert_eq!(counter.start_time(), Some(us(100)));
    }

    #[test]
    fn test_freeze_counts_partial_slots() {
        let mut counter = counter_with(10);
        counter.start(us(0), SLOT);

        // 45us = 2个完整时隙 + 1个部分时隙
        let outcome = counter.freeze(us(45), Duration::ZERO, SLOT);
        assert_eq!(
            outcome,
            FreezeOutcome {
                consumed: 3,
                remaining: 7
            }
        );
        assert_eq!(counter.start_time(), None);
    }

    #[test]
    fn test_freeze_at_start_consumes_nothing() {
        let mut counter = counter_with(4);
        counter.start(us(200), SLOT);
        let outcome = counter.freeze(us(200), Duration::ZERO, SLOT);
        assert_eq!(outcome.consumed, 0);
        assert_eq!(outcome.remaining, 4);
    }

    #[test]
    fn test_freeze_subtracts_overhead_without_underflow() {
        let mut counter = counter_with(6);
        counter.start(us(0), SLOT);
        let outcome = counter.freeze(us(30), us(44), SLOT);
        assert_eq!(outcome.consumed, 0);

        counter.start(us(100), SLOT);
        let outcome = counter.freeze(us(185), us(44), SLOT);
        // 85 - 44 = 41us -> 3 个时隙
        assert_eq!(outcome.consumed, 3);
        assert_eq!(outcome.remaining, 3);
    }

    #[test]
    fn test_freeze_never_consumes_more_than_remaining() {
        let mut counter = counter_with(2);
        counter.start(us(0), SLOT);
        let outcome = counter.freeze(us(1000), Duration::ZERO, SLOT);
        assert_eq!(outcome.consumed, 2);
        assert_eq!(outcome.remaining, 0);
    }

    #[test]
    fn test_consumed_slots_are_conserved_across_freeze() {
        let mut counter = counter_with(9);
        counter.start(us(0), SLOT);
        counter.freeze(us(61), Duration::ZERO, SLOT);
        counter.start(us(500), SLOT);
        counter.complete();
        assert_eq!(counter.consumed_slots(), 9);
        assert_eq!(counter.slots_remaining(), 0);
    }

    #[test]
    fn test_clear_drops_remaining_slots() {
        let mut counter = counter_with(3);
        counter.clear();
        assert_eq!(counter.slots_remaining(), 0);
        assert_eq!(counter.consumed_slots(), 0);
        assert_eq!(counter.drawn_slots(), 3);
    }
}
