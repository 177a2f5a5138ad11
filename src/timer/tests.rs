//! 定时器队列测试
//! Timer queue tests

use super::*;
use std::time::Duration;

fn us(v: u64) -> Duration {
    Duration::from_micros(v)
}

#[test]
fn test_queue_creation() {
    let queue = TimerQueue::new();
    assert_eq!(queue.now(), Timestamp::ZERO);
    assert!(queue.is_empty());
    assert!(queue.next_expiry().is_none());

    let queue = TimerQueue::starting_at(us(500));
    assert_eq!(queue.now(), us(500));
}

#[test]
fn test_schedule_allocates_fresh_handles() {
    let mut queue = TimerQueue::new();
    let a = queue.schedule(us(10), TimerKind::Defer);
    let b = queue.schedule(us(10), TimerKind::Backoff);
    assert_eq!(a, TimerHandle(1));
    assert_eq!(b, TimerHandle(2));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.next_expiry(), Some(us(10)));
}

#[test]
fn test_pop_due_orders_by_expiry_then_schedule_order() {
    let mut queue = TimerQueue::new();
    let late = queue.schedule(us(30), TimerKind::BusyEnd);
    let first = queue.schedule(us(10), TimerKind::Defer);
    let second = queue.schedule(us(10), TimerKind::Backoff);

    // 20us 之前只有两个定时器到期
    assert_eq!(queue.pop_due(us(20)).map(|e| e.handle), Some(first));
    assert_eq!(queue.now(), us(10));
    assert_eq!(queue.pop_due(us(20)).map(|e| e.handle), Some(second));
    assert!(queue.pop_due(us(20)).is_none());

    let entry = queue.pop_due(us(100));
    assert_eq!(
        entry,
        Some(TimerEntry::new(late, us(30), TimerKind::BusyEnd))
    );
    assert_eq!(queue.now(), us(30));
}

#[test]
fn test_cancel_timer() {
    let mut queue = TimerQueue::new();
    let handle = queue.schedule(us(50), TimerKind::Defer);
    assert!(queue.is_pending(handle));
    assert!(queue.cancel(handle));
    assert!(!queue.is_pending(handle));
    assert!(queue.is_empty());

    // 取消已取消或不存在的定时器
    assert!(!queue.cancel(handle));
    assert!(!queue.cancel(TimerHandle(999)));
    assert!(queue.pop_due(us(1000)).is_none());
}

#[test]
fn test_cancelled_timer_never_fires() {
    let mut queue = TimerQueue::new();
    let cancelled = queue.schedule(us(5), TimerKind::Backoff);
    let kept = queue.schedule(us(6), TimerKind::BusyEnd);
    queue.cancel(cancelled);
    assert_eq!(queue.pop_due(us(10)).map(|e| e.handle), Some(kept));
    assert!(queue.pop_due(us(10)).is_none());
}

#[test]
fn test_schedule_is_relative_to_current_clock() {
    let mut queue = TimerQueue::new();
    queue.advance_to(us(100));
    queue.schedule(us(20), TimerKind::Defer);
    assert_eq!(queue.next_expiry(), Some(us(120)));

    // 时钟不会后退
    queue.advance_to(us(50));
    assert_eq!(queue.now(), us(100));
}

#[test]
fn test_pending_of_filters_by_kind() {
    let mut queue = TimerQueue::new();
    queue.schedule(us(10), TimerKind::Defer);
    let busy = queue.schedule(us(20), TimerKind::BusyEnd);
    let pending = queue.pending_of(TimerKind::BusyEnd);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].handle, busy);
    assert_eq!(pending[0].expiry_time, us(20));
}

#[test]
fn test_queue_stats() {
    let mut queue = TimerQueue::new();
    let a = queue.schedule(us(10), TimerKind::Defer);
    queue.schedule(us(20), TimerKind::Backoff);
    queue.cancel(a);
    queue.pop_due(us(20));

    let stats = queue.stats();
    assert_eq!(stats.scheduled, 2);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.fired, 1);
    assert_eq!(stats.pending_timers, 0);
    assert_eq!(stats.now, us(20));
    assert!(stats.to_string().contains("fired: 1"));
}

#[test]
fn test_schedule_saturates_at_end_of_time() {
    let mut queue = TimerQueue::starting_at(us(10));
    let handle = queue.schedule(Duration::MAX, TimerKind::BusyEnd);

    assert_eq!(queue.next_expiry(), Some(Duration::MAX));
    assert!(queue.pop_due(us(1_000)).is_none());
    assert!(queue.is_pending(handle));
}
