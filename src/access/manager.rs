//! 信道接入状态机 - 先听后说接入控制的核心
//! Channel Access State Machine - the core of listen-before-talk access control
//!
//! 职责：
//! - 消费忙碌/空闲通知和接入请求
//! - 通过注入的定时器设施调度延迟、退避和忙碌结束定时器
//! - 在信道空闲足够长时发出授权，并记录到TXOP历史
//! - 根据延迟的HARQ反馈调整竞争窗口

use super::{
    backoff::BackoffCounter,
    contention::ContentionWindow,
    event::{AccessCommand, AccessCommandSink, AccessEvent},
    feedback::{FeedbackBatch, FeedbackOutcome},
    ledger::TxopHistoryLedger,
    policy::{BusySource, ChannelSenseMode, PhyDirective},
    state::ChannelAccessState,
    stats::{AccessSnapshot, AccessStats},
};
use crate::{
    config::Config,
    error::Result,
    timer::{TimerFacility, TimerHandle, TimerKind, TimerQueue, Timestamp},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// The single outstanding access request.
/// 唯一的待定接入请求。
#[derive(Debug, Clone, Copy, Default)]
struct AccessRequest {
    pending: bool,
    start_time: Timestamp,
}

/// Handles of the timers the machine currently owns, at most one per kind.
/// 状态机当前持有的定时器句柄，每种最多一个。
#[derive(Debug, Default)]
struct PendingTimers {
    defer: Option<TimerHandle>,
    backoff: Option<TimerHandle>,
    busy_end: Option<TimerHandle>,
    reservation: Option<TimerHandle>,
}

impl PendingTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Defer => &mut self.defer,
            TimerKind::Backoff => &mut self.backoff,
            TimerKind::BusyEnd => &mut self.busy_end,
            TimerKind::ReservationComplete => &mut self.reservation,
        }
    }

    fn get(&self, kind: TimerKind) -> Option<TimerHandle> {
        match kind {
            TimerKind::Defer => self.defer,
            TimerKind::Backoff => self.backoff,
            TimerKind::BusyEnd => self.busy_end,
            TimerKind::ReservationComplete => self.reservation,
        }
    }
}

/// The listen-before-talk channel access manager.
///
/// Driven one event at a time through [`handle_event`](Self::handle_event).
/// Timers go through the injected `T`, commands out through `S`, and backoff
/// draws come from `R`.
///
/// 先听后说信道接入管理器。每次通过 `handle_event` 处理一个事件。
pub struct ChannelAccessManager<T, S, R = StdRng> {
    config: Config,
    sense_mode: ChannelSenseMode,
    timer: T,
    sink: S,
    rng: R,
    state: ChannelAccessState,
    contention_window: ContentionWindow,
    backoff: BackoffCounter,
    ledger: TxopHistoryLedger,
    request: AccessRequest,
    last_busy_until: Timestamp,
    timers: PendingTimers,
    stats: AccessStats,
}

impl<T: TimerFacility, S: AccessCommandSink> ChannelAccessManager<T, S, StdRng> {
    /// Creates a manager whose backoff draws are reproducible from `seed`.
    ///
    /// 创建一个退避抽取可由 `seed` 复现的管理器。
    pub fn from_seed(config: Config, timer: T, sink: S, seed: u64) -> Result<Self> {
        Self::new(config, timer, sink, StdRng::seed_from_u64(seed))
    }
}

impl<T: TimerFacility, S: AccessCommandSink, R: Rng> ChannelAccessManager<T, S, R> {
    /// Validates `config` and attaches to the sensing layer by dispatching the
    /// [`PhyDirective`] the sense mode calls for.
    ///
    /// 验证配置，并通过发送感知模式所需的 `PhyDirective` 接入感知层。
    pub fn new(config: Config, timer: T, mut sink: S, rng: R) -> Result<Self> {
        config.validate()?;
        let sense_mode = config.sensing.sense_mode;
        let directive = PhyDirective::from_config(&config.sensing);
        info!(
            mode = %sense_mode,
            decode_foreign_signals = directive.decode_foreign_signals,
            ed_threshold_dbm = directive.energy_detection_threshold_dbm,
            "Attaching channel access manager"
        );
        sink.dispatch(AccessCommand::ConfigurePhy(directive));

        Ok(Self {
            contention_window: ContentionWindow::new(&config.contention),
            config,
            sense_mode,
            timer,
            sink,
            rng,
            state: ChannelAccessState::Idle,
            backoff: BackoffCounter::new(),
            ledger: TxopHistoryLedger::new(),
            request: AccessRequest::default(),
            last_busy_until: Timestamp::ZERO,
            timers: PendingTimers::default(),
            stats: AccessStats::default(),
        })
    }

    /// Single entry point for every inbound notification.
    ///
    /// 所有入站通知的唯一入口。
    pub fn handle_event(&mut self, event: AccessEvent) {
        match event {
            AccessEvent::RequestAccess => self.request_access(),
            AccessEvent::ChannelBusy { source, duration } => {
                self.notify_channel_busy(source, duration)
            }
            AccessEvent::ChannelIdleConfirm => self.notify_channel_idle(),
            AccessEvent::ReservationSignalSent { duration } => {
                self.notify_reservation_signal_sent(duration)
            }
            AccessEvent::Feedback(batch) => {
                self.deliver_feedback(&batch);
            }
            AccessEvent::TimerExpired { kind, handle } => self.on_timer_expired(kind, handle),
        }
    }

    /// The transmitter wants the channel.
    ///
    /// 发射机请求信道。
    pub fn request_access(&mut self) {
        self.stats.requests += 1;
        if self.request.pending {
            self.stats.duplicate_requests += 1;
            debug!(state = %self.state, "Already waiting to grant access; ignoring request");
            return;
        }

        let now = self.now();
        let defer_time = self.config.timing.defer_time;
        self.request.start_time = now;
        self.request.pending = true;

        if now
            .checked_sub(self.last_busy_until)
            .is_some_and(|idle| idle >= defer_time)
        {
            debug!("Already waited more than defer period since last busy period");
            self.stats.immediate_grants += 1;
            if self.sense_mode.uses_reservation_signal() {
                self.backoff.clear();
                let duration = self
                    .config
                    .timing
                    .txop_duration
                    .saturating_sub(self.config.timing.reservation_guard);
                let lead = self.config.timing.reservation_startup_delay;
                self.start_reservation(duration, lead);
            } else {
                self.grant();
            }
            return;
        }

        let cw = self.contention_window.value();
        let slots = self.backoff.draw(&mut self.rng, cw);
        debug!(slots, cw, "New backoff count");

        match self.state {
            ChannelAccessState::Idle | ChannelAccessState::TxopGranted
                if self.last_busy_until <= now =>
            {
                let defer_remaining = defer_time - (now - self.last_busy_until);
                debug!(?defer_remaining, "Must wait remaining defer period");
                self.schedule_timer(TimerKind::Defer, defer_remaining);
                self.state = ChannelAccessState::WaitForDefer;
            }
            ChannelAccessState::Idle | ChannelAccessState::TxopGranted => {
                // The busy period is still running.
                let until = self.last_busy_until;
                self.enter_busy(now, until);
            }
            ChannelAccessState::Busy => {
                let remaining = self.last_busy_until.saturating_sub(now);
                debug!(?remaining, "Access requested while channel busy");
                self.transition_to_busy(remaining);
            }
            state @ (ChannelAccessState::WaitForDefer | ChannelAccessState::WaitForBackoff) => {
                panic!("access cycle running in state {state} without a pending request")
            }
        }
    }

    /// A busy indication from the sensing layer. Ignored if the sense mode does
    /// not count `source` as busy.
    ///
    /// 来自感知层的忙碌指示。若感知模式不把 `source` 视为忙碌则忽略。
    pub fn notify_channel_busy(&mut self, source: BusySource, duration: Duration) {
        if !self.sense_mode.counts_as_busy(source) {
            trace!(?source, mode = %self.sense_mode, "Busy indication ignored by sense mode");
            return;
        }
        self.transition_to_busy(duration);
    }

    /// A reception ended. The channel may still be busy, so nothing changes.
    ///
    /// 一次接收结束。信道可能仍然忙碌，因此不做任何改变。
    pub fn notify_channel_idle(&mut self) {
        trace!(state = %self.state, "Reception ended; may be busy still");
    }

    /// The sensing layer confirms our reservation signal is on air.
    ///
    /// 感知层确认我们的预留信号已发射。
    pub fn notify_reservation_signal_sent(&mut self, duration: Duration) {
        if self.timers.reservation.is_some() {
            debug!(?duration, "Reservation signal on air");
        } else {
            warn!(?duration, state = %self.state, "Reservation signal confirmed but none was requested");
        }
    }

    /// Attributes a feedback batch to a TXOP and adapts the contention window.
    ///
    /// 将反馈批次归属到某个TXOP，并调整竞争窗口。
    pub fn deliver_feedback(&mut self, batch: &FeedbackBatch) -> FeedbackOutcome {
        let now = self.now();
        let Some(txop_start) = self
            .ledger
            .attribute(now, self.config.feedback.harq_feedback_delay)
        else {
            self.stats.feedback_unattributed += 1;
            debug!(
                at = ?now,
                history = self.ledger.len(),
                "Feedback ignored: no TXOP it could belong to"
            );
            return FeedbackOutcome::Unattributed;
        };

        let summary = batch.summarize();
        if summary.is_empty() {
            self.stats.feedback_empty += 1;
            debug!(?txop_start, "HARQ feedback empty");
            return FeedbackOutcome::Empty;
        }

        let rule = self.config.contention.update_rule;
        let update = if rule.should_grow(&summary) {
            self.stats.cw_growths += 1;
            self.contention_window.grow()
        } else {
            self.stats.cw_resets += 1;
            self.contention_window.reset()
        };
        self.stats.feedback_applied += 1;
        debug!(
            ?txop_start,
            acks = summary.acks,
            nacks = summary.nacks,
            %rule,
            cw = update.current,
            "Feedback considered"
        );
        FeedbackOutcome::Applied(update)
    }

    /// A timer fired. Expirations of handles the machine no longer owns are
    /// ignored.
    ///
    /// 定时器触发。状态机不再持有的句柄的到期将被忽略。
    pub fn on_timer_expired(&mut self, kind: TimerKind, handle: TimerHandle) {
        let slot = self.timers.slot(kind);
        if *slot != Some(handle) {
            self.stats.stale_timers += 1;
            debug!(?kind, %handle, "Ignoring stale timer");
            return;
        }
        *slot = None;

        match kind {
            TimerKind::Defer => self.on_defer_expired(),
            TimerKind::Backoff => self.on_backoff_expired(),
            TimerKind::BusyEnd => self.on_busy_end(),
            TimerKind::ReservationComplete => self.on_reservation_complete(),
        }
    }

    fn transition_to_busy(&mut self, duration: Duration) {
        let now = self.now();
        let until = now.saturating_add(duration);
        match self.state {
            ChannelAccessState::Idle => {
                assert_eq!(
                    self.backoff.slots_remaining(),
                    0,
                    "was idle but backoff count nonzero"
                );
                self.enter_busy(now, until);
            }
            ChannelAccessState::TxopGranted => self.enter_busy(now, until),
            ChannelAccessState::Busy => {
                if until > self.last_busy_until {
                    self.last_busy_until = until;
                    debug!(until = ?until, "Update last busy time");
                }
                // A request may have come in since we went busy.
                if self.timers.busy_end.is_none()
                    && self.request.pending
                    && self.timers.reservation.is_none()
                {
                    self.schedule_busy_end(now);
                }
            }
            ChannelAccessState::WaitForDefer => {
                debug!("TransitionToBusy from WAIT_FOR_DEFER");
                self.cancel_timer(TimerKind::Backoff);
                self.cancel_timer(TimerKind::Defer);
                self.enter_busy(now, until);
            }
            ChannelAccessState::WaitForBackoff => {
                self.cancel_timer(TimerKind::Backoff);
                let overhead = if self.sense_mode.uses_reservation_signal() {
                    self.config.timing.reservation_airtime
                } else {
                    Duration::ZERO
                };
                let outcome = self
                    .backoff
                    .freeze(now, overhead, self.config.timing.slot_time);
                self.stats.backoff_freezes += 1;
                debug!(
                    consumed = outcome.consumed,
                    remaining = outcome.remaining,
                    "Suspend backoff"
                );
                self.enter_busy(now, until);
            }
        }
    }

    fn enter_busy(&mut self, now: Timestamp, until: Timestamp) {
        self.last_busy_until = self.last_busy_until.max(until);
        self.schedule_busy_end(now);
        self.state = ChannelAccessState::Busy;
    }

    fn schedule_busy_end(&mut self, now: Timestamp) {
        let remaining = self.last_busy_until.saturating_sub(now);
        debug!(until = ?self.last_busy_until, "Going busy");
        self.schedule_timer(TimerKind::BusyEnd, remaining);
    }

    fn on_busy_end(&mut self) {
        if self.state != ChannelAccessState::Busy {
            warn!(state = %self.state, "Busy period ended outside BUSY");
            return;
        }
        let now = self.now();
        if self.last_busy_until > now {
            trace!(until = ?self.last_busy_until, "Must wait additional busy period");
            self.schedule_busy_end(now);
        } else if self.request.pending {
            if self.timers.reservation.is_some() {
                return;
            }
            debug!(defer = ?self.config.timing.defer_time, "Scheduling defer period");
            self.schedule_timer(TimerKind::Defer, self.config.timing.defer_time);
            self.state = ChannelAccessState::WaitForDefer;
        } else {
            self.enter_idle();
        }
    }

    fn on_defer_expired(&mut self) {
        // Defer and backoff never run together.
        self.cancel_timer(TimerKind::Backoff);

        if self.state != ChannelAccessState::WaitForDefer {
            warn!(state = %self.state, "Defer expired while not deferring");
            if self.request.pending {
                self.schedule_timer(TimerKind::Defer, self.config.timing.defer_time);
                self.state = ChannelAccessState::WaitForDefer;
            }
            return;
        }

        let now = self.now();
        let timing = &self.config.timing;
        if self.backoff.slots_remaining() == 0 {
            debug!("Defer succeeded, backoff count already zero");
            if self.sense_mode.uses_reservation_signal() {
                let duration = timing
                    .txop_duration
                    .saturating_sub(timing.defer_time)
                    .saturating_sub(timing.reservation_guard);
                let lead = timing.reservation_airtime;
                self.start_reservation(duration, lead);
            } else {
                self.grant();
            }
        } else {
            let countdown = self.backoff.start(now, timing.slot_time);
            debug!(
                slots = self.backoff.slots_remaining(),
                ?countdown,
                "Defer succeeded, scheduling backoff"
            );
            self.schedule_timer(TimerKind::Backoff, countdown);
            self.state = ChannelAccessState::WaitForBackoff;
        }
    }

    fn on_backoff_expired(&mut self) {
        assert_eq!(
            self.state,
            ChannelAccessState::WaitForBackoff,
            "backoff expired outside WAIT_FOR_BACKOFF"
        );
        self.backoff.complete();

        if !self.sense_mode.uses_reservation_signal() {
            self.grant();
            return;
        }
        let now = self.now();
        match self.reservation_window(now) {
            Some(duration) => {
                let lead = self.config.timing.reservation_airtime;
                self.start_reservation(duration, lead);
            }
            None => self.drop_stale_request(now),
        }
    }

    fn on_reservation_complete(&mut self) {
        if self.state != ChannelAccessState::Busy {
            warn!(state = %self.state, "Reservation completed outside BUSY");
        }
        self.grant();
    }

    /// Length of the reservation signal that holds the channel until the next
    /// TXOP boundary, or `None` if the request is stale.
    fn reservation_window(&self, now: Timestamp) -> Option<Duration> {
        let timing = &self.config.timing;
        if now.saturating_sub(self.request.start_time) >= timing.txop_duration {
            return None;
        }
        let boundary =
            align_down(now, timing.subframe_duration).saturating_add(timing.txop_duration);
        boundary
            .checked_sub(now)?
            .checked_sub(timing.reservation_guard)
            .filter(|duration| !duration.is_zero())
    }

    fn start_reservation(&mut self, duration: Duration, lead: Duration) {
        self.backoff.clear();
        self.sink
            .dispatch(AccessCommand::SendReservationSignal { duration });
        self.schedule_timer(TimerKind::ReservationComplete, lead);
        self.state = ChannelAccessState::Busy;
        self.stats.reservation_signals += 1;
        debug!(?duration, ?lead, "Scheduling for reservation signal");
    }

    fn drop_stale_request(&mut self, now: Timestamp) {
        info!(
            requested_at = ?self.request.start_time,
            at = ?now,
            "Request was older than TXOP duration: rejecting the request"
        );
        self.backoff.clear();
        self.request.pending = false;
        self.stats.stale_requests += 1;
        self.enter_idle();
    }

    fn enter_idle(&mut self) {
        assert_eq!(
            self.backoff.slots_remaining(),
            0,
            "entering IDLE with a nonzero backoff count"
        );
        self.state = ChannelAccessState::Idle;
    }

    fn grant(&mut self) {
        let now = self.now();
        let duration = self.config.timing.txop_duration;
        self.state = ChannelAccessState::TxopGranted;
        self.sink.dispatch(AccessCommand::Grant {
            start: now,
            duration,
        });
        self.request.pending = false;
        self.backoff.clear();
        let purged = self
            .ledger
            .record(now, self.config.feedback.harq_feedback_expiration);
        self.stats.grants += 1;
        info!(at = ?now, txop = ?duration, purged, "Granting access");
    }

    fn schedule_timer(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel_timer(kind);
        let handle = self.timer.schedule(delay, kind);
        *self.timers.slot(kind) = Some(handle);
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(handle) = self.timers.slot(kind).take() {
            trace!(?kind, %handle, "Cancelling timer");
            self.timer.cancel(handle);
        }
    }

    fn now(&self) -> Timestamp {
        self.timer.now()
    }

    /// 当前状态
    /// Current state
    pub fn state(&self) -> ChannelAccessState {
        self.state
    }

    /// Traced contention window value.
    /// 被跟踪的竞争窗口值。
    pub fn contention_window(&self) -> u32 {
        self.contention_window.value()
    }

    /// Backoff slots still to count down in the current cycle.
    /// 当前周期仍需倒数的退避时隙。
    pub fn backoff_slots(&self) -> u32 {
        self.backoff.slots_remaining()
    }

    /// The most recent backoff draw.
    /// 最近一次退避抽取值。
    pub fn drawn_backoff_slots(&self) -> u32 {
        self.backoff.drawn_slots()
    }

    /// Slots counted down so far in the current cycle.
    /// 当前周期已倒数的时隙。
    pub fn consumed_backoff_slots(&self) -> u32 {
        self.backoff.consumed_slots()
    }

    /// End of the latest known busy period.
    /// 最近已知忙碌期的结束时间。
    pub fn last_busy_until(&self) -> Timestamp {
        self.last_busy_until
    }

    /// Whether a request is waiting for its grant.
    /// 是否有请求正在等待授权。
    pub fn is_request_pending(&self) -> bool {
        self.request.pending
    }

    /// Granted TXOPs still awaiting feedback.
    /// 仍在等待反馈的已授予TXOP数。
    pub fn txop_history_len(&self) -> usize {
        self.ledger.len()
    }

    /// The handle of the timer of `kind` the machine currently owns.
    /// 状态机当前持有的 `kind` 定时器的句柄。
    pub fn pending_timer(&self, kind: TimerKind) -> Option<TimerHandle> {
        self.timers.get(kind)
    }

    /// 获取统计信息
    /// Get statistics
    pub fn stats(&self) -> &AccessStats {
        &self.stats
    }

    /// 获取状态快照
    /// Get a state snapshot
    pub fn snapshot(&self) -> AccessSnapshot {
        AccessSnapshot {
            at: self.now(),
            state: self.state,
            contention_window: self.contention_window.value(),
            backoff_slots: self.backoff.slots_remaining(),
            drawn_backoff_slots: self.backoff.drawn_slots(),
            last_busy_until: self.last_busy_until,
            request_pending: self.request.pending,
            txop_history_len: self.ledger.len(),
            stats: self.stats.clone(),
        }
    }

    /// 获取配置
    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The injected timer facility.
    /// 注入的定时器设施。
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutable access to the timer facility, for driving it from outside.
    /// 定时器设施的可变引用，用于从外部驱动。
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// The command sink.
    /// 命令接收端。
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the command sink.
    /// 命令接收端的可变引用。
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: AccessCommandSink, R: Rng> ChannelAccessManager<TimerQueue, S, R> {
    /// Fires every timer due at or before `until` in order, then moves the
    /// clock to `until`. Returns how many timers fired.
    ///
    /// 按顺序触发在 `until` 或之前到期的所有定时器，然后将时钟移动到 `until`。
    pub fn run_until(&mut self, until: Timestamp) -> usize {
        let mut fired = 0;
        while let Some(entry) = self.timer.pop_due(until) {
            self.on_timer_expired(entry.kind, entry.handle);
            fired += 1;
        }
        self.timer.advance_to(until);
        fired
    }

    /// Runs the clock forward by `duration`.
    /// 将时钟向前运行 `duration`。
    pub fn run_for(&mut self, duration: Duration) -> usize {
        let until = self.timer.now().saturating_add(duration);
        self.run_until(until)
    }

    /// Runs the clock to `at` and then handles `event`.
    /// 将时钟运行到 `at`，然后处理 `event`。
    pub fn handle_event_at(&mut self, at: Timestamp, event: AccessEvent) {
        self.run_until(at);
        self.handle_event(event);
    }
}

fn align_down(at: Timestamp, grid: Duration) -> Timestamp {
    let offset = at.as_nanos() % grid.as_nanos().max(1);
    u64::try_from(offset).map_or(at, |offset| at - Duration::from_nanos(offset))
}
