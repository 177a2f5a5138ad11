//! 竞争窗口 - 退避抽取的上界
//! Contention Window - upper bound of the backoff draw
//!
//! 职责：
//! - 失败时按乘法因子增长窗口
//! - 成功时将窗口重置为最小值
//! - 保证窗口始终位于 [cw_min, cw_max] 内

use crate::config::ContentionConfig;
use tracing::debug;

/// 窗口更新的类型
/// Kind of window update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentionWindowUpdateKind {
    /// 失败后增长
    /// Grown after a failure
    Grew,
    /// 成功后重置
    /// Reset after a success
    Reset,
}

/// 窗口更新决策结果
/// Window update decision result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentionWindowUpdate {
    /// 更新前的窗口
    /// Window before the update
    pub previous: u32,
    /// 更新后的窗口
    /// Window after the update
    pub current: u32,
    pub kind: ContentionWindowUpdateKind,
}

impl ContentionWindowUpdate {
    /// Whether the update changed the window value.
    /// 更新是否改变了窗口值。
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// A bounded contention window with multiplicative growth on failure and reset
/// on success.
///
/// 有界竞争窗口：失败时乘法增长，成功时重置。
#[derive(Debug, Clone)]
pub struct ContentionWindow {
    value: u32,
    min: u32,
    max: u32,
    factor: u32,
}

impl ContentionWindow {
    /// Creates a window starting at `cw_min`.
    /// 创建一个从 `cw_min` 开始的窗口。
    pub fn new(config: &ContentionConfig) -> Self {
        Self {
            value: config.cw_min,
            min: config.cw_min,
            max: config.cw_max,
            factor: config.cw_factor,
        }
    }

    /// 获取当前窗口
    /// Get current window
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// `cw = min(factor × (cw + 1) − 1, cw_max)`
    pub fn grow(&mut self) -> ContentionWindowUpdate {
        let previous = self.value;
        let grown = self
            .factor
            .saturating_mul(previous.saturating_add(1))
            .saturating_sub(1);
        self.value = grown.clamp(self.min, self.max);
        debug!(from = previous, to = self.value, "CW grown");
        ContentionWindowUpdate {
            previous,
            current: self.value,
            kind: ContentionWindowUpdateKind::Grew,
        }
    }

    /// `cw = cw_min`
    pub fn reset(&mut self) -> ContentionWindowUpdate {
        let previous = self.value;
        self.value = self.min;
        debug!(from = previous, to = self.value, "CW reset");
        ContentionWindowUpdate {
            previous,
            current: self.value,
            kind: ContentionWindowUpdateKind::Reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentionConfig;

    fn window(cw_min: u32, cw_max: u32, cw_factor: u32) -> ContentionWindow {
        ContentionWindow::new(&ContentionConfig {
            cw_min,
            cw_max,
            cw_factor,
            ..Default::default()
        })
    }

    #[test]
    fn test_starts_at_minimum() {
        let cw = window(15, 1023, 2);
        assert_eq!(cw.value(), 15);
        assert_eq!(cw.min(), 15);
        assert_eq!(cw.max(), 1023);
    }

    #[test]
    fn test_grow_doubles_plus_one() {
        let mut cw = window(15, 1023, 2);
        let update = cw.grow();
        assert_eq!(update.previous, 15);
        assert_eq!(update.current, 31);
        assert_eq!(update.kind, ContentionWindowUpdateKind::Grew);
        assert!(update.changed());

        let expected = [63, 127, 255, 511, 1023, 1023];
        for value in expected {
            assert_eq!(cw.grow().current, value);
        }
    }

    #[test]
    fn test_grow_with_factor_three_is_capped() {
        let mut cw = window(3, 63, 3);
        assert_eq!(cw.grow().current, 11);
        assert_eq!(cw.grow().current, 35);
        assert_eq!(cw.grow().current, 63);
    }

    #[test]
    fn test_factor_one_keeps_window_fixed() {
        let mut cw = window(7, 63, 1);
        let update = cw.grow();
        assert_eq!(update.current, 7);
        assert!(!update.changed());
    }

    #[test]
    fn test_reset_returns_to_minimum() {
        let mut cw = window(15, 1023, 2);
        cw.grow();
        cw.grow();
        let update = cw.reset();
        assert_eq!(update.previous, 63);
        assert_eq!(update.current, 15);
        assert_eq!(update.kind, ContentionWindowUpdateKind::Reset);

        // 再次重置没有变化
        assert!(!cw.reset().changed());
    }

    #[test]
    fn test_bounds_hold_for_mixed_updates() {
        let mut cw = window(15, 1023, 2);
        for step in 0..200u32 {
            if step % 7 == 3 {
                cw.reset();
            } else {
                cw.grow();
            }
            assert!((15..=1023).contains(&cw.value()));
        }
    }

    #[test]
    fn test_grow_saturates_on_large_values() {
        let mut cw = window(1 << 30, u32::MAX, 4);
        assert_eq!(cw.grow().current, u32::MAX - 1);
        assert_eq!(cw.grow().current, u32::MAX - 1);
    }
}
