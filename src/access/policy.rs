//! 信道感知策略
//! Channel-Sense Policy
//!
//! 决定哪些通知视为信道忙碌，以及数据之前是否发送预留信号。
//! Decides which notifications count as a busy channel and whether a
//! reservation signal precedes data.

use crate::{config::SensingConfig, error::Error};
use std::{fmt, str::FromStr};

/// Where a busy indication came from.
/// 忙碌指示的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusySource {
    /// Energy above the detection threshold (CCA busy).
    /// 能量高于检测门限（CCA忙碌）。
    EnergyDetect,
    /// A foreign preamble was decoded (start of receive).
    /// 解码到外部前导码（开始接收）。
    PreambleDetect,
}

/// 信道感知模式
/// Channel sensing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSenseMode {
    /// Energy detection only; foreign signals are not decoded.
    /// 仅能量检测；不解码外部信号。
    Ene,
    /// Energy detection plus a reservation signal before data.
    /// 能量检测，数据前发送预留信号。
    EneCts,
    /// Energy detection plus decoded preambles.
    /// 能量检测加前导码解码。
    Pre,
    /// Preamble-aware detection plus a reservation signal before data.
    /// 前导码感知检测，数据前发送预留信号。
    PreCts,
}

impl ChannelSenseMode {
    /// Whether a notification from `source` makes the channel busy.
    /// 来自 `source` 的通知是否使信道忙碌。
    pub fn counts_as_busy(self, source: BusySource) -> bool {
        match source {
            BusySource::EnergyDetect => true,
            BusySource::PreambleDetect => matches!(self, Self::Pre | Self::PreCts),
        }
    }

    /// Whether access is seized with a reservation signal before the grant.
    /// 授权前是否用预留信号占用信道。
    pub fn uses_reservation_signal(self) -> bool {
        matches!(self, Self::EneCts | Self::PreCts)
    }

    /// Whether the sensing layer should try to decode foreign signals.
    /// 感知层是否应尝试解码外部信号。
    pub fn decodes_foreign_signals(self) -> bool {
        matches!(self, Self::Pre | Self::PreCts)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ene => "ENE",
            Self::EneCts => "ENECTS",
            Self::Pre => "PRE",
            Self::PreCts => "PRECTS",
        }
    }
}

impl fmt::Display for ChannelSenseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelSenseMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ENE" => Ok(Self::Ene),
            "ENECTS" => Ok(Self::EneCts),
            "PRE" => Ok(Self::Pre),
            "PRECTS" => Ok(Self::PreCts),
            _ => Err(Error::UnknownSenseMode(s.to_string())),
        }
    }
}

/// Settings pushed to the sensing and transmit layers when a manager attaches.
///
/// 管理器接入时推送给感知层和发射层的设置。
#[derive(Debug, Clone, PartialEq)]
pub struct PhyDirective {
    /// 是否解码外部信号
    /// Whether foreign signals are decoded
    pub decode_foreign_signals: bool,
    /// 能量检测门限（dBm）
    /// Energy detection threshold in dBm
    pub energy_detection_threshold_dbm: f64,
    /// 无数据时是否发送预留信号
    /// Whether to pad with a reservation signal when no data is ready
    pub use_reservation_signal: bool,
}

impl PhyDirective {
    pub fn from_config(config: &SensingConfig) -> Self {
        Self {
            decode_foreign_signals: config.sense_mode.decodes_foreign_signals(),
            energy_detection_threshold_dbm: config.energy_detection_threshold_dbm,
            use_reservation_signal: config.use_reservation_signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChannelSenseMode; 4] = [
        ChannelSenseMode::Ene,
        ChannelSenseMode::EneCts,
        ChannelSenseMode::Pre,
        ChannelSenseMode::PreCts,
    ];

    #[test]
    fn test_energy_always_counts_as_busy() {
        for mode in ALL {
            assert!(mode.counts_as_busy(BusySource::EnergyDetect), "{mode}");
        }
    }

    #[test]
    fn test_preamble_counts_only_for_preamble_aware_modes() {
        assert!(!ChannelSenseMode::Ene.counts_as_busy(BusySource::PreambleDetect));
        assert!(!ChannelSenseMode::EneCts.counts_as_busy(BusySource::PreambleDetect));
        assert!(ChannelSenseMode::Pre.counts_as_busy(BusySource::PreambleDetect));
        assert!(ChannelSenseMode::PreCts.counts_as_busy(BusySource::PreambleDetect));
    }

    #[test]
    fn test_reservation_and_decoding_flags() {
        let flags: Vec<_> = ALL
            .iter()
            .map(|m| (m.uses_reservation_signal(), m.decodes_foreign_signals()))
            .collect();
        assert_eq!(
            flags,
            vec![(false, false), (true, false), (false, true), (true, true)]
        );
    }

    #[test]
    fn test_parse_mode_names() {
        assert_eq!("ENE".parse(), Ok(ChannelSenseMode::Ene));
        assert_eq!("Enects".parse(), Ok(ChannelSenseMode::EneCts));
        assert_eq!("pre".parse(), Ok(ChannelSenseMode::Pre));
        assert_eq!("Prects".parse(), Ok(ChannelSenseMode::PreCts));
        assert_eq!(
            "cts".parse::<ChannelSenseMode>(),
            Err(Error::UnknownSenseMode("cts".to_string()))
        );
        for mode in ALL {
            assert_eq!(mode.to_string().parse(), Ok(mode));
        }
    }

    #[test]
    fn test_phy_directive_follows_mode() {
        let config = SensingConfig {
            sense_mode: ChannelSenseMode::EneCts,
            use_reservation_signal: false,
            energy_detection_threshold_dbm: -72.0,
        };
        let directive = PhyDirective::from_config(&config);
        assert!(!directive.decode_foreign_signals);
        assert!(!directive.use_reservation_signal);
        assert_eq!(directive.energy_detection_threshold_dbm, -72.0);
    }
}
