use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Media-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfuConfig {
    /// Local interface the RTC sockets bind
    pub listen_ip: String,
    /// Externally reachable address advertised in ICE candidates; falls
    /// back to `listen_ip` when unset
    pub announced_ip: Option<String>,
    pub rtc_min_port: u16,
    pub rtc_max_port: u16,
    /// 0 = derive from core count
    pub num_workers: usize,
    /// Per-transport incoming bitrate cap, bits/s
    pub max_incoming_bitrate: u32,
}

impl Default for SfuConfig {
    fn default() -> Self {
        Self {
            listen_ip: "127.0.0.1".to_string(),
            announced_ip: None,
            rtc_min_port: 40000,
            rtc_max_port: 49999,
            num_workers: 0,
            max_incoming_bitrate: 10_000_000,
        }
    }
}

impl SfuConfig {
    /// Worker pool size: configured value, or one worker per two cores with
    /// a floor of one.
    #[must_use]
    pub fn resolve_num_workers(&self) -> usize {
        if self.num_workers > 0 {
            self.num_workers
        } else {
            (num_cpus::get().div_ceil(2)).max(1)
        }
    }

    pub fn listen_ip(&self) -> anyhow::Result<IpAddr> {
        self.listen_ip
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen_ip {:?}: {e}", self.listen_ip))
    }

    pub fn announced_ip(&self) -> anyhow::Result<Option<IpAddr>> {
        self.announced_ip
            .as_deref()
            .map(|ip| {
                ip.parse()
                    .map_err(|e| anyhow::anyhow!("Invalid announced_ip {ip:?}: {e}"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_num_workers() {
        let mut config = SfuConfig::default();
        assert!(config.resolve_num_workers() >= 1);

        config.num_workers = 3;
        assert_eq!(config.resolve_num_workers(), 3);
    }

    #[test]
    fn test_ip_parsing() {
        let config = SfuConfig {
            listen_ip: "0.0.0.0".to_string(),
            announced_ip: Some("203.0.113.7".to_string()),
            ..SfuConfig::default()
        };
        assert!(config.listen_ip().is_ok());
        assert!(config.announced_ip().unwrap().is_some());

        let bad = SfuConfig {
            listen_ip: "not-an-ip".to_string(),
            ..SfuConfig::default()
        };
        assert!(bad.listen_ip().is_err());
    }
}
