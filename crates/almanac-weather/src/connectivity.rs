//! Active network transport detection.
//!
//! Remote lookups are only attempted over WiFi, cellular or ethernet.

use async_trait::async_trait;

/// Network transports eligible for remote lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
}

impl Transport {
    /// Map a NetworkManager connection type (`PrimaryConnectionType`).
    ///
    /// An empty type means no primary connection. Tunnels, bridges, bonds and
    /// other virtual links ride on a physical transport, so they count as wired.
    pub fn from_network_manager(connection_type: &str) -> Option<Self> {
        match connection_type.trim() {
            "" | "loopback" => None,
            "802-11-wireless" | "wifi-p2p" => Some(Self::Wifi),
            "gsm" | "cdma" | "wwan" => Some(Self::Cellular),
            _ => Some(Self::Ethernet),
        }
    }
}

/// Reports which transport is currently active, if any.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn active_transport(&self) -> Option<Transport>;
}

/// A probe with a fixed answer. Used when the check is disabled and on
/// platforms without a detection backend.
#[derive(Debug, Clone, Copy)]
pub struct FixedConnectivity(pub Option<Transport>);

impl FixedConnectivity {
    pub fn online() -> Self {
        Self(Some(Transport::Ethernet))
    }

    pub fn offline() -> Self {
        Self(None)
    }
}

#[async_trait]
impl ConnectivityProbe for FixedConnectivity {
    async fn active_transport(&self) -> Option<Transport> {
        self.0
    }
}

/// Probe backed by the operating system's network state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConnectivity;

#[async_trait]
impl ConnectivityProbe for SystemConnectivity {
    async fn active_transport(&self) -> Option<Transport> {
        platform::active_transport().await
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::Transport;

    #[zbus::proxy(
        interface = "org.freedesktop.NetworkManager",
        default_service = "org.freedesktop.NetworkManager",
        default_path = "/org/freedesktop/NetworkManager"
    )]
    trait NetworkManager {
        #[zbus(property)]
        fn primary_connection_type(&self) -> zbus::Result<String>;
    }

    async fn primary_connection_type() -> zbus::Result<String> {
        let connection = zbus::Connection::system().await?;
        let proxy = NetworkManagerProxy::new(&connection).await?;
        proxy.primary_connection_type().await
    }

    pub(super) async fn active_transport() -> Option<Transport> {
        match primary_connection_type().await {
            Ok(connection_type) => {
                let transport = Transport::from_network_manager(&connection_type);
                tracing::debug!(
                    "NetworkManager primary connection {:?} -> {:?}",
                    connection_type,
                    transport
                );
                transport
            }
            Err(e) => {
                // Hosts without NetworkManager are not locked out.
                tracing::warn!("NetworkManager unavailable ({}), assuming a wired connection", e);
                Some(Transport::Ethernet)
            }
        }
    }
}

#[cfg(windows)]
mod platform {
    use super::Transport;
    use windows::Networking::Connectivity::{NetworkConnectivityLevel, NetworkInformation};

    fn query() -> windows::core::Result<Option<Transport>> {
        let profile = match NetworkInformation::GetInternetConnectionProfile() {
            Ok(profile) => profile,
            // No profile means no active connection.
            Err(_) => return Ok(None),
        };

        if profile.GetNetworkConnectivityLevel()? == NetworkConnectivityLevel::None {
            return Ok(None);
        }

        if profile.IsWlanConnectionProfile()? {
            Ok(Some(Transport::Wifi))
        } else if profile.IsWwanConnectionProfile()? {
            Ok(Some(Transport::Cellular))
        } else {
            Ok(Some(Transport::Ethernet))
        }
    }

    pub(super) async fn active_transport() -> Option<Transport> {
        match query() {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("Connection profile unavailable ({}), assuming a wired connection", e);
                Some(Transport::Ethernet)
            }
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use super::Transport;

    pub(super) async fn active_transport() -> Option<Transport> {
        tracing::debug!("No connectivity backend on this platform, assuming online");
        Some(Transport::Ethernet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_manager_types() {
        assert_eq!(Transport::from_network_manager("802-11-wireless"), Some(Transport::Wifi));
        assert_eq!(Transport::from_network_manager("802-3-ethernet"), Some(Transport::Ethernet));
        assert_eq!(Transport::from_network_manager("gsm"), Some(Transport::Cellular));
        assert_eq!(Transport::from_network_manager("cdma"), Some(Transport::Cellular));
    }

    #[test]
    fn test_network_manager_without_transport() {
        assert_eq!(Transport::from_network_manager(""), None);
        assert_eq!(Transport::from_network_manager("loopback"), None);
    }

    #[test]
    fn test_network_manager_virtual_links_are_online() {
        for connection_type in ["vpn", "wireguard", "bridge", "bond", "vlan", "tun", "bluetooth"] {
            assert_eq!(
                Transport::from_network_manager(connection_type),
                Some(Transport::Ethernet),
                "{connection_type}"
            );
        }
    }

    #[tokio::test]
    async fn test_fixed_probe() {
        assert_eq!(FixedConnectivity::online().active_transport().await, Some(Transport::Ethernet));
        assert_eq!(FixedConnectivity::offline().active_transport().await, None);
        assert_eq!(
            FixedConnectivity(Some(Transport::Cellular)).active_transport().await,
            Some(Transport::Cellular)
        );
    }
}
