use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// First board's local port; each further board binds two ports higher.
const BASE_LOCAL_PORT: u16 = 8888;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub bind_address: IpAddr,
    /// Derived from the board id when absent.
    pub local_port: Option<u16>,
    /// The operator console all telemetry is sent to.
    pub peer: SocketAddr,
    /// Inbound datagrams are truncated to this many bytes.
    pub max_packet_length: usize,
    /// Capacity of the inbound and outbound channels to the control task.
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            local_port: None,
            peer: SocketAddr::from(([192, 168, 1, 100], 8889)),
            max_packet_length: 100,
            channel_capacity: 64,
        }
    }
}

impl TransportConfig {
    pub fn local_port(&self, board_id: u8) -> u16 {
        self.local_port.unwrap_or_else(|| {
            BASE_LOCAL_PORT.saturating_add(2 * u16::from(board_id.saturating_sub(1)))
        })
    }

    pub fn local_addr(&self, board_id: u8) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.local_port(board_id))
    }
}
