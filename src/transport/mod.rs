pub mod config;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::UdpSocket,
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_util::udp::UdpFramed;
use tracing::{debug, error, info, warn};

use crate::protocol::{codec::BoardCodec, error::ProtocolError, telemetry::Telemetry};
use config::TransportConfig;

/// Bidirectional command/telemetry channel to the operator console.
#[async_trait]
pub trait CommandLink: Send {
    /// Next command addressed to this board, prefix stripped. `None` once the
    /// link is closed.
    async fn recv(&mut self) -> Option<Result<String, ProtocolError>>;

    async fn send(&mut self, telemetry: Telemetry) -> Result<(), ProtocolError>;
}

/// UDP link to a single fixed peer.
pub struct UdpLink {
    framed: UdpFramed<BoardCodec>,
    peer: SocketAddr,
}

impl UdpLink {
    pub async fn bind(config: &TransportConfig, board_id: u8) -> Result<Self> {
        let addr = config.local_addr(board_id);
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind UDP socket on {}", addr))?;
        info!(
            "Board {} listening on {}, telemetry to {}",
            board_id,
            socket.local_addr().unwrap_or(addr),
            config.peer
        );
        Ok(Self {
            framed: UdpFramed::new(socket, BoardCodec::new(board_id, config.max_packet_length)),
            peer: config.peer,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.framed.get_ref().local_addr()?)
    }
}

#[async_trait]
impl CommandLink for UdpLink {
    async fn recv(&mut self) -> Option<Result<String, ProtocolError>> {
        let (command, from) = match self.framed.next().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        if from != self.peer {
            debug!("Command from {} (configured peer is {})", from, self.peer);
        }
        Some(Ok(command))
    }

    async fn send(&mut self, telemetry: Telemetry) -> Result<(), ProtocolError> {
        self.framed.send((telemetry, self.peer)).await
    }
}

/// Run the network side of the controller: forward inbound commands to the
/// control task and send whatever telemetry it queues, until shutdown.
pub fn spawn_network_task<L>(
    mut link: L,
    inbound_tx: mpsc::Sender<String>,
    mut outbound_rx: mpsc::Receiver<Telemetry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    L: CommandLink + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                inbound = link.recv() => {
                    match inbound {
                        Some(Ok(command)) => {
                            if inbound_tx.send(command).await.is_err() {
                                debug!("Control task gone, closing link");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Failed to receive datagram: {}", e);
                        }
                        None => {
                            info!("Link closed");
                            break;
                        }
                    }
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(telemetry) => {
                            if let Err(e) = link.send(telemetry).await {
                                error!("Failed to send telemetry: {}", e);
                            }
                        }
                        None => {
                            debug!("Telemetry channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Network task shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory link: the test holds the console ends of both channels.
    pub struct ChannelLink {
        pub commands: mpsc::Receiver<String>,
        pub telemetry: mpsc::Sender<Telemetry>,
    }

    pub struct Console {
        pub commands: mpsc::Sender<String>,
        pub telemetry: mpsc::Receiver<Telemetry>,
    }

    pub fn channel_link() -> (ChannelLink, Console) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (tel_tx, tel_rx) = mpsc::channel(16);
        (
            ChannelLink {
                commands: cmd_rx,
                telemetry: tel_tx,
            },
            Console {
                commands: cmd_tx,
                telemetry: tel_rx,
            },
        )
    }

    #[async_trait]
    impl CommandLink for ChannelLink {
        async fn recv(&mut self) -> Option<Result<String, ProtocolError>> {
            self.commands.recv().await.map(Ok)
        }

        async fn send(&mut self, telemetry: Telemetry) -> Result<(), ProtocolError> {
            self.telemetry.send(telemetry).await.map_err(|e| {
                ProtocolError::IoError(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e.to_string(),
                ))
            })
        }
    }
}
