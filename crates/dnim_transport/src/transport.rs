//! Thin wrapper around the single UDP socket the node reads and writes
//! through (§4.7, §5: "one writer task serializes sends").

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::trace;

use dnim_core::CoreError;
use dnim_proto::codec;
use dnim_proto::Packet;

pub struct Transport {
    socket: Arc<UdpSocket>,
}

impl Transport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, CoreError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| CoreError::TransportError(e.to_string()))?;
        Ok(Self { socket: Arc::new(socket) })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn socket(&self) -> Arc<UdpSocket> {
        self.socket.clone()
    }

    pub async fn send(&self, to: SocketAddr, packet: &Packet) -> Result<(), CoreError> {
        let wire = codec::encode(packet);
        trace!(%to, bytes = wire.len(), "sending datagram");
        self.socket
            .send_to(&wire, to)
            .await
            .map_err(|e| CoreError::TransportError(e.to_string()))?;
        Ok(())
    }

    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), CoreError> {
        self.socket.recv_from(buf).await.map_err(|e| CoreError::TransportError(e.to_string()))
    }
}
