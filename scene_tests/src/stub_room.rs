//! Stub room server.
//!
//! Speaks just enough of the room protocol to exercise the client: it
//! accepts (or rejects) one join handshake, pushes scripted entity patches
//! over the reliable stream, and captures upstream commands on UDP. It is
//! test tooling, not an authoritative server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use scene_shared::{
    config::SceneConfig,
    net::{InputCommand, PatchStream, PlayerState, RoomListener, RoomMsg, SessionId,
        PROTOCOL_VERSION,
    },
};
use tokio::{net::UdpSocket, time};
use tracing::info;

/// One-room stub server bound to ephemeral localhost ports.
pub struct StubRoom {
    tcp: RoomListener,
    udp: UdpSocket,
    next_session: u32,
}

/// One accepted client, seen from the room side.
pub struct RoomClient {
    stream: PatchStream,
    pub session_id: SessionId,
    pub udp_peer: SocketAddr,
}

/// Binds a stub room and returns a client config pointing at it.
pub async fn bind_ephemeral() -> anyhow::Result<(StubRoom, SceneConfig)> {
    // Bind TCP first to get an ephemeral port, then bind UDP to that same port.
    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
    let tcp = RoomListener::bind(bind).await?;
    let addr = tcp.local_addr()?;

    let udp_bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port());
    let udp = UdpSocket::bind(udp_bind).await.context("udp bind")?;

    let cfg = SceneConfig {
        server_addr: addr.to_string(),
        tick_hz: 60,
        ..Default::default()
    };

    Ok((
        StubRoom {
            tcp,
            udp,
            next_session: 1,
        },
        cfg,
    ))
}

impl StubRoom {
    /// Accepts one client and completes the join handshake.
    pub async fn accept_join(&mut self) -> anyhow::Result<RoomClient> {
        let (mut stream, peer, client_udp_port, room) = self.accept_handshake().await?;

        let session_id = SessionId(format!("sess-{}", self.next_session));
        self.next_session += 1;

        stream
            .send(&RoomMsg::RoomJoined {
                session_id: session_id.clone(),
            })
            .await?;
        info!(session = %session_id, room = %room, "Stub room accepted client");

        Ok(RoomClient {
            stream,
            session_id,
            udp_peer: SocketAddr::new(peer.ip(), client_udp_port),
        })
    }

    /// Accepts one client and refuses the join.
    pub async fn reject_join(&mut self, reason: &str) -> anyhow::Result<()> {
        let (mut stream, _, _, _) = self.accept_handshake().await?;
        stream
            .send(&RoomMsg::JoinRejected {
                reason: reason.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn accept_handshake(
        &mut self,
    ) -> anyhow::Result<(PatchStream, SocketAddr, u16, String)> {
        let (mut stream, peer) = self.tcp.accept().await?;

        let hello = stream.recv().await?;
        match hello {
            RoomMsg::Hello { protocol } if protocol == PROTOCOL_VERSION => {}
            other => anyhow::bail!("expected Hello, got {other:?}"),
        }

        let client_udp_port = match stream.recv().await? {
            RoomMsg::UdpHello { client_udp_port } => client_udp_port,
            other => anyhow::bail!("expected UdpHello, got {other:?}"),
        };

        let room = match stream.recv().await? {
            RoomMsg::JoinRoom { room, .. } => room,
            other => anyhow::bail!("expected JoinRoom, got {other:?}"),
        };

        Ok((stream, peer, client_udp_port, room))
    }

    /// Receives one upstream command within the timeout, if any.
    pub async fn recv_command(
        &self,
        timeout: Duration,
    ) -> anyhow::Result<Option<(u8, InputCommand)>> {
        let mut buf = vec![0u8; 64 * 1024];
        match time::timeout(timeout, self.udp.recv_from(&mut buf)).await {
            Ok(Ok((n, _from))) => {
                let msg: RoomMsg =
                    serde_json::from_slice(&buf[..n]).context("deserialize udp msg")?;
                match msg {
                    RoomMsg::Command { tag, payload } => Ok(Some((tag, payload))),
                    other => anyhow::bail!("expected Command, got {other:?}"),
                }
            }
            Ok(Err(e)) => Err(e).context("udp recv")?,
            Err(_) => Ok(None),
        }
    }
}

impl RoomClient {
    pub async fn push_add(&mut self, session_id: &SessionId, x: f32, y: f32) -> anyhow::Result<()> {
        self.stream
            .send(&RoomMsg::PlayerAdd {
                session_id: session_id.clone(),
                state: PlayerState { x, y },
            })
            .await
    }

    pub async fn push_change(
        &mut self,
        session_id: &SessionId,
        x: f32,
        y: f32,
    ) -> anyhow::Result<()> {
        self.stream
            .send(&RoomMsg::PlayerChange {
                session_id: session_id.clone(),
                state: PlayerState { x, y },
            })
            .await
    }

    pub async fn push_remove(&mut self, session_id: &SessionId) -> anyhow::Result<()> {
        self.stream
            .send(&RoomMsg::PlayerRemove {
                session_id: session_id.clone(),
            })
            .await
    }

    /// Announces the session end over the patch stream.
    pub async fn close(&mut self, reason: &str) -> anyhow::Result<()> {
        self.stream
            .send(&RoomMsg::Disconnect {
                reason: reason.to_string(),
            })
            .await
    }
}
