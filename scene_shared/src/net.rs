//! Room networking primitives.
//!
//! Goals:
//! - Provide a reliable (TCP) patch/control stream and an unreliable (UDP)
//!   command channel.
//! - Provide the room message types the scene client consumes.
//! - Keep serialization explicit and versionable.
//!
//! The framing here is incidental; the client only depends on the typed
//! message boundary (`RoomMsg`, `EntityPatch`).

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream, UdpSocket},
    time,
};

use crate::math::Vec2;

/// Protocol version for compatibility checks.
pub const PROTOCOL_VERSION: u32 = 1;

/// Application tag for the per-tick input command.
pub const INPUT_COMMAND_TAG: u8 = 0;

/// Identifies one client's session within a room.
///
/// Opaque to the client; stable for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

/// Server-authoritative state for one player entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
}

impl PlayerState {
    pub fn position(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Directional key levels sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InputCommand {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// High-level message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RoomMsg {
    // ─── Connection handshake ───
    Hello {
        protocol: u32,
    },
    /// Client announces its UDP port to the room.
    UdpHello {
        client_udp_port: u16,
    },
    /// Client asks to join-or-create a named room.
    JoinRoom {
        room: String,
        player_name: String,
    },
    /// Room accepted the join; the id names this client's own entity.
    RoomJoined {
        session_id: SessionId,
    },
    /// Room refused the join.
    JoinRejected {
        reason: String,
    },

    // ─── Entity patches ───
    /// A player entered the room.
    PlayerAdd {
        session_id: SessionId,
        state: PlayerState,
    },
    /// Authoritative state update for a known player.
    PlayerChange {
        session_id: SessionId,
        state: PlayerState,
    },
    /// A player left the room.
    PlayerRemove {
        session_id: SessionId,
    },

    // ─── Upstream ───
    /// Client -> room: fire-and-forget command under a small integer tag.
    Command {
        tag: u8,
        payload: InputCommand,
    },

    // ─── Disconnect ───
    Disconnect {
        reason: String,
    },
}

/// One inbound entity lifecycle/update event, queued for per-frame dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityPatch {
    Added {
        session_id: SessionId,
        state: PlayerState,
    },
    Changed {
        session_id: SessionId,
        state: PlayerState,
    },
    Removed {
        session_id: SessionId,
    },
}

/// Reliable patch/control stream over TCP with length-prefixed frames.
#[derive(Debug)]
pub struct PatchStream {
    stream: TcpStream,
}

impl PatchStream {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn send(&mut self, msg: &RoomMsg) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(msg).context("serialize msg")?;
        let mut buf = BytesMut::with_capacity(4 + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(&payload);
        self.stream.write_all(&buf).await.context("tcp write")?;
        Ok(())
    }

    pub async fn recv(&mut self) -> anyhow::Result<RoomMsg> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .await
            .context("tcp read len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        let msg = serde_json::from_slice(&payload).context("deserialize msg")?;
        Ok(msg)
    }

    /// Receives a frame within the given timeout; `None` on timeout.
    pub async fn recv_timeout(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<RoomMsg>> {
        match time::timeout(timeout, self.recv()).await {
            Ok(Ok(msg)) => Ok(Some(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

/// Unreliable command channel over UDP.
#[derive(Debug)]
pub struct CommandSocket {
    socket: UdpSocket,
}

impl CommandSocket {
    pub async fn connect(bind_addr: SocketAddr, peer: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await.context("udp bind")?;
        socket.connect(peer).await.context("udp connect")?;
        Ok(Self { socket })
    }

    pub async fn send(&self, msg: &RoomMsg) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(msg).context("serialize udp msg")?;
        self.socket.send(&payload).await.context("udp send")?;
        Ok(())
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

/// TCP acceptor for the room side of the handshake.
pub struct RoomListener {
    listener: TcpListener,
}

impl RoomListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(PatchStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((PatchStream::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_msg_roundtrip() {
        let msg = RoomMsg::PlayerAdd {
            session_id: "abc".into(),
            state: PlayerState { x: 12.0, y: -3.5 },
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let back: RoomMsg = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn command_roundtrip() {
        let msg = RoomMsg::Command {
            tag: INPUT_COMMAND_TAG,
            payload: InputCommand {
                left: true,
                right: false,
                up: false,
                down: true,
            },
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let back: RoomMsg = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, back);
    }
}
