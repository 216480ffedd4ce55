//! Room gateway.
//!
//! One logical session to a room:
//! - `connect` performs the join handshake (UDP port announce + JoinRoom)
//!   under a bounded timeout, with no retry.
//! - Inbound entity patches are buffered by `poll_patches` and drained once
//!   per frame by `dispatch`, so observers never run concurrently with tick
//!   logic.
//! - `send` is a one-way UDP datagram with no acknowledgement.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use scene_shared::{
    config::SceneConfig,
    net::{
        CommandSocket, EntityPatch, InputCommand, PatchStream, PlayerState, RoomMsg, SessionId,
        PROTOCOL_VERSION,
    },
};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Upper bound on the whole join handshake.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long one patch poll may wait when no data is pending.
const POLL_WAIT: Duration = Duration::from_millis(10);
/// Follow-up wait while draining a burst of queued frames.
const DRAIN_WAIT: Duration = Duration::from_millis(1);

/// Most patch frames read per poll. A room pushing faster than the client
/// ticks must not keep one frame's poll alive; the overflow waits for the
/// next frame.
pub const MAX_PATCHES_PER_POLL: usize = 64;

/// Why a join attempt failed. Surfaced as a status line, never fatal.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("server unreachable: {0:#}")]
    Unreachable(anyhow::Error),
    #[error("join rejected: {reason}")]
    Rejected { reason: String },
    #[error("join handshake timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Observer contract for entity lifecycle/update patches.
///
/// For a given identity the room guarantees add before any change or
/// remove, and nothing after remove; FIFO dispatch preserves that here.
pub trait PatchHandler {
    fn on_added(&mut self, session_id: &SessionId, state: PlayerState);
    fn on_changed(&mut self, session_id: &SessionId, state: PlayerState);
    fn on_removed(&mut self, session_id: &SessionId);
}

/// FIFO buffer between the patch stream and per-frame dispatch.
#[derive(Default)]
pub struct PatchQueue {
    pending: VecDeque<EntityPatch>,
}

impl PatchQueue {
    /// Queues the patch carried by a room message, if any.
    ///
    /// Returns `false` when the message ends the session.
    pub fn enqueue(&mut self, msg: RoomMsg) -> bool {
        match msg {
            RoomMsg::PlayerAdd { session_id, state } => {
                self.pending
                    .push_back(EntityPatch::Added { session_id, state });
            }
            RoomMsg::PlayerChange { session_id, state } => {
                self.pending
                    .push_back(EntityPatch::Changed { session_id, state });
            }
            RoomMsg::PlayerRemove { session_id } => {
                self.pending.push_back(EntityPatch::Removed { session_id });
            }
            RoomMsg::Disconnect { reason } => {
                info!(reason = %reason, "Room closed the session");
                return false;
            }
            other => {
                debug!(?other, "Unhandled room message");
            }
        }
        true
    }

    /// Drains queued patches into the handler, in arrival order.
    pub fn dispatch(&mut self, handler: &mut dyn PatchHandler) {
        while let Some(patch) = self.pending.pop_front() {
            match patch {
                EntityPatch::Added { session_id, state } => handler.on_added(&session_id, state),
                EntityPatch::Changed { session_id, state } => {
                    handler.on_changed(&session_id, state)
                }
                EntityPatch::Removed { session_id } => handler.on_removed(&session_id),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// One live connection to a room.
pub struct RoomSession {
    session_id: SessionId,
    patches: PatchStream,
    commands: CommandSocket,
    queue: PatchQueue,
    live: bool,
}

/// Joins-or-creates the configured room.
pub async fn connect(cfg: &SceneConfig) -> Result<RoomSession, ConnectError> {
    let server_addr: SocketAddr = cfg
        .server_addr
        .parse()
        .map_err(|e| ConnectError::Protocol(format!("bad server_addr: {e}")))?;

    info!(server = %server_addr, room = %cfg.room_name, "Joining room");

    match tokio::time::timeout(JOIN_TIMEOUT, handshake(cfg, server_addr)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectError::Timeout),
    }
}

async fn handshake(
    cfg: &SceneConfig,
    server_addr: SocketAddr,
) -> Result<RoomSession, ConnectError> {
    // Bind UDP first so we can tell the room where commands come from.
    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
    let commands = CommandSocket::connect(bind, server_addr)
        .await
        .map_err(ConnectError::Unreachable)?;
    let client_udp_port = commands
        .local_addr()
        .map_err(ConnectError::Unreachable)?
        .port();

    let stream = TcpStream::connect(server_addr)
        .await
        .map_err(|e| ConnectError::Unreachable(anyhow::Error::new(e)))?;
    let mut patches = PatchStream::new(stream);

    patches
        .send(&RoomMsg::Hello {
            protocol: PROTOCOL_VERSION,
        })
        .await
        .map_err(ConnectError::Unreachable)?;
    patches
        .send(&RoomMsg::UdpHello { client_udp_port })
        .await
        .map_err(ConnectError::Unreachable)?;
    patches
        .send(&RoomMsg::JoinRoom {
            room: cfg.room_name.clone(),
            player_name: cfg.player_name.clone(),
        })
        .await
        .map_err(ConnectError::Unreachable)?;

    let session_id = match patches.recv().await.map_err(ConnectError::Unreachable)? {
        RoomMsg::RoomJoined { session_id } => session_id,
        RoomMsg::JoinRejected { reason } => return Err(ConnectError::Rejected { reason }),
        other => {
            return Err(ConnectError::Protocol(format!(
                "expected RoomJoined, got {other:?}"
            )))
        }
    };

    info!(session = %session_id, "Joined room");

    Ok(RoomSession {
        session_id,
        patches,
        commands,
        queue: PatchQueue::default(),
        live: true,
    })
}

impl RoomSession {
    /// The identity of this client's own entity within the room.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// False once the patch stream has failed or the room said goodbye.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Reads pending frames off the patch stream into the queue.
    ///
    /// Bounded by a short wait and a per-poll frame cap so one poll never
    /// stalls the frame; a stream error marks the session dead rather than
    /// propagating.
    pub async fn poll_patches(&mut self) {
        if !self.live {
            return;
        }
        let mut wait = POLL_WAIT;
        for _ in 0..MAX_PATCHES_PER_POLL {
            match self.patches.recv_timeout(wait).await {
                Ok(Some(msg)) => {
                    if !self.queue.enqueue(msg) {
                        self.live = false;
                        break;
                    }
                    wait = DRAIN_WAIT;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Patch stream error");
                    self.live = false;
                    break;
                }
            }
        }
    }

    /// Drains the patch queue into the handler, in arrival order.
    pub fn dispatch(&mut self, handler: &mut dyn PatchHandler) {
        self.queue.dispatch(handler);
    }

    /// Fire-and-forget upstream command. Best-effort; never acknowledged.
    pub async fn send(&self, tag: u8, payload: InputCommand) -> anyhow::Result<()> {
        self.commands.send(&RoomMsg::Command { tag, payload }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl PatchHandler for Recorder {
        fn on_added(&mut self, session_id: &SessionId, state: PlayerState) {
            self.log.push(format!("add {session_id} @{},{}", state.x, state.y));
        }
        fn on_changed(&mut self, session_id: &SessionId, _state: PlayerState) {
            self.log.push(format!("change {session_id}"));
        }
        fn on_removed(&mut self, session_id: &SessionId) {
            self.log.push(format!("remove {session_id}"));
        }
    }

    #[test]
    fn queue_preserves_arrival_order() {
        let mut queue = PatchQueue::default();
        assert!(queue.enqueue(RoomMsg::PlayerAdd {
            session_id: "a".into(),
            state: PlayerState { x: 1.0, y: 2.0 },
        }));
        assert!(queue.enqueue(RoomMsg::PlayerChange {
            session_id: "a".into(),
            state: PlayerState { x: 3.0, y: 4.0 },
        }));
        assert!(queue.enqueue(RoomMsg::PlayerRemove {
            session_id: "a".into(),
        }));

        let mut rec = Recorder::default();
        queue.dispatch(&mut rec);
        assert_eq!(rec.log, vec!["add a @1,2", "change a", "remove a"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn disconnect_ends_the_session() {
        let mut queue = PatchQueue::default();
        assert!(!queue.enqueue(RoomMsg::Disconnect {
            reason: "room shutting down".to_string(),
        }));
    }

    #[test]
    fn non_patch_messages_are_ignored() {
        let mut queue = PatchQueue::default();
        assert!(queue.enqueue(RoomMsg::Hello {
            protocol: PROTOCOL_VERSION,
        }));
        assert!(queue.is_empty());
    }
}
