//! Scene wiring.
//!
//! The host's frame loop owns timing and calls [`GameScene::update`] once
//! per frame. Each update drains room patches into the mirror, samples the
//! keyboard, runs the click-to-move planner, and sends the tick's command
//! upstream. Patch dispatch and tick logic share the one loop, so the
//! mirror needs no locking.
//!
//! Joining runs on a spawned task so the frame loop keeps rendering the
//! "connecting" status while the handshake is in flight; `update` picks up
//! the outcome once the task finishes.

use scene_shared::{
    config::SceneConfig,
    math::Vec2,
    net::INPUT_COMMAND_TAG,
    stage::Stage,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    gateway::{self, ConnectError, RoomSession},
    input::{self, Keyboard},
    mirror::EntityMirror,
    planner::Planner,
};

/// Status lines shown while joining and after failures.
pub const STATUS_CONNECTING: &str = "Trying to connect with the server...";
pub const STATUS_FAILED: &str = "Could not connect with the server.";
pub const STATUS_LOST: &str = "Connection lost.";

/// Where the scene stands with respect to its room.
enum SessionSlot {
    /// No session and no join in flight.
    Idle,
    /// Handshake running on a spawned task.
    Joining(JoinHandle<Result<RoomSession, ConnectError>>),
    /// Joined; patches flow and commands go out.
    Live(RoomSession),
}

/// The client scene: one optional room session plus local state.
pub struct GameScene {
    cfg: SceneConfig,
    slot: SessionSlot,
    mirror: EntityMirror,
    planner: Planner,
}

impl GameScene {
    pub fn new(cfg: SceneConfig) -> Self {
        Self {
            cfg,
            slot: SessionSlot::Idle,
            mirror: EntityMirror::new(),
            planner: Planner::new(),
        }
    }

    /// Starts joining the configured room.
    ///
    /// Returns immediately; the handshake runs in the background and
    /// `update` observes the outcome. Ignored while a join is already in
    /// flight or a session is live. Failure is non-fatal and not retried
    /// here: the status line carries the only user-visible report.
    pub fn connect(&mut self, stage: &mut impl Stage) {
        if !matches!(self.slot, SessionSlot::Idle) {
            return;
        }
        stage.set_status_text(STATUS_CONNECTING);
        let cfg = self.cfg.clone();
        self.slot = SessionSlot::Joining(tokio::spawn(async move { gateway::connect(&cfg).await }));
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.slot, SessionSlot::Live(_))
    }

    pub fn mirror(&self) -> &EntityMirror {
        &self.mirror
    }

    /// Pointer-down from the engine: arms (or re-arms) the move target.
    pub fn pointer_down(&mut self, at: Vec2) {
        self.planner.pointer_down(at);
    }

    /// One frame of scene logic. Without a session this is a no-op, which
    /// also guards the upstream send.
    pub async fn update(&mut self, stage: &mut impl Stage, keys: &impl Keyboard, _dt: f32) {
        self.poll_join(stage).await;

        let SessionSlot::Live(session) = &mut self.slot else {
            return;
        };

        session.poll_patches().await;
        session.dispatch(&mut self.mirror.bind(stage));

        if !session.is_live() {
            warn!("Room session lost");
            stage.set_status_text(STATUS_LOST);
            self.slot = SessionSlot::Idle;
            return;
        }

        let cmd = input::sample(keys);

        let local = self.mirror.sprite(session.session_id());
        self.planner.tick(stage, local);

        // Sent every tick regardless of change; best-effort telemetry of
        // intent, so a dropped datagram is only worth a debug line.
        if let Err(e) = session.send(INPUT_COMMAND_TAG, cmd).await {
            debug!(error = %e, "Command send failed");
        }
    }

    /// Collects the outcome of an in-flight join, if it has finished.
    async fn poll_join(&mut self, stage: &mut impl Stage) {
        if !matches!(self.slot, SessionSlot::Joining(_)) {
            return;
        }
        if let SessionSlot::Joining(handle) = std::mem::replace(&mut self.slot, SessionSlot::Idle)
        {
            if !handle.is_finished() {
                self.slot = SessionSlot::Joining(handle);
                return;
            }
            match handle.await {
                Ok(Ok(session)) => {
                    stage.set_status_text("");
                    self.slot = SessionSlot::Live(session);
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Join failed");
                    stage.set_status_text(STATUS_FAILED);
                }
                Err(e) => {
                    warn!(error = %e, "Join task failed");
                    stage.set_status_text(STATUS_FAILED);
                }
            }
        }
    }

    /// Tears the scene down: despawns mirrored sprites and drops the
    /// session. An unfinished join task is detached and its result
    /// discarded.
    pub fn teardown(&mut self, stage: &mut impl Stage) {
        self.mirror.clear(stage);
        self.slot = SessionSlot::Idle;
        self.planner = Planner::new();
    }
}
