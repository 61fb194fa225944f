//! World session state machine.
//!
//! Owns the transport, the frame assembler and header cipher, and every
//! piece of mirrored world state. All decoding and state transitions
//! happen synchronously inside [`WorldSession::update`]; external
//! collaborators drive that from their frame loop and read results
//! through accessors.

mod handlers;
mod state;

pub use state::SessionState;

use chrono::Utc;
use kodo_protocol::messages::{
    Character, ChatMessageOut, ChatType, Language, MovementFlags, MovementInfo, Ping, PlayerLogin,
};
use kodo_protocol::{
    encode_client_frame, ClientOpcode, FrameAssembler, Guid, HeaderCrypto, OpcodeTable,
    PacketWriter, ProtocolError, SESSION_KEY_LEN,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::chat::{ChatEntry, ChatLog};
use crate::entities::{Entity, EntityManager};
use crate::targeting::TargetCycler;
use crate::transport::{TcpTransport, Transport, TransportError};

/// Seconds between heartbeat pings while in world.
const PING_INTERVAL: f32 = 30.0;

/// Errors surfaced by session entry points. Everything arriving off the
/// wire is handled internally by logging and skipping the offending
/// frame instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

type SuccessCallback = Box<dyn FnMut() + Send>;
type FailureCallback = Box<dyn FnMut(&str) + Send>;

/// Client side of one world-server connection.
pub struct WorldSession {
    state: SessionState,
    transport: Option<Box<dyn Transport>>,
    assembler: FrameAssembler,
    crypto: HeaderCrypto,
    opcodes: Option<OpcodeTable>,

    account: String,
    session_key: Vec<u8>,
    build: u32,
    client_seed: u32,
    server_seed: u32,
    rng: StdRng,

    characters: Vec<Character>,
    local_player: Guid,
    movement: MovementInfo,
    movement_time: u32,

    entities: EntityManager,
    targeting: TargetCycler,
    chat: ChatLog,
    motd: Vec<String>,

    clock: f64,
    time_since_last_ping: f32,
    ping_sequence: u32,
    ping_sent_at: f64,
    last_latency: u32,

    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl WorldSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            transport: None,
            assembler: FrameAssembler::new(),
            crypto: HeaderCrypto::new(),
            opcodes: None,
            account: String::new(),
            session_key: Vec::new(),
            build: 0,
            client_seed: 0,
            server_seed: 0,
            rng: StdRng::from_entropy(),
            characters: Vec::new(),
            local_player: Guid::ZERO,
            movement: MovementInfo::default(),
            movement_time: 0,
            entities: EntityManager::new(),
            targeting: TargetCycler::new(),
            chat: ChatLog::new(),
            motd: Vec::new(),
            clock: 0.0,
            time_since_last_ping: 0.0,
            ping_sequence: 0,
            ping_sent_at: 0.0,
            last_latency: 0,
            on_success: None,
            on_failure: None,
        }
    }

    /// Swap the seed generator, letting tests pin the client seed.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Size the chat history ring. Replaces any existing history.
    pub fn with_chat_cap(mut self, cap: usize) -> Self {
        self.chat = ChatLog::with_cap(cap);
        self
    }

    /// Called once when the server accepts the session proof.
    pub fn on_success(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_success = Some(Box::new(callback));
    }

    /// Called with a human-readable reason whenever the session fails.
    pub fn on_failure(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.on_failure = Some(Box::new(callback));
    }

    /// Dial a world server and wait for its auth challenge.
    ///
    /// Validates the session key and build before any transport attempt.
    pub async fn connect(
        &mut self,
        host: &str,
        port: u16,
        session_key: &[u8],
        account: &str,
        build: u32,
    ) -> Result<(), SessionError> {
        self.prepare(session_key, account, build)?;

        info!(target: "session", "Connecting to world server {}:{} as {}", host, port, self.account);
        self.set_state(SessionState::Connecting);

        match TcpTransport::connect(host, port).await {
            Ok(transport) => {
                self.adopt_transport(Box::new(transport));
                Ok(())
            }
            Err(e) => {
                error!(target: "net", "Failed to connect to world server: {}", e);
                self.fail("Connection failed");
                Err(SessionError::Transport(TransportError::Io(e)))
            }
        }
    }

    /// Attach an already-open transport instead of dialing one. The
    /// loopback transport enters here.
    pub fn connect_with_transport(
        &mut self,
        transport: Box<dyn Transport>,
        session_key: &[u8],
        account: &str,
        build: u32,
    ) -> Result<(), SessionError> {
        self.prepare(session_key, account, build)?;
        self.set_state(SessionState::Connecting);
        self.adopt_transport(transport);
        Ok(())
    }

    /// Tear down the transport and return to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.shutdown();
        }
        self.set_state(SessionState::Disconnected);
        info!(target: "session", "Disconnected from world server");
    }

    /// Drive the session: drain transport bytes, decode and dispatch
    /// complete frames, and advance the heartbeat timer while in world.
    /// Never blocks.
    pub fn update(&mut self, delta_time: f32) {
        self.clock += f64::from(delta_time);

        if self.transport.is_none() {
            return;
        }

        self.pump_frames();

        let alive = self
            .transport
            .as_ref()
            .is_some_and(|t| t.is_connected());
        if !alive && self.state.is_online() {
            self.fail("Connection lost");
            return;
        }

        // A destroyed or despawned target drops silently.
        let target = self.targeting.target();
        if !target.is_zero() && !self.entities.contains(target) {
            self.targeting.clear_target();
        }

        if self.state == SessionState::InWorld {
            self.time_since_last_ping += delta_time;
            if self.time_since_last_ping >= PING_INTERVAL {
                self.send_ping();
                self.time_since_last_ping = 0.0;
            }
        }
    }

    /// Ask the server for this account's characters.
    pub fn request_character_list(&mut self) {
        if self.state != SessionState::Ready && self.state != SessionState::Authenticated {
            warn!(target: "session", "Cannot request character list in state: {:?}", self.state);
            return;
        }

        info!(target: "session", "Requesting character list");
        self.send_frame(ClientOpcode::CharEnum, &[]);
        self.set_state(SessionState::CharListRequested);
    }

    /// Enter the world with one of the listed characters.
    pub fn select_character(&mut self, guid: Guid) {
        if self.state != SessionState::CharListReceived {
            warn!(target: "session", "Cannot select character in state: {:?}", self.state);
            return;
        }

        if let Some(character) = self.characters.iter().find(|c| c.guid == guid) {
            info!(
                target: "session",
                "Entering world as {} (level {} {} {})",
                character.name,
                character.level,
                character.race_name(),
                character.class_name(),
            );
        }

        self.local_player = guid;
        let mut w = PacketWriter::new();
        PlayerLogin { guid }.write(&mut w);
        let payload = w.into_inner();
        self.send_frame(ClientOpcode::PlayerLogin, &payload);
        self.set_state(SessionState::EnteringWorld);
    }

    /// Send a chat line. `target` names the recipient for whispers and
    /// the channel for channel messages, and is ignored otherwise.
    pub fn send_chat_message(&mut self, chat_type: ChatType, message: &str, target: Option<&str>) {
        if self.state != SessionState::InWorld {
            warn!(target: "session", "Cannot send chat in state: {:?}", self.state);
            return;
        }
        if message.is_empty() {
            warn!(target: "session", "Cannot send empty chat message");
            return;
        }

        info!(target: "session", "Sending chat message: [{}] {}", chat_type.label(), message);

        let mut w = PacketWriter::new();
        ChatMessageOut {
            chat_type,
            language: Language::Common,
            message,
            target,
        }
        .write(&mut w);
        let payload = w.into_inner();
        self.send_frame(ClientOpcode::MessageChat, &payload);
    }

    /// Append a locally produced line (own speech, UI notices) to the
    /// chat history without putting it on the wire.
    pub fn add_local_chat(&mut self, chat_type: ChatType, text: &str) {
        let entry = ChatEntry {
            chat_type,
            sender_guid: self.local_player,
            sender: self.local_character_name(),
            channel: None,
            text: text.to_string(),
            language: Language::Common.to_wire(),
            chat_tag: 0,
            received_at: Utc::now(),
        };
        self.chat.push(entry);
    }

    /// Send one movement frame, folding the opcode's flag change into the
    /// tracked movement state first.
    pub fn send_movement(&mut self, opcode: ClientOpcode) {
        if self.state != SessionState::InWorld {
            warn!(target: "session", "Cannot send movement in state: {:?}", self.state);
            return;
        }
        if !is_movement_opcode(opcode) {
            warn!(target: "session", "Not a movement opcode: {:?}", opcode);
            return;
        }

        self.movement_time += 1;
        self.movement.time = self.movement_time;

        match opcode {
            ClientOpcode::MoveStartForward => self.movement.flags.insert(MovementFlags::FORWARD),
            ClientOpcode::MoveStartBackward => self.movement.flags.insert(MovementFlags::BACKWARD),
            ClientOpcode::MoveStop => self
                .movement
                .flags
                .remove(MovementFlags::FORWARD | MovementFlags::BACKWARD),
            ClientOpcode::MoveStartStrafeLeft => {
                self.movement.flags.insert(MovementFlags::STRAFE_LEFT)
            }
            ClientOpcode::MoveStartStrafeRight => {
                self.movement.flags.insert(MovementFlags::STRAFE_RIGHT)
            }
            ClientOpcode::MoveStopStrafe => self
                .movement
                .flags
                .remove(MovementFlags::STRAFE_LEFT | MovementFlags::STRAFE_RIGHT),
            ClientOpcode::MoveJump => self.movement.flags.insert(MovementFlags::FALLING),
            ClientOpcode::MoveStartTurnLeft => self.movement.flags.insert(MovementFlags::TURN_LEFT),
            ClientOpcode::MoveStartTurnRight => {
                self.movement.flags.insert(MovementFlags::TURN_RIGHT)
            }
            ClientOpcode::MoveStopTurn => self
                .movement
                .flags
                .remove(MovementFlags::TURN_LEFT | MovementFlags::TURN_RIGHT),
            ClientOpcode::MoveFallLand => self.movement.flags.remove(MovementFlags::FALLING),
            // Heartbeat and facing report the current pose unchanged.
            _ => {}
        }

        debug!(target: "session", "Sending movement: {:?}", opcode);
        let mut w = PacketWriter::new();
        self.movement.write(&mut w);
        let payload = w.into_inner();
        self.send_frame(opcode, &payload);
    }

    /// Update the local pose the next movement frame will carry.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.movement.x = x;
        self.movement.y = y;
        self.movement.z = z;
    }

    pub fn set_orientation(&mut self, orientation: f32) {
        self.movement.orientation = orientation;
    }

    pub fn set_target(&mut self, guid: Guid) {
        self.targeting.set_target(guid);
    }

    pub fn clear_target(&mut self) {
        self.targeting.clear_target();
    }

    /// Cycle to the next nearby unit or player, nearest first.
    pub fn tab_target(&mut self) {
        let (x, y, z) = (self.movement.x, self.movement.y, self.movement.z);
        self.targeting.tab_target(&self.entities, x, y, z);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|t| t.is_connected())
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Last `max` chat lines, oldest first. Zero means everything.
    pub fn chat_history(&self, max: usize) -> Vec<&ChatEntry> {
        self.chat.recent(max)
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn local_player(&self) -> Guid {
        self.local_player
    }

    pub fn target(&self) -> Guid {
        self.targeting.target()
    }

    pub fn target_entity(&self) -> Option<&Entity> {
        let guid = self.targeting.target();
        if guid.is_zero() {
            return None;
        }
        self.entities.get(guid)
    }

    pub fn movement(&self) -> &MovementInfo {
        &self.movement
    }

    pub fn motd(&self) -> &[String] {
        &self.motd
    }

    /// Round-trip estimate from the most recent heartbeat, in milliseconds.
    pub fn latency_ms(&self) -> u32 {
        self.last_latency
    }

    fn prepare(
        &mut self,
        session_key: &[u8],
        account: &str,
        build: u32,
    ) -> Result<(), SessionError> {
        if session_key.len() != SESSION_KEY_LEN {
            error!(
                target: "session",
                "Invalid session key size: {} (expected {})",
                session_key.len(),
                SESSION_KEY_LEN,
            );
            self.fail("Invalid session key");
            return Err(ProtocolError::BadSessionKey {
                expected: SESSION_KEY_LEN,
                actual: session_key.len(),
            }
            .into());
        }

        let table = match OpcodeTable::for_build(build) {
            Ok(table) => table,
            Err(e) => {
                error!(target: "session", "Unsupported build {}: {}", build, e);
                self.fail("Unsupported build");
                return Err(e.into());
            }
        };

        // The server hashes the uppercased account name.
        self.account = account.to_uppercase();
        self.session_key = session_key.to_vec();
        self.build = build;
        self.opcodes = Some(table);
        self.client_seed = self.rng.gen_range(1..=u32::MAX);
        debug!(target: "session", "Generated client seed: 0x{:08X}", self.client_seed);

        self.characters.clear();
        self.local_player = Guid::ZERO;
        self.entities = EntityManager::new();
        self.targeting = TargetCycler::new();
        self.movement = MovementInfo::default();
        self.movement_time = 0;
        self.server_seed = 0;
        self.time_since_last_ping = 0.0;
        self.ping_sequence = 0;
        self.ping_sent_at = 0.0;
        self.last_latency = 0;
        Ok(())
    }

    fn adopt_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
        self.assembler = FrameAssembler::new();
        self.crypto = HeaderCrypto::new();
        self.set_state(SessionState::Connected);
        info!(target: "session", "Connected to world server, waiting for auth challenge");
    }

    fn pump_frames(&mut self) {
        let bytes = match self.transport.as_mut() {
            Some(transport) => transport.drain_received(),
            None => return,
        };
        if !bytes.is_empty() {
            self.assembler.feed(&bytes);
        }

        loop {
            match self.assembler.next_frame(&mut self.crypto) {
                Ok(Some(frame)) => self.handle_frame(frame),
                Ok(None) => break,
                Err(e) => {
                    // Usually cipher desync. Later headers will keep
                    // failing until the peer reconnects.
                    warn!(target: "net", "Dropped malformed frame header: {}", e);
                }
            }
        }
    }

    fn send_ping(&mut self) {
        if self.state != SessionState::InWorld {
            return;
        }

        self.ping_sequence += 1;
        self.ping_sent_at = self.clock;
        debug!(target: "session", "Sending heartbeat ping, sequence {}", self.ping_sequence);

        let mut w = PacketWriter::new();
        Ping {
            sequence: self.ping_sequence,
            latency: self.last_latency,
        }
        .write(&mut w);
        let payload = w.into_inner();
        self.send_frame(ClientOpcode::Ping, &payload);
    }

    fn send_frame(&mut self, opcode: ClientOpcode, payload: &[u8]) {
        let Some(table) = self.opcodes else {
            warn!(target: "net", "No opcode table, dropping {:?}", opcode);
            return;
        };

        let frame = match encode_client_frame(table.client_wire(opcode), payload, &mut self.crypto)
        {
            Ok(frame) => frame,
            Err(e) => {
                warn!(target: "net", "Failed to encode {:?}: {}", opcode, e);
                return;
            }
        };

        if let Some(transport) = self.transport.as_mut() {
            if let Err(e) = transport.send(frame) {
                warn!(target: "net", "Failed to send {:?}: {}", opcode, e);
            }
        }
    }

    fn local_character_name(&self) -> String {
        self.characters
            .iter()
            .find(|c| c.guid == self.local_player)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| self.account.clone())
    }

    fn set_state(&mut self, new_state: SessionState) {
        if self.state != new_state {
            debug!(target: "session", "World state: {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
        }
    }

    fn fail(&mut self, reason: &str) {
        error!(target: "session", "World connection failed: {}", reason);
        self.set_state(SessionState::Failed);
        if let Some(callback) = self.on_failure.as_mut() {
            callback(reason);
        }
    }
}

impl Default for WorldSession {
    fn default() -> Self {
        Self::new()
    }
}

fn is_movement_opcode(opcode: ClientOpcode) -> bool {
    matches!(
        opcode,
        ClientOpcode::MoveStartForward
            | ClientOpcode::MoveStartBackward
            | ClientOpcode::MoveStop
            | ClientOpcode::MoveStartStrafeLeft
            | ClientOpcode::MoveStartStrafeRight
            | ClientOpcode::MoveStopStrafe
            | ClientOpcode::MoveJump
            | ClientOpcode::MoveStartTurnLeft
            | ClientOpcode::MoveStartTurnRight
            | ClientOpcode::MoveStopTurn
            | ClientOpcode::MoveSetFacing
            | ClientOpcode::MoveHeartbeat
            | ClientOpcode::MoveFallLand
    )
}
