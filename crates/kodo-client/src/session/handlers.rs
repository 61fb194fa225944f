//! Server frame handlers.
//!
//! Dispatch is gated by session state: a frame arriving in a state that
//! does not expect it is logged and dropped. Parse failures abort only
//! the offending frame, never the connection.

use chrono::Utc;
use kodo_protocol::messages::{
    AccountDataTimes, AuthChallenge, AuthResponse, AuthSession, CharEnum, ChatMessageIn,
    DestroyObject, LoginVerifyWorld, Motd, MovementInfo, Pong, UpdateObject,
};
use kodo_protocol::{
    session_proof, ClientOpcode, PacketReader, PacketWriter, ServerFrame, ServerOpcode,
};
use tracing::{debug, info, warn};

use crate::chat::ChatEntry;
use crate::entities::EntityKind;
use crate::session::{SessionState, WorldSession};

impl WorldSession {
    pub(super) fn handle_frame(&mut self, frame: ServerFrame) {
        let Some(table) = self.opcodes else {
            return;
        };
        let Some(opcode) = table.decode_server(frame.opcode) else {
            warn!(target: "net", "Unhandled world opcode: 0x{:04X}", frame.opcode);
            return;
        };

        debug!(target: "net", "Received {:?}, {} bytes", opcode, frame.payload.len());

        match opcode {
            ServerOpcode::AuthChallenge => {
                if self.state == SessionState::Connected {
                    self.handle_auth_challenge(&frame.payload);
                } else {
                    warn!(target: "session", "Unexpected auth challenge in state: {:?}", self.state);
                }
            }
            ServerOpcode::AuthResponse => {
                if self.state == SessionState::AuthSent {
                    self.handle_auth_response(&frame.payload);
                } else {
                    warn!(target: "session", "Unexpected auth response in state: {:?}", self.state);
                }
            }
            ServerOpcode::CharEnum => {
                if self.state == SessionState::CharListRequested {
                    self.handle_char_enum(&frame.payload);
                } else {
                    warn!(target: "session", "Unexpected character list in state: {:?}", self.state);
                }
            }
            ServerOpcode::LoginVerifyWorld => {
                if self.state == SessionState::EnteringWorld {
                    self.handle_login_verify_world(&frame.payload);
                } else {
                    warn!(
                        target: "session",
                        "Unexpected world-entry confirmation in state: {:?}",
                        self.state,
                    );
                }
            }
            ServerOpcode::AccountDataTimes => self.handle_account_data_times(&frame.payload),
            ServerOpcode::Motd => self.handle_motd(&frame.payload),
            ServerOpcode::Pong => self.handle_pong(&frame.payload),
            ServerOpcode::UpdateObject => {
                if self.state == SessionState::InWorld {
                    self.handle_update_object(&frame.payload);
                }
            }
            ServerOpcode::DestroyObject => {
                if self.state == SessionState::InWorld {
                    self.handle_destroy_object(&frame.payload);
                }
            }
            ServerOpcode::MessageChat => {
                if self.state == SessionState::InWorld {
                    self.handle_message_chat(&frame.payload);
                }
            }
        }
    }

    fn handle_auth_challenge(&mut self, payload: &[u8]) {
        info!(target: "session", "Handling auth challenge");

        let mut r = PacketReader::new(payload);
        let challenge = match AuthChallenge::parse(&mut r) {
            Ok(challenge) => challenge,
            Err(e) => {
                warn!(target: "session", "Failed to parse auth challenge: {}", e);
                return;
            }
        };

        self.server_seed = challenge.server_seed;
        debug!(target: "session", "Server seed: 0x{:08X}", self.server_seed);
        self.set_state(SessionState::ChallengeReceived);
        self.send_auth_session();
    }

    fn send_auth_session(&mut self) {
        info!(target: "session", "Sending auth session");

        let proof = session_proof(
            &self.account,
            self.client_seed,
            self.server_seed,
            &self.session_key,
        );
        let payload = {
            let mut w = PacketWriter::new();
            AuthSession {
                build: self.build,
                account: &self.account,
                client_seed: self.client_seed,
                proof,
            }
            .write(&mut w);
            w.into_inner()
        };

        // Ordering is load-bearing: the auth frame itself travels with a
        // plaintext header, everything after it is enciphered.
        self.send_frame(ClientOpcode::AuthSession, &payload);
        self.set_state(SessionState::AuthSent);

        if let Err(e) = self.crypto.arm(&self.session_key) {
            let reason = format!("Header cipher init failed: {}", e);
            self.fail(&reason);
            return;
        }
        info!(target: "session", "Auth session sent, header cipher armed");
    }

    fn handle_auth_response(&mut self, payload: &[u8]) {
        info!(target: "session", "Handling auth response");

        let mut r = PacketReader::new(payload);
        let response = match AuthResponse::parse(&mut r) {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "session", "Failed to parse auth response: {}", e);
                return;
            }
        };

        if !response.result.is_success() {
            let reason = format!("Authentication failed: {}", response.result.description());
            self.fail(&reason);
            return;
        }

        self.set_state(SessionState::Authenticated);
        info!(target: "session", "World authentication successful");
        self.set_state(SessionState::Ready);

        if let Some(callback) = self.on_success.as_mut() {
            callback();
        }
    }

    fn handle_char_enum(&mut self, payload: &[u8]) {
        info!(target: "session", "Handling character list");

        let mut r = PacketReader::new(payload);
        let roster = match CharEnum::parse(&mut r) {
            Ok(roster) => roster,
            Err(e) => {
                warn!(target: "session", "Failed to parse character list: {}", e);
                return;
            }
        };

        self.characters = roster.characters;
        self.set_state(SessionState::CharListReceived);

        info!(target: "session", "Received {} character(s)", self.characters.len());
        for character in &self.characters {
            info!(
                target: "session",
                "  {} - level {} {} {} ({})",
                character.name,
                character.level,
                character.race_name(),
                character.class_name(),
                character.guid,
            );
        }
    }

    fn handle_login_verify_world(&mut self, payload: &[u8]) {
        info!(target: "session", "Handling world-entry confirmation");

        let mut r = PacketReader::new(payload);
        let entry = match LoginVerifyWorld::parse(&mut r) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(target: "session", "Failed to parse world-entry confirmation: {}", e);
                return;
            }
        };

        self.set_state(SessionState::InWorld);
        info!(
            target: "session",
            "Entered world: map {}, position ({}, {}, {})",
            entry.map, entry.x, entry.y, entry.z,
        );

        self.movement = MovementInfo {
            x: entry.x,
            y: entry.y,
            z: entry.z,
            orientation: entry.orientation,
            ..Default::default()
        };
        self.movement_time = 0;
        self.time_since_last_ping = 0.0;
    }

    fn handle_account_data_times(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        match AccountDataTimes::parse(&mut r) {
            Ok(times) => {
                debug!(
                    target: "session",
                    "Account data times received (server time: {})",
                    times.server_time,
                );
            }
            Err(e) => {
                warn!(target: "session", "Failed to parse account data times: {}", e);
            }
        }
    }

    fn handle_motd(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        let motd = match Motd::parse(&mut r) {
            Ok(motd) => motd,
            Err(e) => {
                warn!(target: "session", "Failed to parse message of the day: {}", e);
                return;
            }
        };

        for line in &motd.lines {
            info!(target: "session", "MOTD: {}", line);
        }
        self.motd = motd.lines;
    }

    fn handle_pong(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        let pong = match Pong::parse(&mut r) {
            Ok(pong) => pong,
            Err(e) => {
                warn!(target: "session", "Failed to parse pong: {}", e);
                return;
            }
        };

        if pong.sequence != self.ping_sequence {
            warn!(
                target: "session",
                "Pong sequence mismatch: expected {}, got {}",
                self.ping_sequence, pong.sequence,
            );
            return;
        }

        self.last_latency = ((self.clock - self.ping_sent_at) * 1000.0).max(0.0) as u32;
        debug!(
            target: "session",
            "Heartbeat acknowledged, sequence {}, {} ms",
            pong.sequence, self.last_latency,
        );
    }

    fn handle_update_object(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        let batch = match UpdateObject::parse(&mut r) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(target: "world", "Failed to parse update batch: {}", e);
                return;
            }
        };

        let summary = self.entities.apply_batch(&batch);
        if summary.membership_changed() {
            self.targeting.invalidate();
        }
        debug!(
            target: "world",
            "Update batch: {} created, {} updated, {} removed, {} skipped; {} entities",
            summary.created,
            summary.updated,
            summary.removed,
            summary.skipped,
            self.entities.len(),
        );
    }

    fn handle_destroy_object(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        let destroy = match DestroyObject::parse(&mut r) {
            Ok(destroy) => destroy,
            Err(e) => {
                warn!(target: "world", "Failed to parse destroy object: {}", e);
                return;
            }
        };

        if self.entities.remove(destroy.guid).is_some() {
            info!(
                target: "world",
                "Destroyed entity: {} ({})",
                destroy.guid,
                if destroy.is_death { "death" } else { "despawn" },
            );
            self.targeting.invalidate();
        } else {
            warn!(target: "world", "Destroy object for unknown entity: {}", destroy.guid);
        }
    }

    fn handle_message_chat(&mut self, payload: &[u8]) {
        let mut r = PacketReader::new(payload);
        let message = match ChatMessageIn::parse(&mut r) {
            Ok(message) => message,
            Err(e) => {
                warn!(target: "session", "Failed to parse chat message: {}", e);
                return;
            }
        };

        let sender = self.resolve_chat_sender(&message);
        match &message.channel_name {
            Some(channel) => info!(
                target: "session",
                "[{}] [{}] {}: {}",
                message.chat_type.label(),
                channel,
                sender,
                message.message,
            ),
            None => info!(
                target: "session",
                "[{}] {}: {}",
                message.chat_type.label(),
                sender,
                message.message,
            ),
        }

        self.chat.push(ChatEntry {
            chat_type: message.chat_type,
            sender_guid: message.sender_guid,
            sender,
            channel: message.channel_name,
            text: message.message,
            language: message.language,
            chat_tag: message.chat_tag,
            received_at: Utc::now(),
        });
    }

    fn resolve_chat_sender(&self, message: &ChatMessageIn) -> String {
        if let Some(name) = &message.sender_name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        if message.sender_guid.is_zero() {
            return "System".to_string();
        }
        match self.entities.get(message.sender_guid) {
            Some(entity) if matches!(entity.kind, EntityKind::Player { .. }) => {
                match entity.name() {
                    Some(name) => name.to_string(),
                    None => format!("Player-{}", message.sender_guid.raw()),
                }
            }
            _ => format!("Unknown-{}", message.sender_guid.raw()),
        }
    }
}
