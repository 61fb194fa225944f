//! Tab-target cycling over the entity mirror.

use std::cmp::Ordering;

use kodo_protocol::Guid;
use tracing::info;

use crate::entities::EntityManager;

/// Cycling target selection ordered by distance from the local player.
///
/// The candidate list is cached between presses and rebuilt lazily once
/// the mirror's membership has changed. Explicit set/clear leave the
/// cache alone.
#[derive(Debug)]
pub struct TargetCycler {
    target: Guid,
    candidates: Vec<Guid>,
    cycle_index: Option<usize>,
    stale: bool,
}

impl Default for TargetCycler {
    fn default() -> Self {
        Self {
            target: Guid::ZERO,
            candidates: Vec::new(),
            cycle_index: None,
            stale: true,
        }
    }
}

impl TargetCycler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Guid {
        self.target
    }

    pub fn has_target(&self) -> bool {
        !self.target.is_zero()
    }

    /// Pick a target directly, bypassing the cycle.
    pub fn set_target(&mut self, guid: Guid) {
        if guid == self.target {
            return;
        }
        self.target = guid;
        if !guid.is_zero() {
            info!(target: "world", "Target set: {}", guid);
        }
    }

    /// Drop the current target and restart the cycle from the nearest
    /// candidate on the next press.
    pub fn clear_target(&mut self) {
        if !self.target.is_zero() {
            info!(target: "world", "Target cleared");
        }
        self.target = Guid::ZERO;
        self.cycle_index = None;
    }

    /// Mark the candidate cache for a rebuild on the next cycle press.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Advance to the next candidate by distance from `(x, y, z)`.
    /// An empty candidate list clears the current target instead.
    pub fn tab_target(&mut self, entities: &EntityManager, x: f32, y: f32, z: f32) {
        if self.stale {
            self.rebuild(entities, x, y, z);
        }

        if self.candidates.is_empty() {
            self.clear_target();
            return;
        }

        let next = match self.cycle_index {
            Some(i) => (i + 1) % self.candidates.len(),
            None => 0,
        };
        self.cycle_index = Some(next);
        self.set_target(self.candidates[next]);
    }

    fn rebuild(&mut self, entities: &EntityManager, x: f32, y: f32, z: f32) {
        self.candidates.clear();
        self.cycle_index = None;

        let mut sortable: Vec<(Guid, f32)> = entities
            .iter()
            .filter(|e| e.kind.is_targetable())
            .map(|e| {
                let dist = match e.position() {
                    Some((ex, ey, ez)) => {
                        let dx = ex - x;
                        let dy = ey - y;
                        let dz = ez - z;
                        (dx * dx + dy * dy + dz * dz).sqrt()
                    }
                    // No pose known, sort to the back.
                    None => f32::MAX,
                };
                (e.guid, dist)
            })
            .collect();

        sortable.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        self.candidates.extend(sortable.into_iter().map(|(guid, _)| guid));
        self.stale = false;
    }
}
