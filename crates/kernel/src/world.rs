use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use waywalk_common::{Aabb, EntityId, Transform};
use waywalk_walker::{Scenario, Walker, WalkerCommand};

/// An event record produced by every mutation to the world.
///
/// The log is enough to rebuild every transform; walkers themselves are not
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Entity was spawned with the given transform and bounds.
    Spawned {
        id: EntityId,
        transform: Transform,
        half_extents: Vec3,
    },
    /// Entity was despawned, along with any walker driving it.
    Despawned { id: EntityId, transform: Transform },
    /// Entity transform was set from outside the walker.
    TransformUpdated {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
    /// A walker took over the entity, which was placed at the base pose.
    WalkerAttached { id: EntityId, transform: Transform },
    /// The walker was removed; the entity stays where it is.
    WalkerDetached { id: EntityId },
    /// The agent's walker produced a command this tick and it was applied.
    Advanced { id: EntityId, command: WalkerCommand },
    /// The agent waited this tick because its yield zone was occupied.
    Held { id: EntityId },
    /// Simulation advanced one tick.
    Stepped { tick: u64 },
}

/// Errors from world operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("entity {0:?} not found")]
    EntityNotFound(EntityId),
    #[error("entity {0:?} has no walker")]
    NotAnAgent(EntityId),
    #[error("step distance must be positive and finite, got {0}")]
    InvalidStep(f64),
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub transform: Transform,
    /// Half size of the local bounding box, before scale.
    pub half_extents: Vec3,
}

impl EntityData {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_transform(&self.transform, self.half_extents)
    }
}

/// Zone an agent must not walk into while `watch` occupies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldZone {
    pub zone: Aabb,
    pub watch: EntityId,
}

/// A walking entity: its walker, step per tick and optional yield zone.
#[derive(Debug, Clone)]
pub struct Agent {
    walker: Walker,
    step_distance: f64,
    yield_zone: Option<YieldZone>,
}

impl Agent {
    pub fn walker(&self) -> &Walker {
        &self.walker
    }

    pub fn step_distance(&self) -> f64 {
        self.step_distance
    }

    pub fn yield_zone(&self) -> Option<&YieldZone> {
        self.yield_zone.as_ref()
    }
}

/// Headless scene state.
///
/// Stands in for a renderer's scene graph: `step` is the per-frame callback.
/// Uses BTreeMap so agents are advanced in the same order on every run.
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    agents: BTreeMap<EntityId, Agent>,
    tick: u64,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities driven by a walker.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    /// Spawn a new entity. Returns its id.
    pub fn spawn(&mut self, transform: Transform, half_extents: Vec3) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, transform, half_extents);
        id
    }

    /// Spawn an entity with a specific id (used for replay).
    pub fn spawn_with_id(&mut self, id: EntityId, transform: Transform, half_extents: Vec3) {
        self.entities.insert(
            id,
            EntityData {
                transform,
                half_extents,
            },
        );
        self.event_log.push(WorldEvent::Spawned {
            id,
            transform,
            half_extents,
        });
    }

    /// Spawn an agent walking `scenario`.
    ///
    /// The scenario's `yield_zone` is not applied: a zone needs an entity to
    /// watch. Use [`World::spawn_scenario_yielding_to`] for that.
    pub fn spawn_scenario(&mut self, scenario: &Scenario) -> Result<EntityId, WorldError> {
        let id = self.spawn(scenario.base_transform(), scenario.half_extents);
        self.attach_walker(id, scenario.walker(), scenario.step_distance)?;
        Ok(id)
    }

    /// Spawn an agent walking `scenario` that waits for `watch` whenever the
    /// scenario's yield zone is occupied. Same as [`World::spawn_scenario`]
    /// when the scenario has no zone.
    pub fn spawn_scenario_yielding_to(
        &mut self,
        scenario: &Scenario,
        watch: EntityId,
    ) -> Result<EntityId, WorldError> {
        if !self.entities.contains_key(&watch) {
            return Err(WorldError::EntityNotFound(watch));
        }
        let id = self.spawn_scenario(scenario)?;
        if let Some(zone) = scenario.yield_zone {
            self.set_yield_zone(id, zone, watch)?;
        }
        Ok(id)
    }

    /// Remove an entity and its walker. Returns the data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id);
        if let Some(ref d) = data {
            self.agents.remove(&id);
            self.event_log.push(WorldEvent::Despawned {
                id,
                transform: d.transform,
            });
        }
        data
    }

    /// Get a reference to entity data.
    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Get the agent driving an entity, if any.
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Update an entity's transform from outside and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> Result<(), WorldError> {
        let data = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        let old = data.transform;
        data.transform = new;
        self.event_log
            .push(WorldEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    /// Let `walker` drive entity `id`, moving `step_distance` per tick.
    ///
    /// The entity is placed at the walker's base pose (scale kept). Any
    /// previous walker on the entity is replaced.
    pub fn attach_walker(
        &mut self,
        id: EntityId,
        walker: Walker,
        step_distance: f64,
    ) -> Result<(), WorldError> {
        if !(step_distance.is_finite() && step_distance > 0.0) {
            return Err(WorldError::InvalidStep(step_distance));
        }
        let data = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        let base = walker.base_pose();
        data.transform.set_pose(base.position, base.orientation);
        let transform = data.transform;

        tracing::debug!(
            entity = %id.short(),
            legs = walker.leg_count(),
            step_distance,
            "walker attached"
        );
        self.agents.insert(
            id,
            Agent {
                walker,
                step_distance,
                yield_zone: None,
            },
        );
        self.event_log
            .push(WorldEvent::WalkerAttached { id, transform });
        Ok(())
    }

    /// Stop driving an entity. Returns its walker.
    pub fn detach_walker(&mut self, id: EntityId) -> Option<Walker> {
        let agent = self.agents.remove(&id)?;
        self.event_log.push(WorldEvent::WalkerDetached { id });
        Some(agent.walker)
    }

    /// Make agent `id` wait whenever `watch` occupies `zone` and the agent is
    /// not already inside it.
    pub fn set_yield_zone(
        &mut self,
        id: EntityId,
        zone: Aabb,
        watch: EntityId,
    ) -> Result<(), WorldError> {
        if !self.entities.contains_key(&watch) {
            return Err(WorldError::EntityNotFound(watch));
        }
        let agent = self.agents.get_mut(&id).ok_or(WorldError::NotAnAgent(id))?;
        agent.yield_zone = Some(YieldZone { zone, watch });
        Ok(())
    }

    /// Whether agent `id` must wait this tick. A missing watched entity never
    /// blocks.
    fn must_yield(&self, id: EntityId) -> bool {
        let Some(YieldZone { zone, watch }) = self.agents.get(&id).and_then(|a| a.yield_zone)
        else {
            return false;
        };
        let (Some(agent), Some(other)) = (self.entities.get(&id), self.entities.get(&watch)) else {
            return false;
        };
        other.bounds().intersects(&zone) && !agent.bounds().intersects(&zone)
    }

    /// Advance the simulation by one tick: every agent either waits or
    /// advances its walker once and has the command applied to its transform.
    pub fn step(&mut self) {
        self.tick += 1;
        let _span = tracing::info_span!("world_step", tick = self.tick).entered();

        let ids: Vec<EntityId> = self.agents.keys().copied().collect();
        for id in ids {
            if self.must_yield(id) {
                tracing::trace!(entity = %id.short(), "yielding");
                self.event_log.push(WorldEvent::Held { id });
                continue;
            }
            let (Some(agent), Some(data)) = (self.agents.get_mut(&id), self.entities.get_mut(&id))
            else {
                continue;
            };
            let command = agent.walker.advance(agent.step_distance);
            command.apply_to(&mut data.transform);
            if command.reset.is_some() {
                tracing::debug!(entity = %id.short(), "agent back at base pose");
            }
            self.event_log.push(WorldEvent::Advanced { id, command });
        }

        self.event_log.push(WorldEvent::Stepped { tick: self.tick });
    }

    /// Reconstruct entity state from a sequence of events.
    ///
    /// Walkers are not rebuilt: the result has the same transforms and tick
    /// but no agents.
    pub fn replay(events: &[WorldEvent]) -> Self {
        let mut world = Self::new();
        for event in events {
            match event {
                WorldEvent::Spawned {
                    id,
                    transform,
                    half_extents,
                } => {
                    world.entities.insert(
                        *id,
                        EntityData {
                            transform: *transform,
                            half_extents: *half_extents,
                        },
                    );
                }
                WorldEvent::Despawned { id, .. } => {
                    world.entities.remove(id);
                }
                WorldEvent::TransformUpdated { id, new: transform, .. }
                | WorldEvent::WalkerAttached { id, transform } => {
                    if let Some(data) = world.entities.get_mut(id) {
                        data.transform = *transform;
                    }
                }
                WorldEvent::Advanced { id, command } => {
                    if let Some(data) = world.entities.get_mut(id) {
                        command.apply_to(&mut data.transform);
                    }
                }
                WorldEvent::WalkerDetached { .. } | WorldEvent::Held { .. } => {}
                WorldEvent::Stepped { tick } => {
                    world.tick = *tick;
                }
            }
        }
        world
    }

    /// Compute a deterministic hash of the tick and every transform.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (id, data) in &self.entities {
            let t = &data.transform;
            mix(&mut h, id.0.as_bytes());
            for v in t
                .position
                .to_array()
                .into_iter()
                .chain(t.rotation.to_array())
                .chain(t.scale.to_array())
            {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}
