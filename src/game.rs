use macroquad::prelude::*;
use ::rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::collision::{self, shapes_touch, Sides};
use crate::combat::{self, roll_drop, DamageSource, Hit, HurtOutcome};
use crate::config::{GameConfig, RoomLayout};
use crate::creatures::{spawn_blob, spawn_mosquito};
use crate::entity::{
    Entity, EntityContext, EntityId, EntityKind, Group, PlayerTarget, Team, World,
};
use crate::error::GameResult;
use crate::geometry::Shape;
use crate::input::InputState;
use crate::items::{spawn_pickup, PickupPhase};
use crate::player::spawn_player;
use crate::projectile::{spawn_tear, TearSpawn};
use crate::room::{
    entry_position, plan_room, system_entropy, EnemySpawn, EntryRequirement, Room, RoomCoord,
    SeedBook, Side,
};
use crate::sprites::{MaskBank, SpriteKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

/// Owns the world and runs one frame at a time.
pub struct Game {
    config: GameConfig,
    layout: RoomLayout,
    masks: MaskBank,
    world: World,
    room: Room,
    seeds: SeedBook,
    player: EntityId,
    rng: ChaCha8Rng,
    entropy: Box<dyn FnMut() -> u64>,
    status: GameStatus,
    frame: u64,
}

impl Game {
    pub fn new(config: GameConfig, layout: RoomLayout, masks: MaskBank) -> GameResult<Self> {
        Self::with_entropy(config, layout, masks, Box::new(system_entropy))
    }

    /// Builds a session whose randomness is drawn from `entropy`.
    pub fn with_entropy(
        config: GameConfig,
        layout: RoomLayout,
        masks: MaskBank,
        mut entropy: Box<dyn FnMut() -> u64>,
    ) -> GameResult<Self> {
        let rng = ChaCha8Rng::seed_from_u64(entropy());
        let mut world = World::new();
        let player = spawn_player(&mut world, &masks, &config, Vec2::from(config.player.spawn))?;

        let mut seeds = SeedBook::default();
        let plan = plan_room(
            RoomCoord::ORIGIN,
            EntryRequirement::Any,
            &mut seeds,
            entropy.as_mut(),
            &layout,
            &config,
        )?;
        let room = Room::build(&plan, &mut world, &masks, &layout, &config)?;

        Ok(Self {
            config,
            layout,
            masks,
            world,
            room,
            seeds,
            player,
            rng,
            entropy,
            status: GameStatus::Playing,
            frame: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn layout(&self) -> &RoomLayout {
        &self.layout
    }

    pub fn masks(&self) -> &MaskBank {
        &self.masks
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn seeds(&self) -> &SeedBook {
        &self.seeds
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player(&self) -> Option<&Entity> {
        self.world.get(self.player)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Rooms visited beyond the first.
    pub fn rooms_cleared(&self) -> usize {
        self.seeds.len().saturating_sub(1)
    }

    /// Advances the session by one frame.
    pub fn update(&mut self, input: &InputState) -> GameResult<()> {
        if self.status == GameStatus::GameOver {
            return Ok(());
        }
        self.frame += 1;
        self.apply_input(input);
        self.update_entities()?;
        self.resolve_contacts()?;
        self.advance_room()
    }

    fn apply_input(&mut self, input: &InputState) {
        let Some(player) = self.world.get_mut(self.player) else {
            return;
        };
        if player.is_killed() {
            return;
        }
        if let EntityKind::Player(state) = &mut player.kind {
            state.apply_input(input);
        }
    }

    fn player_target(&self) -> Option<PlayerTarget> {
        let player = self.player().filter(|player| !player.is_killed())?;
        Some(PlayerTarget {
            id: player.id,
            pos: player.pos,
            hitbox: player.tight_rect().ok()?,
        })
    }

    fn update_entities(&mut self) -> GameResult<()> {
        let mut ctx = EntityContext {
            player: self.player_target(),
            config: &self.config,
            masks: &self.masks,
            rng: &mut self.rng,
            tear_spawns: Vec::new(),
        };
        let mut spent_tears = Vec::new();
        let mut expired_items = Vec::new();

        for id in self.world.ids() {
            let Some(entity) = self.world.get_mut(id) else {
                continue;
            };
            if let Some(health) = entity.health.as_mut() {
                health.tick(self.config.combat.hurt_step);
            }
            if entity.is_killed() {
                continue;
            }

            match entity.kind {
                EntityKind::Player(mut state) => {
                    state.update(entity, &mut ctx)?;
                    entity.kind = EntityKind::Player(state);
                }
                EntityKind::Blob(mut brain) => {
                    brain.update(entity, &mut ctx)?;
                    entity.kind = EntityKind::Blob(brain);
                }
                EntityKind::Mosquito(mut brain) => {
                    brain.update(entity, &mut ctx)?;
                    entity.kind = EntityKind::Mosquito(brain);
                }
                EntityKind::Tear(mut projectile) => {
                    if projectile.step(&mut entity.pos) {
                        spent_tears.push(id);
                    }
                    entity.kind = EntityKind::Tear(projectile);
                }
                EntityKind::Pickup(mut pickup) => {
                    if pickup.tick(&self.config.pickups) == PickupPhase::Expired {
                        expired_items.push(id);
                    }
                    entity.invisible = !pickup.is_visible();
                    entity.kind = EntityKind::Pickup(pickup);
                }
                EntityKind::Rock | EntityKind::Wall => {}
            }
        }

        let spawns = std::mem::take(&mut ctx.tear_spawns);
        for spawn in spawns {
            spawn_tear(&mut self.world, &self.masks, &self.config.tears, spawn)?;
        }
        for id in spent_tears {
            if let Some(tear) = self.world.get_mut(id) {
                tear.kill(&self.config.combat);
            }
        }
        for id in expired_items {
            self.world.despawn(id);
            debug!(?id, "pickup expired");
        }
        Ok(())
    }

    fn resolve_contacts(&mut self) -> GameResult<()> {
        let report = collision::resolve(&mut self.world, self.config.collision.edge_band)?;
        for id in &report.stopped {
            if let Some(tear) = self.world.get_mut(*id) {
                tear.kill(&self.config.combat);
            }
        }

        let mut hits = report.hits;
        hits.extend(self.mosquito_stings()?);
        for hit in &hits {
            if combat::apply_hit(&mut self.world, hit, &self.config.combat) == HurtOutcome::Killed {
                self.on_death(hit.target)?;
            }
        }

        self.collect_pickups()?;

        for id in combat::advance_explosions(&mut self.world) {
            if id == self.player {
                if self.status != GameStatus::GameOver {
                    info!(
                        rooms_cleared = self.rooms_cleared(),
                        frame = self.frame,
                        "game over"
                    );
                }
                self.status = GameStatus::GameOver;
            } else {
                self.world.despawn(id);
            }
        }
        self.room.prune_enemies(&self.world);
        Ok(())
    }

    /// Contact damage from mosquitoes whose attack has charged.
    fn mosquito_stings(&mut self) -> GameResult<Vec<Hit>> {
        let Some(player) = self.world.get(self.player).filter(|p| !p.is_killed()) else {
            return Ok(Vec::new());
        };
        let mut stings = Vec::new();
        for &id in self.world.group(Group::Creatures) {
            let Some(mosquito) = self.world.get(id).filter(|e| !e.is_killed()) else {
                continue;
            };
            let EntityKind::Mosquito(brain) = mosquito.kind else {
                continue;
            };
            if !brain.attack_ready() || !shapes_touch(mosquito, player)? {
                continue;
            }
            if let Some(source) = DamageSource::from_entity(mosquito) {
                stings.push(Hit {
                    source,
                    target: self.player,
                });
            }
        }

        for hit in &stings {
            if let Some(mosquito) = self.world.get_mut(hit.source.id) {
                if let EntityKind::Mosquito(brain) = &mut mosquito.kind {
                    brain.reset_attack();
                }
            }
        }
        Ok(stings)
    }

    fn on_death(&mut self, id: EntityId) -> GameResult<()> {
        let Some(entity) = self.world.get_mut(id) else {
            return Ok(());
        };
        info!(?id, kind = ?entity.role(), team = ?entity.team, "entity died");
        if !entity.spawns_items || entity.items_rolled {
            return Ok(());
        }
        entity.items_rolled = true;
        let center = entity.tight_rect()?.center();
        if let Some(kind) = roll_drop(&self.config.drops, &mut self.rng) {
            let item = spawn_pickup(&mut self.world, &self.masks, &self.config.pickups, kind, center)?;
            debug!(?item, ?kind, "dropped pickup");
        }
        Ok(())
    }

    fn collect_pickups(&mut self) -> GameResult<()> {
        let Some(player) = self.world.get(self.player).filter(|p| !p.is_killed()) else {
            return Ok(());
        };
        let mut grabbed = Vec::new();
        for &id in self.world.group(Group::Items) {
            let Some(item) = self.world.get(id) else {
                continue;
            };
            let EntityKind::Pickup(pickup) = item.kind else {
                continue;
            };
            if shapes_touch(item, player)? {
                grabbed.push((id, pickup.kind));
            }
        }

        for (id, kind) in grabbed {
            self.world.despawn(id);
            let amount = kind.heal_amount(&self.config.pickups);
            if let Some(health) = self
                .world
                .get_mut(self.player)
                .and_then(|player| player.health.as_mut())
            {
                health.heal(amount);
                debug!(?kind, health = health.health(), "pickup grabbed");
            }
        }
        Ok(())
    }

    fn advance_room(&mut self) -> GameResult<()> {
        self.room.update_doors();
        let Some(player) = self.player().filter(|p| !p.is_killed()) else {
            return Ok(());
        };
        let hitbox = player.tight_rect()?;
        if let Some(side) = self.room.check_transition(&hitbox) {
            let next = self.room.coord.neighbor(side);
            info!(from = ?self.room.coord, to = ?next, side = side.name(), "leaving room");
            self.enter_room(next, side.opposite())?;
        }
        Ok(())
    }

    /// Replaces the current room with the one at `coord`, entered through `entry`.
    pub fn enter_room(&mut self, coord: RoomCoord, entry: Side) -> GameResult<()> {
        let plan = plan_room(
            coord,
            EntryRequirement::Door(entry),
            &mut self.seeds,
            self.entropy.as_mut(),
            &self.layout,
            &self.config,
        )?;
        self.world.clear_except(self.player);
        self.room = Room::build(&plan, &mut self.world, &self.masks, &self.layout, &self.config)?;

        let Some(player) = self.world.get_mut(self.player) else {
            warn!("player missing while entering {coord:?}");
            return Ok(());
        };
        let local = player.shape()?.local_tight();
        player.pos = entry_position(entry, &self.layout, local);
        player.blocked = Sides::NONE;
        Ok(())
    }

    pub fn spawn_enemy(&mut self, spawn: EnemySpawn) -> GameResult<EntityId> {
        let id = match spawn {
            EnemySpawn::Blob(pos) => spawn_blob(&mut self.world, &self.masks, &self.config, pos)?,
            EnemySpawn::Mosquito(size, pos) => {
                spawn_mosquito(&mut self.world, &self.masks, &self.config, size, pos)?
            }
        };
        self.room.enemies.push(id);
        self.room.close_doors();
        Ok(id)
    }

    pub fn spawn_tear(&mut self, spawn: TearSpawn) -> GameResult<EntityId> {
        spawn_tear(&mut self.world, &self.masks, &self.config.tears, spawn)
    }

    pub fn spawn_rock(&mut self, pos: Vec2) -> GameResult<EntityId> {
        let shape = self
            .masks
            .shape(SpriteKey::Rock, 0)?
            .unwrap_or_else(|| Shape::rect(64.0, 56.0));
        let id = self.world.spawn(Group::Obstacles, |id| {
            Entity::new(id, EntityKind::Rock, Team::Neutral, pos, SpriteKey::Rock, Some(shape))
        })?;
        self.room.obstacles.push(id);
        Ok(id)
    }

    /// Removes every rock and enemy, leaving walls, doors, and the player.
    pub fn clear_room(&mut self) {
        let obstacles: Vec<EntityId> = self.room.obstacles.drain(..).collect();
        for id in obstacles {
            let is_wall = self
                .world
                .get(id)
                .is_some_and(|e| matches!(e.kind, EntityKind::Wall));
            if is_wall {
                self.room.obstacles.push(id);
            } else {
                self.world.despawn(id);
            }
        }
        for id in self.room.enemies.drain(..) {
            self.world.despawn(id);
        }
    }
}
