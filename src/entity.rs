use macroquad::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::collision::{ContactTracker, Sides};
use crate::combat::{DamageProfile, Explosion, Health, LifeState};
use crate::config::{CombatConfig, GameConfig};
use crate::creatures::{BlobState, MosquitoState};
use crate::error::{GameError, GameResult};
use crate::geometry::{offset_rect, Mask, Shape};
use crate::items::PickupState;
use crate::player::PlayerState;
use crate::projectile::{Projectile, TearSpawn};
use crate::sprites::{MaskBank, SpriteKey};

/// Stable handle; never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Team {
    Player,
    Enemy,
    Neutral,
}

/// Named collections, iterated in this order by the collision pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Obstacles,
    Creatures,
    Ammo,
    Items,
}

pub const PHYSICAL_GROUPS: [Group; 3] = [Group::Obstacles, Group::Creatures, Group::Ammo];

/// What an entity is, together with its per-kind runtime state.
#[derive(Clone, Copy, Debug)]
pub enum EntityKind {
    Player(PlayerState),
    Blob(BlobState),
    Mosquito(MosquitoState),
    Tear(Projectile),
    Rock,
    Wall,
    Pickup(PickupState),
}

/// How an entity takes part in contact dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Creature,
    Obstacle,
    Projectile,
    Pickup,
}

impl EntityKind {
    pub fn role(&self) -> Role {
        match self {
            Self::Player(_) | Self::Blob(_) | Self::Mosquito(_) => Role::Creature,
            Self::Rock | Self::Wall => Role::Obstacle,
            Self::Tear(_) => Role::Projectile,
            Self::Pickup(_) => Role::Pickup,
        }
    }

    pub fn is_solid(&self) -> bool {
        !matches!(self.role(), Role::Pickup)
    }

    pub fn explosion_scale(&self) -> f32 {
        match self {
            Self::Player(_) => 0.8,
            Self::Blob(_) => 0.7,
            Self::Mosquito(state) => state.size().explosion_scale(),
            Self::Tear(_) => 0.3,
            Self::Rock | Self::Wall | Self::Pickup(_) => 0.0,
        }
    }
}

/// Observable combat state of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Healthy,
    Hurt,
    Dying,
}

pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub team: Team,
    pub pos: Vec2,
    pub sprite: SpriteKey,
    pub frame: usize,
    shape: Option<Shape>,
    pub health: Option<Health>,
    pub damage: Option<DamageProfile>,
    pub spawns_items: bool,
    pub items_rolled: bool,
    pub life: LifeState,
    pub invisible: bool,
    pub contacts: ContactTracker,
    pub blocked: Sides,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        team: Team,
        pos: Vec2,
        sprite: SpriteKey,
        shape: Option<Shape>,
    ) -> GameResult<Self> {
        if kind.is_solid() && shape.is_none() {
            return Err(GameError::MissingCollisionShape(id));
        }
        Ok(Self {
            id,
            kind,
            team,
            pos,
            sprite,
            frame: 0,
            shape,
            health: None,
            damage: None,
            spawns_items: false,
            items_rolled: false,
            life: LifeState::Alive,
            invisible: false,
            contacts: ContactTracker::default(),
            blocked: Sides::NONE,
        })
    }

    pub fn with_health(mut self, max_health: i32) -> Self {
        self.health = Some(Health::new(max_health));
        self
    }

    pub fn with_damage(mut self, damage: i32, one_shot: bool) -> Self {
        self.damage = Some(DamageProfile { damage, one_shot });
        self
    }

    pub fn with_drops(mut self) -> Self {
        self.spawns_items = true;
        self
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    pub fn can_deal_damage(&self) -> bool {
        self.damage.is_some()
    }

    pub fn is_killed(&self) -> bool {
        !matches!(self.life, LifeState::Alive)
    }

    pub fn condition(&self) -> Condition {
        match (&self.life, &self.health) {
            (LifeState::Dying(_), _) => Condition::Dying,
            (LifeState::Alive, Some(health)) if health.is_hurt() => Condition::Hurt,
            (LifeState::Alive, _) => Condition::Healthy,
        }
    }

    pub fn explosion(&self) -> Option<&Explosion> {
        match &self.life {
            LifeState::Dying(explosion) => Some(explosion),
            LifeState::Alive => None,
        }
    }

    pub fn shape(&self) -> GameResult<&Shape> {
        self.shape
            .as_ref()
            .ok_or(GameError::MissingCollisionShape(self.id))
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.shape.as_ref().and_then(Shape::mask)
    }

    /// Tight rectangle in world coordinates.
    pub fn tight_rect(&self) -> GameResult<Rect> {
        Ok(offset_rect(self.shape()?.local_tight(), self.pos))
    }

    pub fn set_mask(&mut self, mask: Mask) -> GameResult<()> {
        self.shape = Some(Shape::from_mask(mask)?);
        Ok(())
    }

    /// Swaps to another animation frame, refreshing the collision shape.
    pub fn set_frame(&mut self, frame: usize, masks: &MaskBank) -> GameResult<()> {
        if frame == self.frame {
            return Ok(());
        }
        self.frame = frame;
        if let Some(mask) = masks.frame(self.sprite, frame) {
            self.set_mask(mask.clone())?;
        }
        Ok(())
    }

    /// Starts the death sequence. Returns false when already dying.
    pub fn kill(&mut self, combat: &CombatConfig) -> bool {
        if self.is_killed() {
            return false;
        }
        self.life = LifeState::Dying(Explosion::new(combat));
        if let EntityKind::Tear(projectile) = &mut self.kind {
            projectile.stop();
        }
        true
    }
}

/// Where the player stands, as seen by enemy brains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTarget {
    pub id: EntityId,
    pub pos: Vec2,
    pub hitbox: Rect,
}

/// Shared state handed to per-entity updates.
pub struct EntityContext<'a> {
    pub player: Option<PlayerTarget>,
    pub config: &'a GameConfig,
    pub masks: &'a MaskBank,
    pub rng: &'a mut ChaCha8Rng,
    pub tear_spawns: Vec<TearSpawn>,
}

/// Handle-addressed entity storage with group membership.
#[derive(Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    groups: BTreeMap<Group, Vec<EntityId>>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            groups: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn spawn(
        &mut self,
        group: Group,
        build: impl FnOnce(EntityId) -> GameResult<Entity>,
    ) -> GameResult<EntityId> {
        let id = EntityId(self.next_id.max(1));
        let entity = build(id)?;
        self.next_id = id.0 + 1;
        self.entities.insert(id, entity);
        self.groups.entry(group).or_default().push(id);
        Ok(id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        for members in self.groups.values_mut() {
            members.retain(|member| *member != id);
        }
        Some(entity)
    }

    /// Removes everything except `keep`.
    pub fn clear_except(&mut self, keep: EntityId) {
        self.entities.retain(|id, _| *id == keep);
        for members in self.groups.values_mut() {
            members.retain(|member| *member == keep);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn group(&self, group: Group) -> &[EntityId] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
