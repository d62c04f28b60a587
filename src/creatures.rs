use macroquad::prelude::*;
use ::rand::Rng;

use crate::config::{BlobConfig, GameConfig, MosquitoVariant};
use crate::entity::{Entity, EntityContext, EntityId, EntityKind, Group, PlayerTarget, Team, World};
use crate::error::GameResult;
use crate::projectile::TearSpawn;
use crate::sprites::{FrameClock, MaskBank, SpriteKey};

/// Sheet frame that arms the blob's shot.
const BLOB_ARM_FRAME: usize = 2;
const BLOB_FIRE_FRAME: usize = 3;
const BLOB_JUMP_START_FRAME: usize = 10;
const BLOB_JUMP_END_FRAME: usize = 11;
const MOSQUITO_INITIAL_ATTACK_DELAY: f32 = 0.001;

/// Blob behaviour: idles a few beats, then plays its sheet, shooting and hopping on cue.
#[derive(Clone, Copy, Debug)]
pub struct BlobState {
    clock: FrameClock,
    idle_counter: f32,
    idle_cycles: u32,
    move_delay: f32,
    can_move: bool,
    can_attack: bool,
}

impl BlobState {
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            clock: FrameClock::new(config.animation_speed),
            idle_counter: 0.0,
            idle_cycles: 0,
            move_delay: 0.0,
            can_move: false,
            can_attack: false,
        }
    }

    pub fn is_idle(&self, config: &BlobConfig) -> bool {
        self.idle_cycles < config.idle_cycles
    }

    pub fn update(&mut self, entity: &mut Entity, ctx: &mut EntityContext) -> GameResult<()> {
        let game_config = ctx.config;
        let config = &game_config.blob;
        let mut frame = entity.frame;
        if self.is_idle(config) {
            self.idle_counter += self.idle_counter / 3.0 + config.animation_speed;
            if self.idle_counter >= 1.0 {
                self.idle_counter = 0.0;
                self.idle_cycles += 1;
                frame = if frame == 0 { 1 } else { 0 };
            }
        } else {
            frame = self
                .clock
                .advance(frame, ctx.masks.frame_count(entity.sprite));
            self.hop(entity, ctx);
        }
        entity.set_frame(frame, ctx.masks)?;
        self.on_frame(entity, ctx);
        Ok(())
    }

    fn on_frame(&mut self, entity: &Entity, ctx: &mut EntityContext) {
        match entity.frame {
            BLOB_ARM_FRAME => self.can_attack = true,
            BLOB_FIRE_FRAME if self.can_attack => {
                self.can_attack = false;
                self.fire(entity, ctx);
            }
            BLOB_JUMP_START_FRAME => self.can_move = true,
            BLOB_JUMP_END_FRAME => {
                self.can_move = false;
                self.idle_cycles = 0;
            }
            _ => {}
        }
    }

    fn fire(&self, entity: &Entity, ctx: &mut EntityContext) {
        let (Some(player), Ok(hitbox)) = (ctx.player, entity.tight_rect()) else {
            return;
        };
        let direction = (player.hitbox.center() - hitbox.center()).normalize_or_zero();
        if direction == Vec2::ZERO {
            return;
        }
        ctx.tear_spawns.push(TearSpawn {
            center: hitbox.center(),
            velocity: direction * ctx.config.tears.speed,
            team: Team::Enemy,
        });
    }

    fn hop(&mut self, entity: &mut Entity, ctx: &mut EntityContext) {
        if self.move_delay > 1.0 && self.can_move {
            if let Some(player) = ctx.player {
                let game_config = ctx.config;
                hop_towards(entity, player, &game_config.blob, ctx);
            }
            self.move_delay = 0.0;
        }
        self.move_delay += self.move_delay + 0.01;
    }
}

fn hop_towards(
    entity: &mut Entity,
    player: PlayerTarget,
    config: &BlobConfig,
    ctx: &mut EntityContext,
) {
    let target = player.hitbox.point();
    let jitter_y = ctx.rng.gen_range(0.0..=config.jitter);
    if target.y > entity.pos.y + jitter_y && !entity.blocked.down {
        entity.pos.y += config.jump;
    } else if target.y < entity.pos.y + jitter_y && !entity.blocked.up {
        entity.pos.y -= config.jump;
    }

    let jitter_x = ctx.rng.gen_range(-config.jitter..=config.jitter);
    if target.x > entity.pos.x + jitter_x && !entity.blocked.right {
        entity.pos.x += config.jump;
    } else if target.x < entity.pos.x + jitter_x && !entity.blocked.left {
        entity.pos.x -= config.jump;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MosquitoSize {
    Small,
    Big,
}

impl MosquitoSize {
    pub fn sprite(self) -> SpriteKey {
        match self {
            Self::Small => SpriteKey::MosquitoSmall,
            Self::Big => SpriteKey::MosquitoBig,
        }
    }

    pub fn variant(self, config: &GameConfig) -> &MosquitoVariant {
        match self {
            Self::Small => &config.mosquito.small,
            Self::Big => &config.mosquito.big,
        }
    }

    pub fn explosion_scale(self) -> f32 {
        match self {
            Self::Small => 0.5,
            Self::Big => 0.7,
        }
    }
}

/// Mosquito behaviour: drifts at the player and stings on contact once its attack charges.
#[derive(Clone, Copy, Debug)]
pub struct MosquitoState {
    size: MosquitoSize,
    clock: FrameClock,
    attack_delay: f32,
}

impl MosquitoState {
    pub fn new(size: MosquitoSize, config: &GameConfig) -> Self {
        Self {
            size,
            clock: FrameClock::new(config.mosquito.animation_speed),
            attack_delay: MOSQUITO_INITIAL_ATTACK_DELAY,
        }
    }

    pub fn size(&self) -> MosquitoSize {
        self.size
    }

    pub fn attack_ready(&self) -> bool {
        self.attack_delay >= 1.0
    }

    pub fn reset_attack(&mut self) {
        self.attack_delay = 0.0;
    }

    pub fn update(&mut self, entity: &mut Entity, ctx: &mut EntityContext) -> GameResult<()> {
        let frame = self
            .clock
            .advance(entity.frame, ctx.masks.frame_count(entity.sprite));
        entity.set_frame(frame, ctx.masks)?;

        let variant = self.size.variant(ctx.config);
        let (speed, attack_speed) = (variant.speed, variant.attack_speed);
        if let Some(player) = ctx.player {
            self.approach(entity, player, speed, ctx)?;
        }
        if !self.attack_ready() {
            self.attack_delay += self.attack_delay / 5.0 + attack_speed;
        }
        Ok(())
    }

    fn approach(
        &self,
        entity: &mut Entity,
        player: PlayerTarget,
        speed: f32,
        ctx: &mut EntityContext,
    ) -> GameResult<()> {
        let jitter = ctx.config.mosquito.jitter;
        let noise = vec2(
            ctx.rng.gen_range(-jitter..=jitter),
            ctx.rng.gen_range(-jitter..=jitter),
        );
        let mut away = entity.tight_rect()?.center() - player.hitbox.center() + noise;
        away /= away.length() + 1.0;

        let blocked = entity.blocked;
        if (away.x > 0.0 && blocked.left) || (away.x < 0.0 && blocked.right) {
            away.x = 0.0;
        }
        if (away.y > 0.0 && blocked.up) || (away.y < 0.0 && blocked.down) {
            away.y = 0.0;
        }
        entity.pos -= away * speed;
        Ok(())
    }
}

pub fn spawn_blob(
    world: &mut World,
    masks: &MaskBank,
    config: &GameConfig,
    pos: Vec2,
) -> GameResult<EntityId> {
    let shape = masks.shape(SpriteKey::Blob, 0)?;
    let brain = BlobState::new(&config.blob);
    world.spawn(Group::Creatures, |id| {
        Ok(Entity::new(
            id,
            EntityKind::Blob(brain),
            Team::Enemy,
            pos,
            SpriteKey::Blob,
            shape,
        )?
        .with_health(config.blob.health)
        .with_drops())
    })
}

pub fn spawn_mosquito(
    world: &mut World,
    masks: &MaskBank,
    config: &GameConfig,
    size: MosquitoSize,
    pos: Vec2,
) -> GameResult<EntityId> {
    let sprite = size.sprite();
    let shape = masks.shape(sprite, 0)?;
    let variant = size.variant(config);
    let brain = MosquitoState::new(size, config);
    world.spawn(Group::Creatures, |id| {
        Ok(Entity::new(id, EntityKind::Mosquito(brain), Team::Enemy, pos, sprite, shape)?
            .with_health(variant.health)
            .with_damage(variant.damage, false)
            .with_drops())
    })
}
