use macroquad::prelude::*;

use crate::config::GameConfig;
use crate::entity::{Entity, EntityContext, EntityId, EntityKind, Group, Team, World};
use crate::error::GameResult;
use crate::input::{Horizontal, InputState, Vertical};
use crate::projectile::{Projectile, TearSpawn};
use crate::sprites::{MaskBank, SpriteKey};

const ATTACK_SPEED_SCALE: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aim {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerState {
    pub horizontal: Option<Horizontal>,
    pub vertical: Option<Vertical>,
    aim: Option<Aim>,
    attack_delay: f32,
}

impl PlayerState {
    pub fn aim(&self) -> Option<Aim> {
        self.aim
    }

    pub fn apply_input(&mut self, input: &InputState) {
        self.horizontal = input.horizontal(self.horizontal);
        self.vertical = input.vertical(self.vertical);
        self.aim = if input.attack_left {
            Some(Aim::Left)
        } else if input.attack_right {
            Some(Aim::Right)
        } else if input.attack_up {
            Some(Aim::Up)
        } else if input.attack_down {
            Some(Aim::Down)
        } else {
            None
        };
    }

    pub fn update(&mut self, entity: &mut Entity, ctx: &mut EntityContext) -> GameResult<()> {
        let speed = ctx.config.player.speed;
        let blocked = entity.blocked;
        match self.horizontal {
            Some(Horizontal::Left) if !blocked.left => entity.pos.x -= speed,
            Some(Horizontal::Right) if !blocked.right => entity.pos.x += speed,
            _ => {}
        }
        match self.vertical {
            Some(Vertical::Up) if !blocked.up => entity.pos.y -= speed,
            Some(Vertical::Down) if !blocked.down => entity.pos.y += speed,
            _ => {}
        }

        if self.attack_delay < 1.0 {
            self.attack_delay +=
                self.attack_delay / 2.5 + ctx.config.player.attack_speed * ATTACK_SPEED_SCALE;
            return Ok(());
        }
        let Some(aim) = self.aim else {
            return Ok(());
        };
        self.attack_delay = 0.0;

        let (horizontal, vertical) = match aim {
            Aim::Left => (Some(Horizontal::Left), self.vertical),
            Aim::Right => (Some(Horizontal::Right), self.vertical),
            Aim::Up => (self.horizontal, Some(Vertical::Up)),
            Aim::Down => (self.horizontal, Some(Vertical::Down)),
        };
        let hitbox = entity.tight_rect()?;
        let head = vec2(hitbox.center().x, hitbox.y + hitbox.h / 4.0);
        let tears = &ctx.config.tears;
        let shot = Projectile::cardinal(head, horizontal, vertical, tears.speed, tears.max_distance);
        ctx.tear_spawns.push(TearSpawn {
            center: head,
            velocity: shot.velocity,
            team: entity.team,
        });
        Ok(())
    }
}

pub fn spawn_player(
    world: &mut World,
    masks: &MaskBank,
    config: &GameConfig,
    pos: Vec2,
) -> GameResult<EntityId> {
    let shape = masks.shape(SpriteKey::Player, 0)?;
    world.spawn(Group::Creatures, |id| {
        Ok(Entity::new(
            id,
            EntityKind::Player(PlayerState::default()),
            Team::Player,
            pos,
            SpriteKey::Player,
            shape,
        )?
        .with_health(config.player.health))
    })
}
