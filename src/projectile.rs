use macroquad::prelude::*;

use crate::config::TearConfig;
use crate::entity::{Entity, EntityId, EntityKind, Group, Team, World};
use crate::error::GameResult;
use crate::input::{Horizontal, Vertical};
use crate::sprites::{MaskBank, SpriteKey};

/// Straight-line mover that expires past a fixed distance from where it started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub start: Vec2,
    pub velocity: Vec2,
    pub max_distance: f32,
}

impl Projectile {
    pub fn new(start: Vec2, velocity: Vec2, max_distance: f32) -> Self {
        Self {
            start,
            velocity,
            max_distance,
        }
    }

    /// Axis-aligned or diagonal shot from a pair of headings.
    pub fn cardinal(
        start: Vec2,
        horizontal: Option<Horizontal>,
        vertical: Option<Vertical>,
        speed: f32,
        max_distance: f32,
    ) -> Self {
        let x = match horizontal {
            Some(Horizontal::Left) => -speed,
            Some(Horizontal::Right) => speed,
            None => 0.0,
        };
        let y = match vertical {
            Some(Vertical::Up) => -speed,
            Some(Vertical::Down) => speed,
            None => 0.0,
        };
        Self::new(start, vec2(x, y), max_distance)
    }

    /// Shot along a direction vector, scaled by speed.
    pub fn aimed(start: Vec2, direction: Vec2, speed: f32, max_distance: f32) -> Self {
        Self::new(start, direction * speed, max_distance)
    }

    /// Moves one step; true once the projectile has flown past its range.
    pub fn step(&mut self, pos: &mut Vec2) -> bool {
        *pos += self.velocity;
        (self.start.x - pos.x).abs() > self.max_distance
            || (self.start.y - pos.y).abs() > self.max_distance
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}

/// A tear requested during the update phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TearSpawn {
    /// Center of the tear.
    pub center: Vec2,
    pub velocity: Vec2,
    pub team: Team,
}

pub fn spawn_tear(
    world: &mut World,
    masks: &MaskBank,
    tears: &TearConfig,
    spawn: TearSpawn,
) -> GameResult<EntityId> {
    let pos = spawn.center - masks.size(SpriteKey::Tear) / 2.0;
    let shape = masks.shape(SpriteKey::Tear, 0)?;
    let projectile = Projectile::new(pos, spawn.velocity, tears.max_distance);
    world.spawn(Group::Ammo, |id| {
        Ok(Entity::new(
            id,
            EntityKind::Tear(projectile),
            spawn.team,
            pos,
            SpriteKey::Tear,
            shape,
        )?
        .with_damage(tears.damage, true))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aimed_velocity_scales_direction() {
        let mut projectile = Projectile::aimed(vec2(100.0, 100.0), vec2(1.0, 0.0), 5.0, 400.0);
        let mut pos = vec2(100.0, 100.0);
        assert!(!projectile.step(&mut pos));
        assert_eq!(pos, vec2(105.0, 100.0));
        projectile.stop();
        projectile.step(&mut pos);
        assert_eq!(pos, vec2(105.0, 100.0));
    }

    #[test]
    fn expires_after_max_distance() {
        let mut projectile = Projectile::aimed(Vec2::ZERO, vec2(1.0, 0.0), 5.0, 400.0);
        let mut pos = Vec2::ZERO;
        for _ in 0..80 {
            assert!(!projectile.step(&mut pos));
        }
        assert_eq!(pos.x, 400.0);
        assert!(projectile.step(&mut pos));
        assert_eq!(pos.x, 405.0);
    }

    #[test]
    fn diagonal_shot_from_headings() {
        let projectile = Projectile::cardinal(
            Vec2::ZERO,
            Some(Horizontal::Left),
            Some(Vertical::Down),
            5.0,
            400.0,
        );
        assert_eq!(projectile.velocity, vec2(-5.0, 5.0));
    }

    #[test]
    fn spawned_tear_is_centered_and_one_shot() {
        let mut world = World::new();
        let masks = MaskBank::placeholder();
        let id = spawn_tear(
            &mut world,
            &masks,
            &TearConfig::default(),
            TearSpawn {
                center: vec2(100.0, 100.0),
                velocity: vec2(5.0, 0.0),
                team: Team::Player,
            },
        )
        .unwrap();
        let tear = world.get(id).unwrap();
        assert_eq!(tear.pos, vec2(92.0, 92.0));
        assert_eq!(tear.damage.map(|d| d.one_shot), Some(true));
        assert_eq!(world.group(Group::Ammo), &[id]);
    }
}
