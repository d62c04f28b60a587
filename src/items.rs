use macroquad::prelude::*;
use serde::Deserialize;

use crate::config::PickupConfig;
use crate::entity::{Entity, EntityId, EntityKind, Group, Team, World};
use crate::error::GameResult;
use crate::sprites::{MaskBank, SpriteKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    HalfHeart,
    FullHeart,
}

impl PickupKind {
    pub fn sprite(self) -> SpriteKey {
        match self {
            Self::HalfHeart => SpriteKey::HalfHeart,
            Self::FullHeart => SpriteKey::FullHeart,
        }
    }

    pub fn heal_amount(self, config: &PickupConfig) -> i32 {
        match self {
            Self::HalfHeart => config.half_heart_heal,
            Self::FullHeart => config.full_heart_heal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupPhase {
    Present,
    Expired,
}

/// Lifetime countdown of a dropped item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupState {
    pub kind: PickupKind,
    timer: f32,
    blink_delay: f32,
    visible: bool,
}

impl PickupState {
    pub fn new(kind: PickupKind, config: &PickupConfig) -> Self {
        Self {
            kind,
            timer: config.lifetime,
            blink_delay: 0.0,
            visible: true,
        }
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Counts down; blinks near the end and expires once the timer drops below zero.
    pub fn tick(&mut self, config: &PickupConfig) -> PickupPhase {
        self.timer -= config.decay;
        if self.timer < 0.0 {
            self.visible = false;
            return PickupPhase::Expired;
        }
        if self.timer > 0.0 && self.timer <= config.blink_below {
            self.blink_delay += config.blink_step;
            if self.blink_delay >= config.blink_interval {
                self.blink_delay = 0.0;
                self.visible = !self.visible;
            }
        }
        PickupPhase::Present
    }
}

pub fn spawn_pickup(
    world: &mut World,
    masks: &MaskBank,
    config: &PickupConfig,
    kind: PickupKind,
    center: Vec2,
) -> GameResult<EntityId> {
    let sprite = kind.sprite();
    let pos = center - masks.size(sprite) / 2.0;
    let shape = masks.shape(sprite, 0)?;
    let state = PickupState::new(kind, config);
    world.spawn(Group::Items, |id| {
        Entity::new(
            id,
            EntityKind::Pickup(state),
            Team::Neutral,
            pos,
            sprite,
            shape,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_expires_after_lifetime() {
        let config = PickupConfig::default();
        let mut state = PickupState::new(PickupKind::HalfHeart, &config);
        let mut frames = 0;
        while state.tick(&config) == PickupPhase::Present {
            frames += 1;
            assert!(frames < 2000);
        }
        // 7.0 at 0.01 per frame, give or take float drift
        assert!((699..=702).contains(&frames));
        assert!(!state.is_visible());
    }

    #[test]
    fn pickup_blinks_only_near_the_end() {
        let config = PickupConfig::default();
        let mut state = PickupState::new(PickupKind::FullHeart, &config);
        while state.timer() > config.blink_below + 0.05 {
            state.tick(&config);
            assert!(state.is_visible());
        }
        let mut toggles = 0;
        let mut last = state.is_visible();
        for _ in 0..50 {
            state.tick(&config);
            if state.is_visible() != last {
                toggles += 1;
                last = state.is_visible();
            }
        }
        assert!(toggles >= 4);
    }

    #[test]
    fn heal_amounts() {
        let config = PickupConfig::default();
        assert_eq!(PickupKind::HalfHeart.heal_amount(&config), 1);
        assert_eq!(PickupKind::FullHeart.heal_amount(&config), 2);
    }

    #[test]
    fn pickups_live_in_items_group() {
        let mut world = World::new();
        let masks = MaskBank::placeholder();
        let id = spawn_pickup(
            &mut world,
            &masks,
            &PickupConfig::default(),
            PickupKind::HalfHeart,
            vec2(50.0, 50.0),
        )
        .unwrap();
        assert_eq!(world.group(Group::Items), &[id]);
        assert!(!world.get(id).unwrap().is_solid());
    }
}
