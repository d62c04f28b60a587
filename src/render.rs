use macroquad::prelude::*;

use crate::entity::{Condition, Entity, Group};
use crate::game::Game;
use crate::sprites::SpriteKey;

/// One thing to draw, in back-to-front order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    Sprite {
        sprite: SpriteKey,
        frame: usize,
        dest: Rect,
        rotation: f32,
    },
    /// Mask-shaped tint over a sprite that was just hurt.
    HurtFlash {
        sprite: SpriteKey,
        frame: usize,
        dest: Rect,
    },
    Explosion {
        frame: usize,
        center: Vec2,
        scale: f32,
    },
    Health {
        current: i32,
        max: i32,
    },
}

fn entity_commands(game: &Game, entity: &Entity, out: &mut Vec<DrawCommand>) {
    let size = game.masks().size(entity.sprite);
    let dest = Rect::new(entity.pos.x, entity.pos.y, size.x, size.y);
    if !entity.invisible {
        out.push(DrawCommand::Sprite {
            sprite: entity.sprite,
            frame: entity.frame,
            dest,
            rotation: 0.0,
        });
        if entity.condition() == Condition::Hurt {
            out.push(DrawCommand::HurtFlash {
                sprite: entity.sprite,
                frame: entity.frame,
                dest,
            });
        }
    }
    if let Some(explosion) = entity.explosion() {
        out.push(DrawCommand::Explosion {
            frame: explosion.index(),
            center: dest.center(),
            scale: entity.kind.explosion_scale(),
        });
    }
}

/// Everything visible this frame: room, doors, items, tears, enemies, then the player.
pub fn draw_list(game: &Game) -> Vec<DrawCommand> {
    let window = &game.config().window;
    let mut out = vec![DrawCommand::Sprite {
        sprite: SpriteKey::Background,
        frame: 0,
        dest: Rect::new(0.0, 0.0, window.width as f32, window.height as f32),
        rotation: 0.0,
    }];

    for door in &game.room().doors {
        out.push(DrawCommand::Sprite {
            sprite: SpriteKey::Door,
            frame: 0,
            dest: door.rect,
            rotation: door.side.rotation(),
        });
        if door.is_closed() {
            out.push(DrawCommand::Sprite {
                sprite: SpriteKey::DoorClosed,
                frame: 0,
                dest: door.rect,
                rotation: door.side.rotation(),
            });
        }
    }

    let world = game.world();
    for group in [Group::Obstacles, Group::Items, Group::Ammo, Group::Creatures] {
        for &id in world.group(group) {
            if id == game.player_id() {
                continue;
            }
            let Some(entity) = world.get(id) else {
                continue;
            };
            if entity.sprite == SpriteKey::Background {
                continue;
            }
            entity_commands(game, entity, &mut out);
        }
    }

    if let Some(player) = game.player() {
        entity_commands(game, player, &mut out);
        if let Some(health) = &player.health {
            out.push(DrawCommand::Health {
                current: health.health().max(0),
                max: health.max_health(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, RoomLayout};
    use crate::projectile::TearSpawn;
    use crate::entity::Team;
    use crate::sprites::MaskBank;

    fn game() -> Game {
        Game::with_entropy(
            GameConfig::default(),
            RoomLayout::default(),
            MaskBank::placeholder(),
            Box::new(|| 77),
        )
        .unwrap()
    }

    #[test]
    fn background_first_player_last() {
        let game = game();
        let list = draw_list(&game);
        assert!(matches!(
            list.first(),
            Some(DrawCommand::Sprite {
                sprite: SpriteKey::Background,
                ..
            })
        ));
        assert!(matches!(list.last(), Some(DrawCommand::Health { current: 10, max: 10 })));
        let player_sprite = list
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Sprite { sprite: SpriteKey::Player, .. }));
        assert_eq!(player_sprite, Some(list.len() - 2));
    }

    #[test]
    fn walls_are_not_drawn() {
        let mut game = game();
        game.clear_room();
        let list = draw_list(&game);
        let sprites = list
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { sprite: SpriteKey::Background, .. }))
            .count();
        assert_eq!(sprites, 1);
    }

    #[test]
    fn dying_tear_draws_explosion() {
        let mut game = game();
        game.clear_room();
        let tear = game
            .spawn_tear(TearSpawn {
                center: vec2(500.0, 300.0),
                velocity: Vec2::ZERO,
                team: Team::Player,
            })
            .unwrap();
        let combat = game.config().combat.clone();
        game.world_mut().get_mut(tear).unwrap().kill(&combat);
        let list = draw_list(&game);
        assert!(list
            .iter()
            .any(|c| matches!(c, DrawCommand::Explosion { frame: 0, .. })));
    }
}
