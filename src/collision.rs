use macroquad::prelude::*;
use std::collections::HashSet;
use tracing::debug;

use crate::combat::{DamageSource, Hit};
use crate::entity::{Entity, EntityId, Role, World, PHYSICAL_GROUPS};
use crate::error::GameResult;
use crate::geometry::rects_intersect;

/// Which directions of travel are blocked this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sides {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Sides {
    pub const NONE: Sides = Sides {
        left: false,
        right: false,
        up: false,
        down: false,
    };

    pub fn union(self, other: Sides) -> Sides {
        Sides {
            left: self.left || other.left,
            right: self.right || other.right,
            up: self.up || other.up,
            down: self.down || other.down,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Classifies which side of `a` touches `b`.
///
/// A horizontal side is flagged when `a`'s leading edge lies inside `b` and the
/// vertical spans overlap. A vertical side is flagged when the edge sits within
/// `band` pixels of `b`'s facing edge and the horizontal spans overlap.
pub fn classify_sides(a: &Rect, b: &Rect, band: f32) -> Sides {
    let (a_left, a_right, a_top, a_bottom) = (a.x, a.x + a.w, a.y, a.y + a.h);
    let (b_left, b_right, b_top, b_bottom) = (b.x, b.x + b.w, b.y, b.y + b.h);
    let vertical_overlap = a_top < b_bottom && a_bottom > b_top;
    let horizontal_overlap = a_left < b_right && a_right > b_left;

    let mut sides = Sides::NONE;
    if b_left <= a_right && a_right < b_right && a_left <= b_left && vertical_overlap {
        sides.right = true;
    } else if b_right > a_left && a_left > b_left && a_right >= b_right && vertical_overlap {
        sides.left = true;
    }

    if b_bottom > a_top && a_top > b_bottom - band && horizontal_overlap {
        sides.up = true;
    } else if b_top < a_bottom && a_bottom < b_top + band && horizontal_overlap {
        sides.down = true;
    }
    sides
}

/// Contacts seen this frame and the frame before, for first-contact detection.
#[derive(Clone, Debug, Default)]
pub struct ContactTracker {
    previous: HashSet<EntityId>,
    current: HashSet<EntityId>,
}

impl ContactTracker {
    /// Records a contact; true when it did not exist last frame.
    pub fn record(&mut self, other: EntityId) -> bool {
        self.current.insert(other);
        !self.previous.contains(&other)
    }

    pub fn end_frame(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    pub sides: Sides,
    pub first: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CollisionReport {
    pub contacts: Vec<Contact>,
    pub hits: Vec<Hit>,
    /// Projectiles that ran into something and must stop.
    pub stopped: Vec<EntityId>,
}

/// Precise overlap: mask against mask when both have one, strict tight rects otherwise.
pub fn shapes_touch(a: &Entity, b: &Entity) -> GameResult<bool> {
    if let (Some(mask_a), Some(mask_b)) = (a.mask(), b.mask()) {
        let offset = (b.pos - a.pos).round();
        return Ok(mask_a.overlaps(mask_b, (offset.x as i32, offset.y as i32)));
    }
    Ok(rects_intersect(&a.tight_rect()?, &b.tight_rect()?))
}

fn is_candidate(entity: &Entity) -> bool {
    entity.is_solid() && !entity.is_killed()
}

/// Every ordered pair of live solid entities whose shapes overlap.
pub fn detect_contacts(world: &World, band: f32) -> GameResult<Vec<Contact>> {
    let mut contacts = Vec::new();
    for group_a in PHYSICAL_GROUPS {
        for &a_id in world.group(group_a) {
            let Some(a) = world.get(a_id).filter(|e| is_candidate(e)) else {
                continue;
            };
            let a_rect = a.tight_rect()?;
            for group_b in PHYSICAL_GROUPS {
                for &b_id in world.group(group_b) {
                    if a_id == b_id {
                        continue;
                    }
                    let Some(b) = world.get(b_id).filter(|e| is_candidate(e)) else {
                        continue;
                    };
                    if !shapes_touch(a, b)? {
                        continue;
                    }
                    contacts.push(Contact {
                        a: a_id,
                        b: b_id,
                        sides: classify_sides(&a_rect, &b.tight_rect()?, band),
                        first: false,
                    });
                }
            }
        }
    }
    Ok(contacts)
}

/// Runs contact detection and dispatch for one frame.
pub fn resolve(world: &mut World, band: f32) -> GameResult<CollisionReport> {
    let detected = detect_contacts(world, band)?;
    let mut report = CollisionReport::default();

    for group in PHYSICAL_GROUPS {
        for id in world.group(group).to_vec() {
            if let Some(entity) = world.get_mut(id) {
                entity.blocked = Sides::NONE;
            }
        }
    }

    for mut contact in detected {
        let Some((b_role, b_team)) = world.get(contact.b).map(|b| (b.role(), b.team)) else {
            continue;
        };
        let Some(a) = world.get_mut(contact.a) else {
            continue;
        };
        contact.first = a.contacts.record(contact.b);
        if contact.first {
            debug!(a = ?contact.a, b = ?contact.b, sides = ?contact.sides, "contact");
        }

        match (a.role(), b_role) {
            (Role::Creature, Role::Obstacle) => {
                a.blocked = a.blocked.union(contact.sides);
            }
            (Role::Projectile, Role::Obstacle) => {
                report.stopped.push(a.id);
            }
            (Role::Projectile, Role::Creature) if a.team != b_team => {
                if let Some(source) = DamageSource::from_entity(a) {
                    report.hits.push(Hit {
                        source,
                        target: contact.b,
                    });
                    if source.one_shot {
                        report.stopped.push(a.id);
                    }
                }
            }
            _ => {}
        }
        report.contacts.push(contact);
    }

    for group in PHYSICAL_GROUPS {
        for id in world.group(group).to_vec() {
            if let Some(entity) = world.get_mut(id) {
                entity.contacts.end_frame();
            }
        }
    }
    report.stopped.dedup();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::entity::{EntityKind, Group, Team};
    use crate::geometry::{Mask, Shape};
    use crate::player::PlayerState;
    use crate::projectile::Projectile;
    use crate::sprites::SpriteKey;

    fn spawn(
        world: &mut World,
        group: Group,
        kind: EntityKind,
        team: Team,
        pos: Vec2,
        shape: Shape,
    ) -> EntityId {
        world
            .spawn(group, |id| {
                Entity::new(id, kind, team, pos, SpriteKey::Rock, Some(shape))
            })
            .unwrap()
    }

    fn player_kind() -> EntityKind {
        EntityKind::Player(PlayerState::default())
    }

    fn tear_kind() -> EntityKind {
        EntityKind::Tear(Projectile::new(Vec2::ZERO, vec2(5.0, 0.0), 400.0))
    }

    #[test]
    fn right_side_when_leading_edge_inside() {
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        let b = Rect::new(15.0, 5.0, 20.0, 20.0);
        let sides = classify_sides(&a, &b, 20.0);
        assert!(sides.right);
        assert!(!sides.left);
    }

    #[test]
    fn left_side_mirrors_right() {
        let a = Rect::new(15.0, 5.0, 20.0, 20.0);
        let b = Rect::new(0.0, 0.0, 20.0, 20.0);
        let sides = classify_sides(&a, &b, 20.0);
        assert!(sides.left);
        assert!(!sides.right);
        // a.top = 5 sits inside the band below b.bottom = 20
        assert!(sides.up);
    }

    #[test]
    fn down_side_within_band() {
        let a = Rect::new(10.0, 0.0, 20.0, 30.0);
        let b = Rect::new(0.0, 25.0, 100.0, 50.0);
        let sides = classify_sides(&a, &b, 20.0);
        assert!(sides.down);
        assert!(!sides.up);
        assert!(!sides.left && !sides.right);
    }

    #[test]
    fn deep_overlap_beyond_band_flags_nothing_vertical() {
        let a = Rect::new(10.0, 30.0, 20.0, 20.0);
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let sides = classify_sides(&a, &b, 20.0);
        assert!(!sides.up && !sides.down);
    }

    #[test]
    fn contact_tracker_reports_first_contact() {
        let mut tracker = ContactTracker::default();
        assert!(tracker.record(EntityId(2)));
        tracker.end_frame();
        assert!(!tracker.record(EntityId(2)));
        tracker.end_frame();
        tracker.end_frame();
        assert!(tracker.record(EntityId(2)));
    }

    #[test]
    fn creature_is_blocked_by_obstacle() {
        let mut world = World::new();
        let player = spawn(
            &mut world,
            Group::Creatures,
            player_kind(),
            Team::Player,
            vec2(0.0, 0.0),
            Shape::rect(20.0, 20.0),
        );
        spawn(
            &mut world,
            Group::Obstacles,
            EntityKind::Rock,
            Team::Neutral,
            vec2(15.0, 0.0),
            Shape::rect(20.0, 20.0),
        );
        let report = resolve(&mut world, 20.0).unwrap();
        let blocked = world.get(player).unwrap().blocked;
        assert!(blocked.right);
        assert!(!blocked.left);
        assert!(report.hits.is_empty());
        assert!(report.contacts.iter().any(|c| c.a == player && c.first));

        // still touching next frame: contact is no longer first
        let report = resolve(&mut world, 20.0).unwrap();
        assert!(report.contacts.iter().any(|c| c.a == player && !c.first));
    }

    #[test]
    fn blocked_sides_clear_when_contact_ends() {
        let mut world = World::new();
        let player = spawn(
            &mut world,
            Group::Creatures,
            player_kind(),
            Team::Player,
            vec2(0.0, 0.0),
            Shape::rect(20.0, 20.0),
        );
        spawn(
            &mut world,
            Group::Obstacles,
            EntityKind::Rock,
            Team::Neutral,
            vec2(15.0, 0.0),
            Shape::rect(20.0, 20.0),
        );
        resolve(&mut world, 20.0).unwrap();
        world.get_mut(player).unwrap().pos = vec2(-50.0, 0.0);
        resolve(&mut world, 20.0).unwrap();
        assert!(world.get(player).unwrap().blocked.is_empty());
    }

    #[test]
    fn tear_stops_on_obstacle() {
        let mut world = World::new();
        let tear = spawn(
            &mut world,
            Group::Ammo,
            tear_kind(),
            Team::Player,
            vec2(0.0, 0.0),
            Shape::rect(10.0, 10.0),
        );
        spawn(
            &mut world,
            Group::Obstacles,
            EntityKind::Rock,
            Team::Neutral,
            vec2(5.0, 5.0),
            Shape::rect(10.0, 10.0),
        );
        let report = resolve(&mut world, 20.0).unwrap();
        assert_eq!(report.stopped, vec![tear]);
    }

    #[test]
    fn tear_hits_enemy_creature_only() {
        let mut world = World::new();
        let tear = world
            .spawn(Group::Ammo, |id| {
                Ok(Entity::new(
                    id,
                    tear_kind(),
                    Team::Player,
                    Vec2::ZERO,
                    SpriteKey::Tear,
                    Some(Shape::rect(10.0, 10.0)),
                )?
                .with_damage(1, true))
            })
            .unwrap();
        let player = spawn(
            &mut world,
            Group::Creatures,
            player_kind(),
            Team::Player,
            vec2(2.0, 2.0),
            Shape::rect(10.0, 10.0),
        );
        let report = resolve(&mut world, 20.0).unwrap();
        assert!(report.hits.is_empty());
        assert!(report.stopped.is_empty());

        world.get_mut(player).unwrap().team = Team::Enemy;
        let report = resolve(&mut world, 20.0).unwrap();
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].source.id, tear);
        assert_eq!(report.hits[0].target, player);
        assert_eq!(report.stopped, vec![tear]);
    }

    #[test]
    fn dying_entities_are_skipped() {
        let mut world = World::new();
        let rock = spawn(
            &mut world,
            Group::Obstacles,
            EntityKind::Rock,
            Team::Neutral,
            Vec2::ZERO,
            Shape::rect(10.0, 10.0),
        );
        spawn(
            &mut world,
            Group::Ammo,
            tear_kind(),
            Team::Player,
            vec2(2.0, 2.0),
            Shape::rect(10.0, 10.0),
        );
        world.get_mut(rock).unwrap().kill(&CombatConfig::default());
        assert!(detect_contacts(&world, 20.0).unwrap().is_empty());
    }

    #[test]
    fn masks_decide_when_both_present() {
        let mut world = World::new();
        let a = spawn(
            &mut world,
            Group::Creatures,
            player_kind(),
            Team::Player,
            Vec2::ZERO,
            Shape::from_mask(Mask::inset(10, 10, 4)).unwrap(),
        );
        let b = spawn(
            &mut world,
            Group::Obstacles,
            EntityKind::Rock,
            Team::Neutral,
            vec2(5.0, 0.0),
            Shape::from_mask(Mask::inset(10, 10, 4)).unwrap(),
        );
        let (a, b) = (world.get(a).unwrap(), world.get(b).unwrap());
        assert!(!shapes_touch(a, b).unwrap());
    }
}
