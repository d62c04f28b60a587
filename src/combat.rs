use rand::Rng;
use tracing::debug;

use crate::config::{CombatConfig, DropEntry};
use crate::entity::{Entity, EntityId, Team, World};
use crate::items::PickupKind;

/// Damage dealt by an entity on contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageProfile {
    pub damage: i32,
    /// One-shot sources hit each target at most once.
    pub one_shot: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageSource {
    pub id: EntityId,
    pub team: Team,
    pub damage: i32,
    pub one_shot: bool,
}

impl DamageSource {
    /// The damage an entity deals on contact, if it deals any.
    pub fn from_entity(entity: &Entity) -> Option<Self> {
        entity.damage.map(|profile| Self {
            id: entity.id,
            team: entity.team,
            damage: profile.damage,
            one_shot: profile.one_shot,
        })
    }
}

/// A pending application of damage from `source` to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub source: DamageSource,
    pub target: EntityId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    Dead,
    SameTeam,
    AlreadyHit,
    Cooldown,
    Invulnerable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HurtOutcome {
    Ignored(IgnoreReason),
    Hurt { health: i32 },
    Killed,
}

#[derive(Clone, Debug)]
pub struct Health {
    health: i32,
    max_health: i32,
    is_hurt: bool,
    hurt_timer: f32,
    hit_by: Vec<EntityId>,
}

impl Health {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            is_hurt: false,
            hurt_timer: 0.0,
            hit_by: Vec::new(),
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_hurt(&self) -> bool {
        self.is_hurt
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn already_hit_by(&self, source: EntityId) -> bool {
        self.hit_by.contains(&source)
    }

    pub fn get_hurt(&mut self, own_team: Team, source: &DamageSource) -> HurtOutcome {
        if self.is_dead() {
            return HurtOutcome::Ignored(IgnoreReason::Dead);
        }
        if source.team == own_team {
            return HurtOutcome::Ignored(IgnoreReason::SameTeam);
        }
        if source.one_shot {
            if self.already_hit_by(source.id) {
                return HurtOutcome::Ignored(IgnoreReason::AlreadyHit);
            }
            self.hit_by.push(source.id);
        } else if self.is_hurt {
            return HurtOutcome::Ignored(IgnoreReason::Cooldown);
        }

        self.health -= source.damage;
        self.is_hurt = true;
        self.hurt_timer = 0.0;
        if self.is_dead() {
            HurtOutcome::Killed
        } else {
            HurtOutcome::Hurt {
                health: self.health,
            }
        }
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Advances the hurt window; it closes once the timer reaches 1.
    pub fn tick(&mut self, step: f32) {
        if !self.is_hurt {
            return;
        }
        if self.hurt_timer >= 1.0 {
            self.is_hurt = false;
            self.hurt_timer = 0.0;
            return;
        }
        self.hurt_timer += self.hurt_timer / 3.0 + step;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplosionPhase {
    Visible,
    Hidden,
    Finished,
}

/// Death animation played before an entity leaves the world.
#[derive(Clone, Copy, Debug)]
pub struct Explosion {
    index: usize,
    counter: f32,
    speed: f32,
    frames: usize,
    hide_frame: usize,
}

impl Explosion {
    pub fn new(combat: &CombatConfig) -> Self {
        Self {
            index: 0,
            counter: 0.0,
            speed: combat.explosion_speed,
            frames: combat.explosion_frames.max(1),
            hide_frame: combat.explosion_hide_frame,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> ExplosionPhase {
        if self.index + 1 >= self.frames {
            ExplosionPhase::Finished
        } else if self.index >= self.hide_frame {
            ExplosionPhase::Hidden
        } else {
            ExplosionPhase::Visible
        }
    }

    pub fn tick(&mut self) -> ExplosionPhase {
        if self.phase() != ExplosionPhase::Finished {
            self.counter += self.counter + self.speed;
            if self.counter >= 1.0 {
                self.counter = 0.0;
                self.index += 1;
            }
        }
        self.phase()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LifeState {
    Alive,
    Dying(Explosion),
}

/// Applies a hit to its target, starting the death sequence when health runs out.
pub fn apply_hit(world: &mut World, hit: &Hit, combat: &CombatConfig) -> HurtOutcome {
    let Some(target) = world.get_mut(hit.target) else {
        return HurtOutcome::Ignored(IgnoreReason::Dead);
    };
    if target.is_killed() {
        return HurtOutcome::Ignored(IgnoreReason::Dead);
    }
    let team = target.team;
    let Some(health) = target.health.as_mut() else {
        return HurtOutcome::Ignored(IgnoreReason::Invulnerable);
    };

    let outcome = health.get_hurt(team, &hit.source);
    match outcome {
        HurtOutcome::Killed => {
            target.kill(combat);
            debug!(target = ?hit.target, source = ?hit.source.id, "killed");
        }
        HurtOutcome::Hurt { health } => {
            debug!(target = ?hit.target, source = ?hit.source.id, health, "hurt");
        }
        HurtOutcome::Ignored(_) => {}
    }
    outcome
}

/// Ticks every death animation. Returns the entities whose animation finished.
pub fn advance_explosions(world: &mut World) -> Vec<EntityId> {
    let mut finished = Vec::new();
    for entity in world.iter_mut() {
        let LifeState::Dying(explosion) = &mut entity.life else {
            continue;
        };
        match explosion.tick() {
            ExplosionPhase::Visible => {}
            ExplosionPhase::Hidden => entity.invisible = true,
            ExplosionPhase::Finished => {
                entity.invisible = true;
                finished.push(entity.id);
            }
        }
    }
    finished
}

/// One roll per death: the first entry whose chance succeeds wins.
pub fn roll_drop(table: &[DropEntry], rng: &mut impl Rng) -> Option<PickupKind> {
    table
        .iter()
        .find(|entry| rng.gen_bool(entry.chance.clamp(0.0, 1.0)))
        .map(|entry| entry.item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn source(id: u32, team: Team, damage: i32, one_shot: bool) -> DamageSource {
        DamageSource {
            id: EntityId(id),
            team,
            damage,
            one_shot,
        }
    }

    #[test]
    fn one_shot_source_hits_once() {
        let mut health = Health::new(4);
        let tear = source(9, Team::Player, 1, true);
        assert_eq!(
            health.get_hurt(Team::Enemy, &tear),
            HurtOutcome::Hurt { health: 3 }
        );
        assert_eq!(
            health.get_hurt(Team::Enemy, &tear),
            HurtOutcome::Ignored(IgnoreReason::AlreadyHit)
        );
        assert_eq!(health.health(), 3);
    }

    #[test]
    fn one_shot_sources_ignore_hurt_window() {
        let mut health = Health::new(4);
        health.get_hurt(Team::Enemy, &source(1, Team::Player, 1, true));
        assert!(health.is_hurt());
        assert_eq!(
            health.get_hurt(Team::Enemy, &source(2, Team::Player, 1, true)),
            HurtOutcome::Hurt { health: 2 }
        );
    }

    #[test]
    fn continuous_source_waits_for_hurt_window() {
        let mut health = Health::new(10);
        let sting = source(3, Team::Enemy, 2, false);
        assert_eq!(
            health.get_hurt(Team::Player, &sting),
            HurtOutcome::Hurt { health: 8 }
        );
        assert_eq!(
            health.get_hurt(Team::Player, &sting),
            HurtOutcome::Ignored(IgnoreReason::Cooldown)
        );
        let mut ticks = 0;
        while health.is_hurt() {
            health.tick(0.01);
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(
            health.get_hurt(Team::Player, &sting),
            HurtOutcome::Hurt { health: 6 }
        );
    }

    #[test]
    fn friendly_fire_is_ignored() {
        let mut health = Health::new(3);
        assert_eq!(
            health.get_hurt(Team::Enemy, &source(1, Team::Enemy, 5, true)),
            HurtOutcome::Ignored(IgnoreReason::SameTeam)
        );
        assert_eq!(health.health(), 3);
    }

    #[test]
    fn dead_targets_take_no_damage() {
        let mut health = Health::new(1);
        assert_eq!(
            health.get_hurt(Team::Enemy, &source(1, Team::Player, 1, true)),
            HurtOutcome::Killed
        );
        assert_eq!(
            health.get_hurt(Team::Enemy, &source(2, Team::Player, 1, true)),
            HurtOutcome::Ignored(IgnoreReason::Dead)
        );
        assert_eq!(health.health(), 0);
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut health = Health::new(10);
        health.get_hurt(Team::Player, &source(1, Team::Enemy, 1, true));
        assert_eq!(health.health(), 9);
        health.heal(2);
        assert_eq!(health.health(), 10);
    }

    #[test]
    fn heal_from_low_health_then_clamp() {
        let mut health = Health::new(10);
        health.get_hurt(Team::Player, &source(1, Team::Enemy, 7, true));
        assert_eq!(health.health(), 3);
        health.heal(2);
        assert_eq!(health.health(), 5);
        health.heal(10);
        assert_eq!(health.health(), 10);
        assert_eq!(health.max_health(), 10);
    }

    #[test]
    fn explosion_runs_to_last_frame() {
        let mut explosion = Explosion::new(&CombatConfig::default());
        let mut seen = vec![explosion.index()];
        let mut ticks = 0;
        while explosion.tick() != ExplosionPhase::Finished {
            if seen.last() != Some(&explosion.index()) {
                seen.push(explosion.index());
            }
            ticks += 1;
            assert!(ticks < 1000);
        }
        seen.push(explosion.index());
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn explosion_hides_from_frame_four() {
        let mut explosion = Explosion::new(&CombatConfig::default());
        while explosion.index() < 4 {
            assert_eq!(explosion.phase(), ExplosionPhase::Visible);
            explosion.tick();
        }
        assert_eq!(explosion.phase(), ExplosionPhase::Hidden);
    }

    #[test]
    fn drop_table_first_success_wins() {
        let table = [
            DropEntry {
                item: PickupKind::HalfHeart,
                chance: 1.0,
            },
            DropEntry {
                item: PickupKind::FullHeart,
                chance: 1.0,
            },
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(roll_drop(&table, &mut rng), Some(PickupKind::HalfHeart));
        let never = [DropEntry {
            item: PickupKind::FullHeart,
            chance: 0.0,
        }];
        assert_eq!(roll_drop(&never, &mut rng), None);
    }
}
