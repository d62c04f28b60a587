use macroquad::prelude::*;
use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{GameConfig, RoomLayout};
use crate::creatures::{spawn_blob, spawn_mosquito, MosquitoSize};
use crate::entity::{Entity, EntityId, EntityKind, Group, Team, World};
use crate::error::{GameError, GameResult};
use crate::geometry::{inflate, rects_intersect, Shape};
use crate::sprites::{MaskBank, SpriteKey};

pub type Seed = i64;

/// Modulus applied to the entropy source when deriving a fresh seed.
const SEED_ENTROPY_MODULUS: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCoord {
    pub x: i32,
    pub y: i32,
}

impl RoomCoord {
    pub const ORIGIN: RoomCoord = RoomCoord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The room reached by leaving through `side`. Up increases y.
    pub fn neighbor(self, side: Side) -> Self {
        match side {
            Side::Up => Self::new(self.x, self.y + 1),
            Side::Down => Self::new(self.x, self.y - 1),
            Side::Left => Self::new(self.x - 1, self.y),
            Side::Right => Self::new(self.x + 1, self.y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Left,
    Down,
    Right,
}

impl Side {
    /// Order in which door presence is drawn from the seed.
    pub const ALL: [Side; 4] = [Side::Up, Side::Left, Side::Down, Side::Right];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Left => "left",
            Self::Down => "down",
            Self::Right => "right",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Left => 1,
            Self::Down => 2,
            Self::Right => 3,
        }
    }

    /// Sprite rotation for the door frame on this wall.
    pub fn rotation(self) -> f32 {
        match self {
            Self::Up => 0.0,
            Self::Left => -std::f32::consts::FRAC_PI_2,
            Self::Down => std::f32::consts::PI,
            Self::Right => std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryRequirement {
    Any,
    Door(Side),
}

/// Seeds of every room generated so far, keyed by coordinate.
#[derive(Clone, Debug, Default)]
pub struct SeedBook {
    seeds: HashMap<RoomCoord, Seed>,
}

impl SeedBook {
    pub fn get(&self, coord: RoomCoord) -> Option<Seed> {
        self.seeds.get(&coord).copied()
    }

    pub fn insert(&mut self, coord: RoomCoord, seed: Seed) {
        self.seeds.insert(coord, seed);
    }

    pub fn forget(&mut self, coord: RoomCoord) {
        self.seeds.remove(&coord);
    }

    pub fn contains(&self, coord: RoomCoord) -> bool {
        self.seeds.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoorSet([bool; 4]);

impl DoorSet {
    pub fn has(&self, side: Side) -> bool {
        self.0[side.index()]
    }

    pub fn insert(&mut self, side: Side) {
        self.0[side.index()] = true;
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|open| *open)
    }

    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::ALL.into_iter().filter(|side| self.has(*side))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnemySpawn {
    Blob(Vec2),
    Mosquito(MosquitoSize, Vec2),
}

/// Everything a seed decides about a room.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomPlan {
    pub coord: RoomCoord,
    pub seed: Seed,
    pub first_visit: bool,
    /// Grid cells holding a rock, as (row, col).
    pub rocks: Vec<(usize, usize)>,
    pub enemies: Vec<EnemySpawn>,
    pub doors: DoorSet,
}

fn seeded_rng(seed: Seed) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}

fn coin(rng: &mut ChaCha8Rng) -> bool {
    rng.gen_bool(0.5)
}

/// Rocks land on interior cells where a zero is drawn right after a non-zero draw.
pub fn plan_rocks(rng: &mut ChaCha8Rng, layout: &RoomLayout) -> Vec<(usize, usize)> {
    let grid = &layout.grid;
    let mut rocks = Vec::new();
    let mut prev = layout.rock_categories;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if !coin(rng) {
                continue;
            }
            let number = rng.gen_range(0..=layout.rock_categories);
            if prev != 0 && number == 0 && !grid.is_border(row, col) {
                rocks.push((row, col));
            }
            prev = number;
        }
    }
    rocks
}

/// Continues the room's random stream after the rocks.
pub fn plan_enemies(
    rng: &mut ChaCha8Rng,
    layout: &RoomLayout,
    config: &GameConfig,
    rocks: &[(usize, usize)],
) -> Vec<EnemySpawn> {
    let grid = &layout.grid;
    let mut enemies = Vec::new();
    let (mut blobs, mut mosquitoes) = (0, 0);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if !coin(rng) || rocks.contains(&(row, col)) {
                continue;
            }
            let cell = grid.cell(row, col);
            match rng.gen_range(0..=layout.rock_categories) {
                1 if blobs < config.blob.max_per_room => {
                    enemies.push(EnemySpawn::Blob(cell + Vec2::from(layout.blob_offset)));
                    blobs += 1;
                }
                2 if mosquitoes < config.mosquito.max_per_room => {
                    let spawn = if coin(rng) {
                        EnemySpawn::Mosquito(MosquitoSize::Small, cell)
                    } else {
                        EnemySpawn::Mosquito(
                            MosquitoSize::Big,
                            cell + Vec2::from(layout.big_mosquito_offset),
                        )
                    };
                    enemies.push(spawn);
                    mosquitoes += 1;
                }
                _ => {}
            }
        }
    }
    enemies
}

/// Door presence comes from a fresh stream so it never depends on the contents.
pub fn plan_doors(seed: Seed) -> DoorSet {
    let mut rng = seeded_rng(seed);
    let mut doors = DoorSet::default();
    for side in Side::ALL {
        if coin(&mut rng) {
            doors.insert(side);
        }
    }
    doors
}

/// Picks (or recalls) the seed for `coord` and expands it into a plan.
///
/// A fresh seed without the required entry door, or without any door at all, is
/// discarded and redrawn, up to the configured attempt limit. Each attempt offsets the
/// entropy by its index so a coarse clock still yields distinct seeds. A recalled seed
/// is never redrawn; its entry door is added instead.
pub fn plan_room(
    coord: RoomCoord,
    entry: EntryRequirement,
    seeds: &mut SeedBook,
    entropy: &mut dyn FnMut() -> u64,
    layout: &RoomLayout,
    config: &GameConfig,
) -> GameResult<RoomPlan> {
    let attempts = layout.max_generation_attempts.max(1);
    for attempt in 1..=attempts {
        let (seed, first_visit) = match seeds.get(coord) {
            Some(seed) => (seed, false),
            None => {
                let draw = entropy().wrapping_add(u64::from(attempt - 1));
                let noise = (draw % SEED_ENTROPY_MODULUS) as Seed;
                let seed = coord.x as Seed + coord.y as Seed + noise;
                seeds.insert(coord, seed);
                (seed, true)
            }
        };

        let mut rng = seeded_rng(seed);
        let rocks = plan_rocks(&mut rng, layout);
        let enemies = if first_visit {
            plan_enemies(&mut rng, layout, config, &rocks)
        } else {
            Vec::new()
        };
        let mut doors = plan_doors(seed);

        let satisfied = match entry {
            EntryRequirement::Any => !doors.is_empty(),
            EntryRequirement::Door(side) => doors.has(side),
        };
        if !satisfied {
            if first_visit {
                debug!(?coord, seed, attempt, "seed lacks entry door, redrawing");
                seeds.forget(coord);
                continue;
            }
            let side = match entry {
                EntryRequirement::Door(side) => side,
                EntryRequirement::Any => Side::Down,
            };
            warn!(?coord, side = side.name(), "stored room lacks its entry door, opening one");
            doors.insert(side);
        }

        return Ok(RoomPlan {
            coord,
            seed,
            first_visit,
            rocks,
            enemies,
            doors,
        });
    }

    let side = match entry {
        EntryRequirement::Door(side) => side.name(),
        EntryRequirement::Any => "any",
    };
    Err(GameError::InvalidRoomSeed {
        coord,
        side,
        attempts,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Door {
    pub side: Side,
    pub rect: Rect,
    /// Area the player must touch to pass; slightly larger than the door itself.
    pub trigger: Rect,
    closed: bool,
    transition_fired: bool,
}

impl Door {
    pub fn new(side: Side, layout: &RoomLayout, closed: bool) -> Self {
        let rect = door_rect(side, layout);
        Self {
            side,
            rect,
            trigger: inflate(rect, layout.door_trigger_margin),
            closed,
            transition_fired: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn open(&mut self) {
        self.closed = false;
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Fires once per door when an open door is touched.
    pub fn try_pass(&mut self, player: &Rect) -> bool {
        if self.closed || self.transition_fired || !rects_intersect(&self.trigger, player) {
            return false;
        }
        self.transition_fired = true;
        true
    }
}

fn door_rect(side: Side, layout: &RoomLayout) -> Rect {
    let doors = &layout.doors;
    match side {
        Side::Up => doors.up,
        Side::Left => doors.left,
        Side::Down => doors.down,
        Side::Right => doors.right,
    }
    .to_rect()
}

/// Where to place an entity with local tight rect `local` so it stands just inside
/// the room, next to the door on `side` without touching its trigger.
pub fn entry_position(side: Side, layout: &RoomLayout, local: Rect) -> Vec2 {
    let trigger = inflate(door_rect(side, layout), layout.door_trigger_margin);
    let gap = layout.entry_gap;
    let center = trigger.center();
    let tight = match side {
        Side::Up => vec2(center.x - local.w / 2.0, trigger.y + trigger.h + gap),
        Side::Down => vec2(center.x - local.w / 2.0, trigger.y - local.h - gap),
        Side::Left => vec2(trigger.x + trigger.w + gap, center.y - local.h / 2.0),
        Side::Right => vec2(trigger.x - local.w - gap, center.y - local.h / 2.0),
    };
    tight - local.point()
}

/// A generated room and the handles of what it spawned.
pub struct Room {
    pub coord: RoomCoord,
    pub seed: Seed,
    pub doors: Vec<Door>,
    pub obstacles: Vec<EntityId>,
    pub enemies: Vec<EntityId>,
}

impl Room {
    /// Spawns walls, rocks, and enemies for `plan` into `world`.
    pub fn build(
        plan: &RoomPlan,
        world: &mut World,
        masks: &MaskBank,
        layout: &RoomLayout,
        config: &GameConfig,
    ) -> GameResult<Self> {
        let mut obstacles = Vec::new();
        for wall in &layout.walls {
            let rect = wall.to_rect();
            obstacles.push(world.spawn(Group::Obstacles, |id| {
                Entity::new(
                    id,
                    EntityKind::Wall,
                    Team::Neutral,
                    rect.point(),
                    SpriteKey::Background,
                    Some(Shape::rect(rect.w, rect.h)),
                )
            })?);
        }

        let rock_shape = masks.shape(SpriteKey::Rock, 0)?;
        for &(row, col) in &plan.rocks {
            let pos = layout.grid.cell(row, col);
            let shape = rock_shape.clone();
            obstacles.push(world.spawn(Group::Obstacles, |id| {
                Entity::new(id, EntityKind::Rock, Team::Neutral, pos, SpriteKey::Rock, shape)
            })?);
        }

        let mut enemies = Vec::new();
        for spawn in &plan.enemies {
            let id = match *spawn {
                EnemySpawn::Blob(pos) => spawn_blob(world, masks, config, pos)?,
                EnemySpawn::Mosquito(size, pos) => spawn_mosquito(world, masks, config, size, pos)?,
            };
            enemies.push(id);
        }

        let closed = !enemies.is_empty();
        let doors = plan
            .doors
            .sides()
            .map(|side| Door::new(side, layout, closed))
            .collect();

        info!(
            coord = ?plan.coord,
            seed = plan.seed,
            rocks = plan.rocks.len(),
            enemies = enemies.len(),
            first_visit = plan.first_visit,
            "room ready"
        );
        Ok(Self {
            coord: plan.coord,
            seed: plan.seed,
            doors,
            obstacles,
            enemies,
        })
    }

    pub fn door(&self, side: Side) -> Option<&Door> {
        self.doors.iter().find(|door| door.side == side)
    }

    /// Drops enemies that have left the world.
    pub fn prune_enemies(&mut self, world: &World) {
        self.enemies.retain(|id| world.contains(*id));
    }

    pub fn is_cleared(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn close_doors(&mut self) {
        for door in &mut self.doors {
            door.close();
        }
    }

    /// Opens every door once no enemies remain.
    pub fn update_doors(&mut self) {
        if !self.is_cleared() {
            return;
        }
        for door in self.doors.iter_mut().filter(|door| door.is_closed()) {
            door.open();
            debug!(coord = ?self.coord, side = door.side.name(), "door opened");
        }
    }

    /// The side whose door the player just passed, if any.
    pub fn check_transition(&mut self, player: &Rect) -> Option<Side> {
        self.doors
            .iter_mut()
            .find_map(|door| door.try_pass(player).then_some(door.side))
    }
}

pub fn system_entropy() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
