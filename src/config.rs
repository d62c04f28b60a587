use macroquad::prelude::*;
use serde::Deserialize;
use std::path::Path;

use crate::error::GameResult;
use crate::items::PickupKind;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub player: PlayerConfig,
    pub tears: TearConfig,
    pub blob: BlobConfig,
    pub mosquito: MosquitoConfig,
    pub combat: CombatConfig,
    pub pickups: PickupConfig,
    pub drops: Vec<DropEntry>,
    pub collision: CollisionConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            player: PlayerConfig::default(),
            tears: TearConfig::default(),
            blob: BlobConfig::default(),
            mosquito: MosquitoConfig::default(),
            combat: CombatConfig::default(),
            pickups: PickupConfig::default(),
            drops: vec![
                DropEntry {
                    item: PickupKind::HalfHeart,
                    chance: 0.1,
                },
                DropEntry {
                    item: PickupKind::FullHeart,
                    chance: 0.01,
                },
            ],
            collision: CollisionConfig::default(),
        }
    }
}

impl GameConfig {
    /// Reads a YAML config, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub fps: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Esaac".to_owned(),
            width: 959,
            height: 540,
            fps: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub spawn: [f32; 2],
    pub speed: f32,
    pub health: i32,
    pub attack_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: [180.0, 210.0],
            speed: 4.0,
            health: 10,
            attack_speed: 0.05,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TearConfig {
    pub speed: f32,
    pub max_distance: f32,
    pub damage: i32,
}

impl Default for TearConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            max_distance: 400.0,
            damage: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub health: i32,
    pub jump: f32,
    pub jitter: f32,
    pub idle_cycles: u32,
    pub animation_speed: f32,
    pub max_per_room: u32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            health: 4,
            jump: 20.0,
            jitter: 80.0,
            idle_cycles: 5,
            animation_speed: 0.0008,
            max_per_room: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MosquitoVariant {
    pub speed: f32,
    pub damage: i32,
    pub attack_speed: f32,
    pub health: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MosquitoConfig {
    pub small: MosquitoVariant,
    pub big: MosquitoVariant,
    pub jitter: f32,
    pub animation_speed: f32,
    pub max_per_room: u32,
}

impl Default for MosquitoConfig {
    fn default() -> Self {
        Self {
            small: MosquitoVariant {
                speed: 2.0,
                damage: 1,
                attack_speed: 0.001,
                health: 3,
            },
            big: MosquitoVariant {
                speed: 1.0,
                damage: 2,
                attack_speed: 0.00001,
                health: 5,
            },
            jitter: 80.0,
            animation_speed: 0.01,
            max_per_room: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub hurt_step: f32,
    pub explosion_frames: usize,
    pub explosion_hide_frame: usize,
    pub explosion_speed: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            hurt_step: 0.01,
            explosion_frames: 8,
            explosion_hide_frame: 4,
            explosion_speed: 0.1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    pub lifetime: f32,
    pub decay: f32,
    pub blink_below: f32,
    pub blink_interval: f32,
    pub blink_step: f32,
    pub half_heart_heal: i32,
    pub full_heart_heal: i32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            lifetime: 7.0,
            decay: 0.01,
            blink_below: 2.0,
            blink_interval: 0.08,
            blink_step: 0.01,
            half_heart_heal: 1,
            full_heart_heal: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DropEntry {
    pub item: PickupKind,
    pub chance: f64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub edge_band: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self { edge_band: 20.0 }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectDef {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub origin: [f32; 2],
    pub spacing: [f32; 2],
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            origin: [155.0, 95.0],
            spacing: [85.0, 60.0],
            rows: 6,
            cols: 8,
        }
    }
}

impl GridLayout {
    pub fn cell(&self, row: usize, col: usize) -> Vec2 {
        vec2(
            self.origin[0] + col as f32 * self.spacing[0],
            self.origin[1] + row as f32 * self.spacing[1],
        )
    }

    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DoorLayout {
    pub up: RectDef,
    pub left: RectDef,
    pub down: RectDef,
    pub right: RectDef,
}

impl Default for DoorLayout {
    fn default() -> Self {
        Self {
            up: RectDef::new(450.0, 25.0, 76.0, 66.0),
            left: RectDef::new(80.0, 210.0, 66.0, 76.0),
            down: RectDef::new(450.0, 455.0, 76.0, 66.0),
            right: RectDef::new(820.0, 210.0, 66.0, 76.0),
        }
    }
}

/// Static room geometry, loaded from JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RoomLayout {
    pub grid: GridLayout,
    pub rock_categories: u32,
    pub walls: Vec<RectDef>,
    pub doors: DoorLayout,
    pub door_trigger_margin: f32,
    pub entry_gap: f32,
    pub max_generation_attempts: u32,
    pub blob_offset: [f32; 2],
    pub big_mosquito_offset: [f32; 2],
}

impl Default for RoomLayout {
    fn default() -> Self {
        Self {
            grid: GridLayout::default(),
            rock_categories: 6,
            walls: vec![
                RectDef::new(0.0, 0.0, 1000.0, 85.0),
                RectDef::new(0.0, 0.0, 135.0, 1000.0),
                RectDef::new(0.0, 450.0, 1000.0, 90.0),
                RectDef::new(825.0, 0.0, 135.0, 1000.0),
            ],
            doors: DoorLayout::default(),
            door_trigger_margin: 10.0,
            entry_gap: 4.0,
            max_generation_attempts: 64,
            blob_offset: [-30.0, -45.0],
            big_mosquito_offset: [-10.0, -10.0],
        }
    }
}

impl RoomLayout {
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("room layout {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let raw = "player:\n  speed: 6.0\ntears:\n  max_distance: 250.0\n";
        let config: GameConfig = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.player.speed, 6.0);
        assert_eq!(config.player.health, 10);
        assert_eq!(config.tears.max_distance, 250.0);
        assert_eq!(config.tears.speed, 5.0);
        assert_eq!(config.drops.len(), 2);
    }

    #[test]
    fn drops_parse_in_order() {
        let raw = "drops:\n  - item: full_heart\n    chance: 0.5\n  - item: half_heart\n    chance: 1.0\n";
        let config: GameConfig = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.drops[0].item, PickupKind::FullHeart);
        assert_eq!(config.drops[1].item, PickupKind::HalfHeart);
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let config = GameConfig::load("does/not/exist.yaml").unwrap();
        assert_eq!(config.window.fps, 60);
        let layout = RoomLayout::load("does/not/exist.json").unwrap();
        assert_eq!(layout.walls.len(), 4);
    }

    #[test]
    fn shipped_config_files_parse() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let config = GameConfig::load(root.join("config/game.yaml")).unwrap();
        assert_eq!(config.collision.edge_band, 20.0);
        let layout = RoomLayout::load(root.join("config/room.json")).unwrap();
        assert_eq!(layout.grid.rows, 6);
        assert_eq!(layout.grid.cols, 8);
        assert_eq!(layout.max_generation_attempts, 64);
    }

    #[test]
    fn grid_border_cells() {
        let grid = GridLayout::default();
        assert!(grid.is_border(0, 3));
        assert!(grid.is_border(5, 3));
        assert!(grid.is_border(2, 0));
        assert!(grid.is_border(2, 7));
        assert!(!grid.is_border(2, 3));
        assert_eq!(grid.cell(1, 2), vec2(325.0, 155.0));
    }
}
