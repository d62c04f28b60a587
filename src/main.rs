use macroquad::prelude::*;
use std::collections::HashMap;
use tracing::{error, info, warn};

use esaac::config::{GameConfig, RoomLayout};
use esaac::error::GameResult;
use esaac::game::{Game, GameStatus};
use esaac::helpers::{asset_path, load_image, slice_sheet, ImageSize};
use esaac::input::InputState;
use esaac::render::{draw_list, DrawCommand};
use esaac::sprites::{MaskBank, SpriteKey};
use esaac::telemetry::init_telemetry;

const CONFIG_PATH: &str = "config/game.yaml";
const LAYOUT_PATH: &str = "config/room.json";
const ASSET_DIR: &str = "assets";
const MAX_STEPS_PER_FRAME: u32 = 4;
const HEART_SIZE: f32 = 40.0;
const HURT_FLASH: Color = Color::new(1.0, 0.1, 0.1, 0.45);

struct SheetSpec {
    key: SpriteKey,
    path: &'static str,
    size: Option<ImageSize>,
    columns: u32,
    rows: u32,
}

const fn sheet(
    key: SpriteKey,
    path: &'static str,
    size: Option<ImageSize>,
    columns: u32,
    rows: u32,
) -> SheetSpec {
    SheetSpec {
        key,
        path,
        size,
        columns,
        rows,
    }
}

const SHEETS: [SheetSpec; 12] = [
    sheet(SpriteKey::Background, "assets/room/room-background.png", None, 1, 1),
    sheet(SpriteKey::Player, "assets/player/player.png", None, 1, 1),
    sheet(SpriteKey::Blob, "assets/enemies/i-blob.png", Some(ImageSize::Scale(1.7)), 4, 3),
    sheet(SpriteKey::MosquitoSmall, "assets/enemies/mosquito.png", Some(ImageSize::Scale(2.0)), 2, 1),
    sheet(SpriteKey::MosquitoBig, "assets/enemies/mosquito.png", Some(ImageSize::Scale(3.0)), 2, 1),
    sheet(SpriteKey::Tear, "assets/weapons/ammo-1.png", None, 1, 1),
    sheet(SpriteKey::Rock, "assets/room/room_rock.png", None, 1, 1),
    sheet(SpriteKey::Door, "assets/room/door-frame.png", Some(ImageSize::Scale(1.9)), 1, 1),
    sheet(SpriteKey::DoorClosed, "assets/room/doors.png", Some(ImageSize::Scale(1.9)), 1, 1),
    sheet(SpriteKey::HalfHeart, "assets/items/Half_Red_Heart.png", Some(ImageSize::Scale(1.5)), 1, 1),
    sheet(SpriteKey::FullHeart, "assets/items/Red_Heart.png", Some(ImageSize::Scale(1.5)), 1, 1),
    sheet(SpriteKey::Explosion, "assets/explosion/sheet.png", None, 8, 1),
];

/// GPU textures for every sprite frame, plus hurt-flash overlays for masked sprites.
struct Atlas {
    textures: HashMap<SpriteKey, Vec<Texture2D>>,
    flashes: HashMap<(SpriteKey, usize), Texture2D>,
}

impl Atlas {
    fn frame(&self, key: SpriteKey, frame: usize) -> Option<&Texture2D> {
        self.textures.get(&key).and_then(|frames| frames.get(frame))
    }
}

fn texture(image: &Image) -> Texture2D {
    let texture = Texture2D::from_image(image);
    texture.set_filter(FilterMode::Nearest);
    texture
}

/// Loads every sheet. `None` when the asset directory is absent altogether.
fn load_atlas() -> GameResult<Option<(Atlas, MaskBank)>> {
    if !asset_path(ASSET_DIR).is_dir() {
        warn!("no {ASSET_DIR} directory, drawing placeholders");
        return Ok(None);
    }

    let mut atlas = Atlas {
        textures: HashMap::new(),
        flashes: HashMap::new(),
    };
    let mut masks = MaskBank::new();
    for spec in &SHEETS {
        let image = load_image(asset_path(spec.path), spec.size)?;
        let frames = slice_sheet(&image, spec.columns, spec.rows);
        if SpriteKey::MASKED.contains(&spec.key) {
            masks.insert_images(spec.key, &frames);
            for index in 0..frames.len() {
                if let Some(mask) = masks.frame(spec.key, index) {
                    atlas
                        .flashes
                        .insert((spec.key, index), texture(&mask.flash_image(HURT_FLASH)));
                }
            }
        }
        atlas
            .textures
            .insert(spec.key, frames.iter().map(texture).collect());
        info!(sprite = ?spec.key, frames = frames.len(), "loaded {}", spec.path);
    }
    Ok(Some((atlas, masks)))
}

fn placeholder_color(key: SpriteKey) -> Color {
    match key {
        SpriteKey::Background => Color::from_hex(0x2b1d14),
        SpriteKey::Player => Color::from_hex(0xf2d3b3),
        SpriteKey::Blob => Color::from_hex(0x7a9a3a),
        SpriteKey::MosquitoSmall | SpriteKey::MosquitoBig => Color::from_hex(0x5a4a6a),
        SpriteKey::Tear => Color::from_hex(0x6fb7ff),
        SpriteKey::Rock => Color::from_hex(0x77706a),
        SpriteKey::Door => Color::from_hex(0x4a3020),
        SpriteKey::DoorClosed => Color::from_hex(0x1a1010),
        SpriteKey::HalfHeart | SpriteKey::FullHeart => Color::from_hex(0xd02030),
        SpriteKey::Explosion => Color::from_hex(0xffa030),
    }
}

fn draw_sprite(atlas: Option<&Atlas>, key: SpriteKey, frame: usize, dest: Rect, rotation: f32) {
    match atlas.and_then(|atlas| atlas.frame(key, frame)) {
        Some(texture) => draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(dest.size()),
                rotation,
                ..Default::default()
            },
        ),
        None => draw_rectangle(dest.x, dest.y, dest.w, dest.h, placeholder_color(key)),
    }
}

fn draw_hearts(atlas: Option<&Atlas>, current: i32, max: i32) {
    let slots = (max + 1) / 2;
    for slot in 0..slots {
        let dest = Rect::new(
            20.0 + slot as f32 * (HEART_SIZE + 4.0),
            20.0,
            HEART_SIZE,
            HEART_SIZE,
        );
        let filled = current - slot * 2;
        let key = match filled {
            f if f >= 2 => SpriteKey::FullHeart,
            1 => SpriteKey::HalfHeart,
            _ => {
                draw_rectangle_lines(dest.x, dest.y, dest.w, dest.h, 2.0, GRAY);
                continue;
            }
        };
        draw_sprite(atlas, key, 0, dest, 0.0);
    }
}

fn render(game: &Game, atlas: Option<&Atlas>) {
    for command in draw_list(game) {
        match command {
            DrawCommand::Sprite {
                sprite,
                frame,
                dest,
                rotation,
            } => draw_sprite(atlas, sprite, frame, dest, rotation),
            DrawCommand::HurtFlash {
                sprite,
                frame,
                dest,
            } => match atlas.and_then(|atlas| atlas.flashes.get(&(sprite, frame))) {
                Some(flash) => draw_texture_ex(
                    flash,
                    dest.x,
                    dest.y,
                    WHITE,
                    DrawTextureParams {
                        dest_size: Some(dest.size()),
                        ..Default::default()
                    },
                ),
                None => draw_rectangle(dest.x, dest.y, dest.w, dest.h, HURT_FLASH),
            },
            DrawCommand::Explosion {
                frame,
                center,
                scale,
            } => match atlas.and_then(|atlas| atlas.frame(SpriteKey::Explosion, frame)) {
                Some(texture) => {
                    let size = texture.size() * scale;
                    draw_texture_ex(
                        texture,
                        center.x - size.x / 2.0,
                        center.y - size.y / 2.0,
                        WHITE,
                        DrawTextureParams {
                            dest_size: Some(size),
                            ..Default::default()
                        },
                    );
                }
                None => {
                    let radius = 60.0 * scale * (1.0 - frame as f32 / 8.0);
                    draw_circle(center.x, center.y, radius, placeholder_color(SpriteKey::Explosion));
                }
            },
            DrawCommand::Health { current, max } => draw_hearts(atlas, current, max),
        }
    }

    if game.status() == GameStatus::GameOver {
        draw_rectangle(0.0, 0.0, screen_width(), screen_height(), Color::new(0.0, 0.0, 0.0, 0.6));
        draw_text("GAME OVER", screen_width() / 2.0 - 150.0, screen_height() / 2.0, 64.0, WHITE);
        draw_text(
            &format!("rooms cleared: {}", game.rooms_cleared()),
            screen_width() / 2.0 - 110.0,
            screen_height() / 2.0 + 50.0,
            32.0,
            WHITE,
        );
    }
}

fn window_conf() -> Conf {
    let config = GameConfig::load(asset_path(CONFIG_PATH)).unwrap_or_else(|err| {
        eprintln!("config load failed: {err}");
        GameConfig::default()
    });
    Conf {
        window_title: config.window.title.clone(),
        window_width: config.window.width,
        window_height: config.window.height,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_telemetry();

    let config = match GameConfig::load(asset_path(CONFIG_PATH)) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load {CONFIG_PATH}");
            return;
        }
    };
    let layout = match RoomLayout::load(asset_path(LAYOUT_PATH)) {
        Ok(layout) => layout,
        Err(err) => {
            error!(%err, "failed to load {LAYOUT_PATH}");
            return;
        }
    };
    let (atlas, masks) = match load_atlas() {
        Ok(Some((atlas, masks))) => (Some(atlas), masks),
        Ok(None) => (None, MaskBank::placeholder()),
        Err(err) => {
            error!(%err, "failed to load assets");
            return;
        }
    };

    let step = 1.0 / config.window.fps.max(1) as f32;
    let mut game = match Game::new(config, layout, masks) {
        Ok(game) => game,
        Err(err) => {
            error!(%err, "failed to start session");
            return;
        }
    };
    info!("session started");

    let mut accumulator = 0.0f32;
    loop {
        let input = InputState::poll();
        if input.quit {
            info!(rooms_cleared = game.rooms_cleared(), "quit requested");
            break;
        }

        accumulator += get_frame_time();
        let mut steps = 0;
        while accumulator >= step && steps < MAX_STEPS_PER_FRAME {
            if let Err(err) = game.update(&input) {
                error!(%err, "simulation failed");
                return;
            }
            accumulator -= step;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME {
            accumulator = 0.0;
        }

        clear_background(BLACK);
        render(&game, atlas.as_ref());
        next_frame().await;
    }
}
