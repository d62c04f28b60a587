use macroquad::prelude::*;
use std::collections::HashMap;

use crate::error::GameResult;
use crate::geometry::{Mask, Shape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKey {
    Background,
    Player,
    Blob,
    MosquitoSmall,
    MosquitoBig,
    Tear,
    Rock,
    Door,
    DoorClosed,
    HalfHeart,
    FullHeart,
    Explosion,
}

impl SpriteKey {
    /// Sprites that carry collision masks.
    pub const MASKED: [SpriteKey; 8] = [
        SpriteKey::Player,
        SpriteKey::Blob,
        SpriteKey::MosquitoSmall,
        SpriteKey::MosquitoBig,
        SpriteKey::Tear,
        SpriteKey::Rock,
        SpriteKey::HalfHeart,
        SpriteKey::FullHeart,
    ];

    /// (width, height, frames, transparent border) used when no art is available.
    fn placeholder(self) -> Option<(u32, u32, usize, u32)> {
        match self {
            Self::Player => Some((56, 84, 1, 4)),
            Self::Blob => Some((72, 60, 12, 6)),
            Self::MosquitoSmall => Some((48, 48, 2, 4)),
            Self::MosquitoBig => Some((72, 72, 2, 6)),
            Self::Tear => Some((16, 16, 1, 2)),
            Self::Rock => Some((64, 56, 1, 2)),
            Self::HalfHeart => Some((24, 24, 1, 3)),
            Self::FullHeart => Some((24, 24, 1, 2)),
            Self::Background | Self::Door | Self::DoorClosed | Self::Explosion => None,
        }
    }
}

/// Per-frame collision masks for every masked sprite.
#[derive(Clone, Debug, Default)]
pub struct MaskBank {
    frames: HashMap<SpriteKey, Vec<Mask>>,
}

impl MaskBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inset rectangles sized like the shipped art.
    pub fn placeholder() -> Self {
        let mut bank = Self::new();
        for key in SpriteKey::MASKED {
            if let Some((w, h, frames, inset)) = key.placeholder() {
                bank.insert(key, vec![Mask::inset(w, h, inset); frames]);
            }
        }
        bank
    }

    /// Registers one mask per decoded animation frame.
    pub fn insert_images(&mut self, key: SpriteKey, images: &[Image]) {
        self.insert(key, images.iter().map(Mask::from_image).collect());
    }

    pub fn insert(&mut self, key: SpriteKey, frames: Vec<Mask>) {
        self.frames.insert(key, frames);
    }

    pub fn frame(&self, key: SpriteKey, index: usize) -> Option<&Mask> {
        self.frames.get(&key).and_then(|frames| frames.get(index))
    }

    pub fn frame_count(&self, key: SpriteKey) -> usize {
        self.frames.get(&key).map_or(0, Vec::len)
    }

    pub fn size(&self, key: SpriteKey) -> Vec2 {
        self.frame(key, 0)
            .map(|mask| vec2(mask.width() as f32, mask.height() as f32))
            .unwrap_or(Vec2::ZERO)
    }

    /// Shape for the given frame; `None` when the sprite has no mask.
    pub fn shape(&self, key: SpriteKey, index: usize) -> GameResult<Option<Shape>> {
        match self.frame(key, index) {
            Some(mask) => Ok(Some(Shape::from_mask(mask.clone())?)),
            None => Ok(None),
        }
    }
}

/// Frame advance accumulator: `counter += counter + speed`, one frame step once it reaches 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    counter: f32,
    speed: f32,
}

impl FrameClock {
    pub fn new(speed: f32) -> Self {
        Self {
            counter: 0.0,
            speed,
        }
    }

    pub fn advance(&mut self, frame: usize, count: usize) -> usize {
        self.counter += self.counter + self.speed;
        if self.counter >= 1.0 {
            self.counter = 0.0;
            return (frame + 1) % count.max(1);
        }
        frame
    }
}
