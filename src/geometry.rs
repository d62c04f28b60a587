use macroquad::prelude::*;

use crate::error::{GameError, GameResult};

/// Opacity alpha above which a pixel counts as solid.
const ALPHA_THRESHOLD: u8 = 127;

/// Per-pixel opacity bitmap used for precise collision tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width * height) as usize],
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; (width * height) as usize],
        }
    }

    /// An opaque rectangle surrounded by a transparent border of `inset` pixels.
    pub fn inset(width: u32, height: u32, inset: u32) -> Self {
        let mut mask = Self::new(width, height);
        for y in inset..height.saturating_sub(inset) {
            for x in inset..width.saturating_sub(inset) {
                mask.set(x, y, true);
            }
        }
        mask
    }

    pub fn from_image(image: &Image) -> Self {
        let width = image.width as u32;
        let height = image.height as u32;
        let bits = image
            .bytes
            .chunks_exact(4)
            .map(|px| px[3] > ALPHA_THRESHOLD)
            .collect();
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, opaque: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = opaque;
        }
    }

    /// Minimal rectangle enclosing every opaque pixel, in mask-local coordinates.
    pub fn bounding_rect(&self) -> GameResult<Rect> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.bits[(y * self.width + x) as usize] {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((min_x, min_y, max_x, max_y)) => {
                        (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                    }
                });
            }
        }

        let (min_x, min_y, max_x, max_y) = bounds.ok_or(GameError::EmptyMask)?;
        Ok(Rect::new(
            min_x as f32,
            min_y as f32,
            (max_x - min_x + 1) as f32,
            (max_y - min_y + 1) as f32,
        ))
    }

    /// Per-pixel intersection test. `offset` is the other mask's origin relative to this one.
    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        let (ox, oy) = offset;
        let x_start = ox.max(0);
        let y_start = oy.max(0);
        let x_end = (self.width as i32).min(ox + other.width as i32);
        let y_end = (self.height as i32).min(oy + other.height as i32);

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.get(x, y) && other.get(x - ox, y - oy) {
                    return true;
                }
            }
        }
        false
    }

    /// Mask-shaped translucent overlay used for the hurt flash.
    pub fn flash_image(&self, color: Color) -> Image {
        let rgba = [
            (color.r * 255.0) as u8,
            (color.g * 255.0) as u8,
            (color.b * 255.0) as u8,
            (color.a * 255.0) as u8,
        ];
        let mut bytes = Vec::with_capacity(self.bits.len() * 4);
        for bit in &self.bits {
            if *bit {
                bytes.extend_from_slice(&rgba);
            } else {
                bytes.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
        Image {
            bytes,
            width: self.width as u16,
            height: self.height as u16,
        }
    }
}

/// Collision shape in sprite-local coordinates.
#[derive(Clone, Debug)]
pub enum Shape {
    Mask { mask: Mask, tight: Rect },
    Rect(Rect),
}

impl Shape {
    pub fn from_mask(mask: Mask) -> GameResult<Self> {
        let tight = mask.bounding_rect()?;
        Ok(Self::Mask { mask, tight })
    }

    pub fn rect(w: f32, h: f32) -> Self {
        Self::Rect(Rect::new(0.0, 0.0, w, h))
    }

    pub fn mask(&self) -> Option<&Mask> {
        match self {
            Self::Mask { mask, .. } => Some(mask),
            Self::Rect(_) => None,
        }
    }

    pub fn local_tight(&self) -> Rect {
        match self {
            Self::Mask { tight, .. } => *tight,
            Self::Rect(rect) => *rect,
        }
    }
}

/// Strict overlap: rectangles that only share an edge do not intersect.
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

pub fn inflate(rect: Rect, margin: f32) -> Rect {
    Rect::new(
        rect.x - margin,
        rect.y - margin,
        rect.w + margin * 2.0,
        rect.h + margin * 2.0,
    )
}

pub fn offset_rect(rect: Rect, pos: Vec2) -> Rect {
    Rect::new(rect.x + pos.x, rect.y + pos.y, rect.w, rect.h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_points(w: u32, h: u32, points: &[(u32, u32)]) -> Mask {
        let mut mask = Mask::new(w, h);
        for &(x, y) in points {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn bounding_rect_covers_opaque_pixels() {
        let mask = mask_from_points(10, 10, &[(2, 3), (7, 4), (5, 8)]);
        let rect = mask.bounding_rect().unwrap();
        assert_eq!(rect, Rect::new(2.0, 3.0, 6.0, 6.0));
    }

    #[test]
    fn bounding_rect_single_pixel() {
        let mask = mask_from_points(4, 4, &[(3, 0)]);
        assert_eq!(mask.bounding_rect().unwrap(), Rect::new(3.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn bounding_rect_is_minimal() {
        let layouts: [&[(u32, u32)]; 3] = [
            &[(0, 0), (9, 9)],
            &[(4, 1), (4, 6), (1, 3)],
            &[(5, 5)],
        ];
        for points in layouts {
            let mask = mask_from_points(10, 10, points);
            let rect = mask.bounding_rect().unwrap();
            for &(x, y) in points {
                assert!(rect.contains(vec2(x as f32, y as f32)));
            }
            // every edge of the rect touches an opaque pixel
            let left = rect.x as u32;
            let top = rect.y as u32;
            let right = (rect.x + rect.w) as u32 - 1;
            let bottom = (rect.y + rect.h) as u32 - 1;
            assert!(points.iter().any(|p| p.0 == left));
            assert!(points.iter().any(|p| p.0 == right));
            assert!(points.iter().any(|p| p.1 == top));
            assert!(points.iter().any(|p| p.1 == bottom));
        }
    }

    #[test]
    fn empty_mask_is_an_error() {
        let mask = Mask::new(8, 8);
        assert!(matches!(mask.bounding_rect(), Err(GameError::EmptyMask)));
        assert!(Shape::from_mask(mask).is_err());
    }

    #[test]
    fn inset_mask_tight_rect() {
        let mask = Mask::inset(20, 10, 3);
        assert_eq!(mask.bounding_rect().unwrap(), Rect::new(3.0, 3.0, 14.0, 4.0));
    }

    #[test]
    fn masks_overlap_only_on_opaque_pixels() {
        let a = mask_from_points(4, 4, &[(3, 3)]);
        let b = mask_from_points(4, 4, &[(0, 0)]);
        assert!(a.overlaps(&b, (3, 3)));
        assert!(!a.overlaps(&b, (2, 2)));
        assert!(!a.overlaps(&b, (4, 4)));

        let c = Mask::inset(10, 10, 4);
        let d = Mask::inset(10, 10, 4);
        // bounding boxes overlap but opaque cores do not
        assert!(!c.overlaps(&d, (5, 0)));
        assert!(c.overlaps(&d, (1, 1)));
    }

    #[test]
    fn mask_from_image_uses_alpha() {
        let mut bytes = vec![0u8; 2 * 2 * 4];
        bytes[3] = 255;
        bytes[15] = 100;
        let image = Image {
            bytes,
            width: 2,
            height: 2,
        };
        let mask = Mask::from_image(&image);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 1));
        assert!(!mask.get(1, 0) && !mask.get(0, 1));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!rects_intersect(&a, &b));
        let c = Rect::new(9.0, 9.0, 5.0, 5.0);
        assert!(rects_intersect(&a, &c));
    }

    #[test]
    fn flash_image_follows_mask() {
        let mask = mask_from_points(2, 1, &[(1, 0)]);
        let image = mask.flash_image(Color::new(1.0, 0.0, 0.0, 0.25));
        assert_eq!(&image.bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&image.bytes[4..8], &[255, 0, 0, 63]);
    }
}
