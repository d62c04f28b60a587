use image::imageops::FilterType;
use macroquad::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{GameError, GameResult};

/// Resolves an asset path against the working directory, then the crate root.
pub fn asset_path(path: &str) -> PathBuf {
    let direct = PathBuf::from(path);
    if direct.exists() {
        return direct;
    }
    let rooted = Path::new(env!("CARGO_MANIFEST_DIR")).join(path);
    if rooted.exists() { rooted } else { direct }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageSize {
    Scale(f32),
    Exact(u32, u32),
}

/// Decodes an image from disk, optionally resizing it with nearest-neighbour sampling.
pub fn load_image(path: impl AsRef<Path>, size: Option<ImageSize>) -> GameResult<Image> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => GameError::AssetNotFound {
            path: display.clone(),
        },
        _ => GameError::Io(err),
    })?;
    let mut rgba = image::load_from_memory(&bytes)
        .map_err(|source| GameError::AssetDecode {
            path: display.clone(),
            source,
        })?
        .to_rgba8();

    let target = match size {
        None => None,
        Some(ImageSize::Exact(w, h)) => Some((w, h)),
        Some(ImageSize::Scale(factor)) => Some((
            ((rgba.width() as f32 * factor).round() as u32).max(1),
            ((rgba.height() as f32 * factor).round() as u32).max(1),
        )),
    };
    if let Some((w, h)) = target {
        rgba = image::imageops::resize(&rgba, w, h, FilterType::Nearest);
    }

    Ok(Image {
        width: rgba.width() as u16,
        height: rgba.height() as u16,
        bytes: rgba.into_raw(),
    })
}

/// Cuts a sprite sheet into equal frames, row by row.
pub fn slice_sheet(sheet: &Image, columns: u32, rows: u32) -> Vec<Image> {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let frame_w = sheet.width as u32 / columns;
    let frame_h = sheet.height as u32 / rows;
    let mut frames = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for col in 0..columns {
            frames.push(sheet.sub_image(Rect::new(
                (col * frame_w) as f32,
                (row * frame_h) as f32,
                frame_w as f32,
                frame_h as f32,
            )));
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(name: &str, w: u32, h: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!("esaac-{}-{name}.png", std::process::id()));
        let mut img = image::RgbaImage::new(w, h);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn missing_image_is_asset_not_found() {
        let result = load_image("assets/definitely-missing.png", None);
        assert!(matches!(result, Err(GameError::AssetNotFound { .. })));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let path = std::env::temp_dir().join(format!("esaac-{}-garbage.png", std::process::id()));
        std::fs::write(&path, b"not a png").unwrap();
        let result = load_image(&path, None);
        assert!(matches!(result, Err(GameError::AssetDecode { .. })));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn scale_and_exact_resize() {
        let path = write_png("resize", 4, 2);
        let scaled = load_image(&path, Some(ImageSize::Scale(2.0))).unwrap();
        assert_eq!((scaled.width, scaled.height), (8, 4));
        let exact = load_image(&path, Some(ImageSize::Exact(3, 3))).unwrap();
        assert_eq!((exact.width, exact.height), (3, 3));
        assert_eq!(exact.bytes.len(), 3 * 3 * 4);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn sheet_slices_row_major() {
        let sheet = Image {
            bytes: vec![255; 8 * 4 * 4],
            width: 8,
            height: 4,
        };
        let frames = slice_sheet(&sheet, 4, 2);
        assert_eq!(frames.len(), 8);
        assert!(frames.iter().all(|f| f.width == 2 && f.height == 2));
    }
}
