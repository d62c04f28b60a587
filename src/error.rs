use thiserror::Error;

use crate::entity::EntityId;
use crate::room::RoomCoord;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("unable to find image: {path}")]
    AssetNotFound { path: String },

    #[error("failed to decode image {path}: {source}")]
    AssetDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("mask has no opaque pixels")]
    EmptyMask,

    #[error("physical entity {0:?} has neither a mask nor a rect")]
    MissingCollisionShape(EntityId),

    #[error("no room with a {side} door found at {coord:?} after {attempts} attempts")]
    InvalidRoomSeed {
        coord: RoomCoord,
        side: &'static str,
        attempts: u32,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GameResult<T> = Result<T, GameError>;
