pub mod collision;
pub mod combat;
pub mod config;
pub mod creatures;
pub mod entity;
pub mod error;
pub mod game;
pub mod geometry;
pub mod helpers;
pub mod input;
pub mod items;
pub mod player;
pub mod projectile;
pub mod render;
pub mod room;
pub mod sprites;
pub mod telemetry;
