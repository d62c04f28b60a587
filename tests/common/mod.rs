#![allow(dead_code)]

use esaac::config::{GameConfig, RoomLayout};
use esaac::game::Game;
use esaac::room::{plan_doors, DoorSet};
use esaac::sprites::MaskBank;

/// Entropy that returns `first` for the session rng and origin room, then counts up.
pub fn scripted_entropy(first: u64) -> Box<dyn FnMut() -> u64> {
    let mut calls = 0u64;
    Box::new(move || {
        calls += 1;
        if calls <= 2 { first } else { 5_000 + calls }
    })
}

pub fn game_with(config: GameConfig, first: u64) -> Game {
    Game::with_entropy(
        config,
        RoomLayout::default(),
        MaskBank::placeholder(),
        scripted_entropy(first),
    )
    .expect("session starts")
}

pub fn game(first: u64) -> Game {
    game_with(GameConfig::default(), first)
}

/// First origin-room noise whose doors satisfy `want`.
pub fn origin_noise(want: impl Fn(&DoorSet) -> bool) -> u64 {
    (0..10_000u64)
        .find(|n| want(&plan_doors(*n as i64)))
        .expect("some seed matches")
}
