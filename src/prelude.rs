//! Commonly used types and utilities for ease of import.

pub use crate::{
    AttackResult, Cell, Game, GameConfig, GameError, GamePool, GameState, RandomAi, Ship, User,
};
