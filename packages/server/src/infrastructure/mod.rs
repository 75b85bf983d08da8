//! Infrastructure layer: registry implementation and wire formats.

pub mod dto;
pub mod repository;
