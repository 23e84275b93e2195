//! # seatline-entity
//!
//! Domain entity models for Seatline. Database rows derive `sqlx::FromRow`;
//! every entity derives `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod booking;
pub mod event;
pub mod hold;
pub mod location;
pub mod trip;
