//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a pool.
//!
//! # Tasks
//! - Vacate: Removes expired pool entries at configured intervals

mod vacate;

pub use vacate::spawn_vacate_task;
