//! Scheduled background sweeps for Seatline.
//!
//! This crate provides:
//! - A [`ScheduledJob`] trait for periodic tasks that report a JSON summary
//! - A cron scheduler that runs each job on its configured schedule
//! - The built-in sweeps for expired holds, unpaid pending bookings, and
//!   location history retention

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, ScheduledJob, run_job};
pub use scheduler::CronScheduler;
