//! Domain models for the Farm Nursery Management Platform

mod booking;
mod catalog;
mod farmer;
mod schedule;

pub use booking::*;
pub use catalog::*;
pub use farmer::*;
pub use schedule::*;
