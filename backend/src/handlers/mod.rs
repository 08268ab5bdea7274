//! HTTP handlers for the Farm Nursery Management Platform

pub mod booking;
pub mod catalog;
pub mod health;
pub mod schedule;

pub use booking::*;
pub use catalog::*;
pub use health::*;
pub use schedule::*;
