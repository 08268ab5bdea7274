//! Business logic services for the Farm Nursery Management Platform

pub mod booking;
pub mod catalog;
pub mod schedule;

pub use booking::BookingService;
pub use catalog::CatalogService;
pub use schedule::ScheduleService;
