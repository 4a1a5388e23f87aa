pub mod availability;
pub mod geo;
pub mod rating;
pub mod schedule;
