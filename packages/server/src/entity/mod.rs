pub mod cafe;
pub mod review;
pub mod user;
