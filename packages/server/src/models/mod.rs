pub mod auth;
pub mod cafe;
pub mod review;
pub mod shared;
