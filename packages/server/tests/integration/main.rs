mod auth;
mod cafe;
mod common;
