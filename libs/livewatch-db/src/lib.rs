pub mod db;
pub mod models;
pub mod repositories;

pub use db::{connect, connect_in_memory};
pub use sqlx;
