pub mod models;
pub mod scheduler;
