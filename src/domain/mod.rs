pub mod context;
pub mod models;
