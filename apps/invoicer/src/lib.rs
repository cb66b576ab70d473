pub mod config;
pub mod errors;
pub mod layout;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use store::DualPathStore;
