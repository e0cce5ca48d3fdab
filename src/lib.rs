mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod forms;
    pub mod handlers;
    pub mod routes;
}
mod config;
mod constants;
mod error;

pub use api::*;
pub use authentication::*;
pub use config::Config;
pub use constants::*;
pub use database::*;
pub use error::*;
