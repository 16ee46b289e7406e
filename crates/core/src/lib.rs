pub mod config;
pub mod schema;
pub mod sql;
pub mod store;
pub mod value;
