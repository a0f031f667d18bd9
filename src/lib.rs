#![doc = "The `devtasks` library crate."]
#![doc = ""]
#![doc = "Users own projects, projects contain tasks. This crate holds the session and"]
#![doc = "CSRF machinery, the ownership checks, the resource store and the HTTP routes;"]
#![doc = "the binary (`main.rs`) only wires them to a Postgres pool and a server."]

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

pub use crate::context::{AppContext, ContextSettings};
pub use crate::error::AppError;
