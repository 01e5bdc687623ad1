#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod app;
pub mod batch;
pub mod config;
pub mod context;
pub mod inference;
pub mod render;
pub mod schema;
pub mod vector;

#[path = "../model/mod.rs"]
pub mod model;
