//! otahub library
//!
//! Update resolution, bundle storage and the HTTP surface of the otahub
//! over-the-air update server.

pub mod app;
pub mod authn;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod resolve;
pub mod server;
pub mod storage;
pub mod utils;
