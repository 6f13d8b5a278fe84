//! Wire models for the otahub HTTP API

pub mod models;
