pub mod handlers;
pub mod locator;
pub mod serve;
pub mod state;
