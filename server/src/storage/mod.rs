pub mod bundles;
pub mod db;
pub mod layout;
pub mod settings;
