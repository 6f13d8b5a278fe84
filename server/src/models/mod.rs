pub mod bundle;
pub mod report;
