pub mod activity;
pub mod blog;
pub mod sources;
