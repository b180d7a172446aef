pub mod agent;
pub mod analyze;
pub mod api;
pub mod health;
pub mod local;
pub mod prompt;
