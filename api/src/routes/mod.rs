pub mod agent;
pub mod analyze;
pub mod health;
pub mod prompt;
