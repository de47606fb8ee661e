pub mod checks;
pub mod companies;
pub mod health;
pub mod issues;
pub mod statistics;
pub mod stories;
