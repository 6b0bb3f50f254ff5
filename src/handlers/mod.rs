pub mod admin;
pub mod analytics;
pub mod auth;
pub mod evaluations;
pub mod interviews;
pub mod notifications;
pub mod practice;
