pub mod evaluation;
pub mod interview;
pub mod practice;
pub mod user;
