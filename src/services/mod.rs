pub mod analytics;
pub mod evaluator;
pub mod feedback;
pub mod interview;
pub mod notification;
pub mod oracle;
pub mod question_bank;
pub mod question_generator;
pub mod scoring;
