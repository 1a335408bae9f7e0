//! User profile editing, resume upload and AI resume parsing.

pub mod handlers;
pub mod prompts;
pub mod resume_parser;
pub mod resume_store;
pub mod store;
