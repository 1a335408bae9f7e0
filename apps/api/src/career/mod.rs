//! The career advisor: chat sessions with the AI, day-by-day career plans and
//! resume tailoring against a job description.

pub mod advisor;
pub mod handlers;
pub mod plan;
pub mod prompts;
pub mod store;
pub mod tailor;
