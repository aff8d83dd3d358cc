//! IT-incident triage: a guarded role-to-role workflow engine plus a
//! similarity cache of past resolutions.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod memory;
pub mod ticket;
pub mod worker;
pub mod workflow;
