//! policydesk - internal policy service-desk assistants.
//!
//! Two assistants share one model client and configuration layer:
//! - [`triage`]: labels a user message with a decision and an urgency
//! - [`rag`]: loads PDF policies, indexes them in memory and answers
//!   questions strictly from the retrieved passages

pub mod cli;
pub mod config;
pub mod llm;
pub mod rag;
pub mod triage;
