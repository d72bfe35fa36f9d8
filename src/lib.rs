//! novel-agent: question answering over a novel with a growing memory of
//! the agent's own answers.
//!
//! The binary wires these pieces together; tests drive [`agent::Session`]
//! directly with scripted collaborators.

pub mod agent;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod logger;
pub mod retrieval;
