//! Hireflow - Conversational Hiring Workflow Supervisor
//!
//! This crate implements a multi-stage, human-in-the-loop hiring workflow:
//! collect structured hiring intent, draft an approvable job description,
//! then generate technical screening questions. A supervisor state machine
//! routes each user turn to the active stage agent and gates every advance
//! on an explicit human approval.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
