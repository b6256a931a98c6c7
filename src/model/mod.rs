//! Core data model types for email records and conversations.

pub mod conversation;
pub mod mail;
