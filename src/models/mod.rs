//! Database models shared across the CRM repository.

pub mod automation;
pub mod contact;
pub mod contact_event;
pub mod deal;
pub mod integration;
pub mod manager;
pub mod task;

#[cfg(feature = "server")]
pub mod auth;
#[cfg(feature = "server")]
pub mod config;
