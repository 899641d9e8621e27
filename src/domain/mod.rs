//! Domain aggregates exposed by the CRM service layer.

pub mod automation;
pub mod contact;
pub mod contact_event;
pub mod dashboard;
pub mod deal;
pub mod integration;
pub mod manager;
pub mod task;
pub mod types;
