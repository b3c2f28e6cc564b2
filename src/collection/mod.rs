//! Samplers that observe the desktop and append what they see into the
//! [EventStore](crate::events::EventStore).

pub mod keys;
pub mod poller;
