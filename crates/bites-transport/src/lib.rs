//! # Bites Transport
//!
//! NATS integration for the Bites message bus.
//!
//! [`NatsBus`] implements [`bites_core::MessageBus`] on top of an
//! `async_nats::Client`, so the storage service and the gateway can run as
//! separate processes sharing one NATS server.

pub mod adapter;

pub use adapter::NatsBus;
