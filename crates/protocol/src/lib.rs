//! Assistant Playground Protocol
//!
//! Shared types for the HTTP boundary between the playground client and the
//! assistant API. These types are serialized as JSON request/response bodies.

pub mod client;
pub mod server;
pub mod types;

pub use client::{CreateAssistantRequest, PromptRequest};
pub use server::{KvStoreItem, ResponseMessage};
pub use types::*;
