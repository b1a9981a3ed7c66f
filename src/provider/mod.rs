//! # Provider gateway seam.
//!
//! The remote ad network is an opaque external collaborator. The core only
//! talks to it through [`ProviderGateway`]:
//! - [`ProviderGateway::load`] asynchronously yields an [`AdHandle`] or a [`LoadError`](crate::LoadError);
//! - [`ProviderGateway::present`] shows a full-screen handle and resolves with a [`DismissReason`];
//! - [`ProviderGateway::release`] frees a handle (synchronous, idempotent).
//!
//! Handles are opaque: the core stores, hands out and releases them but never
//! inspects their payload.

mod gateway;
mod handle;

pub use gateway::{DismissReason, GatewayRef, LoadRequest, ProviderGateway, Reward};
pub use handle::AdHandle;
