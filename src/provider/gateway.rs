//! # Provider gateway trait and request/response types.
//!
//! [`ProviderGateway`] is the async, opaque capability the lifecycle controller
//! calls to obtain and present resources. The common handle type is
//! [`GatewayRef`], an `Arc<dyn ProviderGateway>` shared by every category.
//!
//! No timeout is enforced around [`ProviderGateway::load`]; only the retry
//! bookkeeping around it belongs to this crate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LoadError, ShowError};
use crate::policies::Category;
use crate::provider::AdHandle;

/// Shared reference to a gateway.
pub type GatewayRef = Arc<dyn ProviderGateway>;

/// Parameters of one load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Kind of resource to fetch.
    pub category: Category,
    /// Placement the resource is destined for.
    pub placement: Arc<str>,
    /// Provider unit id configured for the category, if any.
    pub unit_id: Option<Arc<str>>,
    /// 1-based attempt number since the last success or reset.
    pub attempt: u32,
}

/// Reward granted by a completed rewarded presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    /// Reward unit (e.g. "coins").
    pub kind: String,
    /// Reward amount.
    pub amount: u32,
}

/// How a full-screen presentation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissReason {
    /// The user closed the resource.
    Closed,
    /// The user closed the resource after earning a reward.
    Rewarded(Reward),
}

/// # Opaque ad provider.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use adkeeper::{AdHandle, DismissReason, LoadError, LoadRequest, ProviderGateway, ShowError};
///
/// struct AlwaysFill;
///
/// #[async_trait]
/// impl ProviderGateway for AlwaysFill {
///     async fn load(&self, request: LoadRequest) -> Result<AdHandle, LoadError> {
///         Ok(AdHandle::new(u64::from(request.attempt)))
///     }
///
///     async fn present(&self, _handle: &AdHandle) -> Result<DismissReason, ShowError> {
///         Ok(DismissReason::Closed)
///     }
///
///     fn release(&self, _handle: &AdHandle) {}
/// }
/// ```
#[async_trait]
pub trait ProviderGateway: Send + Sync + 'static {
    /// Fetches one resource.
    ///
    /// Dropping the returned future is never used as cancellation; results
    /// for disposed placements are discarded and released on arrival.
    async fn load(&self, request: LoadRequest) -> Result<AdHandle, LoadError>;

    /// Presents a full-screen resource and resolves when it is dismissed.
    ///
    /// Only called for full-screen categories.
    async fn present(&self, handle: &AdHandle) -> Result<DismissReason, ShowError>;

    /// Frees the provider-side resource. Must be idempotent.
    fn release(&self, handle: &AdHandle);
}
