use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::FetchError;
use crate::Resource;
use crate::ResourceId;
use crate::ResourceType;

/// Client used by [`crate::CachedStore`] to load resource bodies by identity.
///
/// Implementations should return [`FetchError::NotFound`] for resources that
/// no longer exist. The store applies its own timeout around every call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceFetcher<R: Resource>: Send + Sync + 'static {
    async fn fetch(
        &self,
        resource_type: &ResourceType,
        id: &ResourceId,
    ) -> Result<R, FetchError>;
}
