//! Resolution of the business (tenant) the credentials belong to.
//!
//! Every team-member URL is scoped by the business id, which the API only
//! reveals through `users/me`. It is looked up once per client and then
//! served from memory.

use crate::client::FreshBooksClient;
use crate::error::ClientError;
use crate::models::{BusinessId, CurrentUserResponse};

impl FreshBooksClient {
    /// Return the business id, looking it up on first use.
    ///
    /// Concurrent first callers share a single `users/me` request. A failed
    /// lookup is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// [`ClientError::TenantNotFound`] when the user has no business
    /// memberships, otherwise the transport, status, decode or auth error of
    /// the lookup.
    pub async fn ensure_business_id(&self) -> Result<&BusinessId, ClientError> {
        self.business_id
            .get_or_try_init(|| self.request_business_id())
            .await
    }

    /// The business id if it has already been resolved or pre-seeded.
    #[must_use]
    pub fn business_id(&self) -> Option<&BusinessId> {
        self.business_id.get()
    }

    #[tracing::instrument(skip_all)]
    async fn request_business_id(&self) -> Result<BusinessId, ClientError> {
        let url = self.endpoint("api/v1/users/me")?;
        let me: CurrentUserResponse = self.get_json("users/me", &url).await?;

        // The first membership is authoritative.
        let id = me
            .response
            .business_memberships
            .into_iter()
            .next()
            .map(|m| m.business.id)
            .ok_or(ClientError::TenantNotFound)?;

        tracing::info!(business_id = %id, "resolved FreshBooks business");
        Ok(id)
    }
}
