use std::sync::Arc;

use async_trait::async_trait;
use freshbooks_client::{DEFAULT_PER_PAGE, FreshBooksClient};
use freshbooks_connector_sdk::{ConnectorApi, ConnectorMetadata, ResourceSyncer, SyncError};

use crate::roles::RoleSyncer;
use crate::users::UserSyncer;

/// FreshBooks connector: users from `team_members`, roles from the
/// built-in role table.
pub struct Connector {
    client: Arc<FreshBooksClient>,
    page_size: i64,
}

impl Connector {
    #[must_use]
    pub fn new(client: Arc<FreshBooksClient>) -> Self {
        Self {
            client,
            page_size: i64::from(DEFAULT_PER_PAGE),
        }
    }

    /// Page size used when filling the team member cache.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = i64::from(page_size);
        self
    }

    #[must_use]
    pub fn client(&self) -> &Arc<FreshBooksClient> {
        &self.client
    }
}

#[async_trait]
impl ConnectorApi for Connector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "FreshBooks".to_owned(),
            description: "Syncs team members and their business roles from FreshBooks".to_owned(),
        }
    }

    async fn validate(&self) -> Result<(), SyncError> {
        let id = self
            .client
            .ensure_business_id()
            .await
            .map_err(SyncError::upstream)?;
        tracing::info!(business_id = %id, "credentials validated");
        Ok(())
    }

    fn resource_syncers(&self) -> Vec<Box<dyn ResourceSyncer>> {
        vec![
            Box::new(UserSyncer::new(Arc::clone(&self.client))),
            Box::new(RoleSyncer::new(Arc::clone(&self.client), self.page_size)),
        ]
    }
}
