use std::sync::Arc;

use freshbooks_client::{ClientError, FreshBooksClient, PageOptions, TeamMember};
use tokio::sync::Mutex;

/// Full team member list, fetched on first use and then served from
/// memory for the rest of the sync run.
///
/// The lock is held across the whole fetch, so concurrent first callers
/// wait for one enumeration instead of starting their own. A failed fetch
/// leaves the cache empty.
pub struct TeamMemberCache {
    client: Arc<FreshBooksClient>,
    page_size: i64,
    members: Mutex<Option<Arc<[TeamMember]>>>,
}

impl TeamMemberCache {
    #[must_use]
    pub fn new(client: Arc<FreshBooksClient>, page_size: i64) -> Self {
        Self {
            client,
            page_size,
            members: Mutex::new(None),
        }
    }

    /// All team members, in API order.
    ///
    /// # Errors
    ///
    /// Propagates the first [`ClientError`] hit while resolving the
    /// business or fetching a page.
    pub async fn get_all(&self) -> Result<Arc<[TeamMember]>, ClientError> {
        let mut members = self.members.lock().await;
        if let Some(cached) = members.as_ref() {
            return Ok(Arc::clone(cached));
        }

        self.client.ensure_business_id().await?;

        let mut all = Vec::new();
        let mut opts = PageOptions::first(self.page_size);
        loop {
            let page = self.client.list_team_members(opts).await?;
            all.extend(page.items);

            match page.next_page {
                Some(next) if i64::from(next) > opts.page => opts.page = i64::from(next),
                Some(next) => {
                    tracing::warn!(next, current = opts.page, "next page does not advance; stopping");
                    break;
                }
                None => break,
            }
        }

        tracing::info!(count = all.len(), "cached team members");
        let fetched: Arc<[TeamMember]> = all.into();
        *members = Some(Arc::clone(&fetched));
        Ok(fetched)
    }
}
