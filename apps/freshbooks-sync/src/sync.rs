//! Sync driver: walks every syncer of a connector and writes the result as
//! JSON lines.

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use freshbooks_connector_sdk::{
    ConnectorApi, Entitlement, Grant, ListPage, PageToken, Resource, ResourceSyncer, ResourceType,
    SyncError,
};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

/// Resources whose entitlements and grants are fetched at the same time.
const RESOURCE_CONCURRENCY: usize = 8;

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    ResourceType(ResourceType),
    Resource(Resource),
    Entitlement(Entitlement),
    Grant(Grant),
}

/// Counts of what a sync produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub resource_types: usize,
    pub resources: usize,
    pub entitlements: usize,
    pub grants: usize,
}

impl SyncSummary {
    fn add(&mut self, record: &Record) {
        match record {
            Record::ResourceType(_) => self.resource_types += 1,
            Record::Resource(_) => self.resources += 1,
            Record::Entitlement(_) => self.entitlements += 1,
            Record::Grant(_) => self.grants += 1,
        }
    }
}

/// Run one full sync and write every record to `out`.
///
/// Syncers run concurrently; within a syncer, resources are listed first
/// and then their entitlements and grants are collected with bounded
/// concurrency. Output is grouped per syncer in the order the connector
/// returns them.
///
/// # Errors
/// Returns the first syncer failure or a write error. Nothing is written
/// unless every syncer succeeded.
pub async fn run<W: Write>(
    connector: &dyn ConnectorApi,
    page_size: u32,
    out: &mut W,
) -> Result<SyncSummary> {
    let syncers = connector.resource_syncers();

    let per_syncer = futures::future::try_join_all(
        syncers
            .iter()
            .map(|syncer| collect_syncer(syncer.as_ref(), page_size)),
    )
    .await?;

    let mut summary = SyncSummary::default();
    for record in per_syncer.into_iter().flatten() {
        summary.add(&record);
        serde_json::to_writer(&mut *out, &record).context("failed to encode record")?;
        out.write_all(b"\n").context("failed to write output")?;
    }
    out.flush().context("failed to flush output")?;

    tracing::info!(
        resource_types = summary.resource_types,
        resources = summary.resources,
        entitlements = summary.entitlements,
        grants = summary.grants,
        "sync finished"
    );
    Ok(summary)
}

#[tracing::instrument(skip_all, fields(resource_type = %syncer.resource_type().id))]
async fn collect_syncer(syncer: &dyn ResourceSyncer, page_size: u32) -> Result<Vec<Record>> {
    let resource_type = syncer.resource_type().clone();
    let type_id = resource_type.id.clone();

    let resources = drain(page_size, move |token| async move {
        syncer.list(None, &token).await
    })
    .await
    .with_context(|| format!("listing {type_id} resources failed"))?;
    tracing::debug!(count = resources.len(), "listed resources");

    let details: Vec<(Vec<Entitlement>, Vec<Grant>)> = futures::stream::iter(&resources)
        .map(move |resource| async move {
            let entitlements = drain(page_size, move |token| async move {
                syncer.entitlements(resource, &token).await
            })
            .await?;
            let grants = drain(page_size, move |token| async move {
                syncer.grants(resource, &token).await
            })
            .await?;
            Ok::<_, SyncError>((entitlements, grants))
        })
        .buffered(RESOURCE_CONCURRENCY)
        .try_collect()
        .await
        .with_context(|| format!("collecting {type_id} entitlements and grants failed"))?;

    let mut records = Vec::with_capacity(1 + resources.len());
    records.push(Record::ResourceType(resource_type));
    records.extend(resources.into_iter().map(Record::Resource));
    for (entitlements, grants) in details {
        records.extend(entitlements.into_iter().map(Record::Entitlement));
        records.extend(grants.into_iter().map(Record::Grant));
    }
    Ok(records)
}

/// Follow page tokens until a page reports no successor.
async fn drain<T, F, Fut>(page_size: u32, mut fetch: F) -> Result<Vec<T>, SyncError>
where
    F: FnMut(PageToken) -> Fut,
    Fut: Future<Output = Result<ListPage<T>, SyncError>>,
{
    let mut items = Vec::new();
    let mut token = PageToken::first(page_size);
    loop {
        let page = fetch(token.clone()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(next) if next == token.token => {
                return Err(SyncError::Internal(format!(
                    "page token '{next}' repeated; aborting enumeration"
                )));
            }
            Some(next) => token.token = next,
            None => return Ok(items),
        }
    }
}
