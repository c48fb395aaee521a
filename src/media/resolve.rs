//! Concurrent media fetching.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::paths::{canonical_media_path, source_format};
use super::store::{MediaStore, StoreError, StoredMedia};
use crate::cancel::CancelToken;
use crate::config::BuildConfig;
use crate::error::{BuildWarning, Error, MissingReason, Result};
use crate::model::{
    CourseContent, MediaKey, MediaKind, MediaOrigin, MediaRef, ResolvedAsset, ResolvedEntry,
    ResolvedMedia,
};
use crate::util::{MediaFormat, sniff_media_format};

/// What the resolver produced for one build.
#[derive(Debug, Default)]
pub struct Resolution {
    pub media: ResolvedMedia,
    /// Sorted, so identical inputs give identical warning lists.
    pub warnings: Vec<BuildWarning>,
    /// Every key a fetch was attempted for, in request order.
    pub attempted: Vec<MediaKey>,
}

type FetchOutcome = std::result::Result<StoredMedia, MissingReason>;

/// Fetches every referenced item from a [`MediaStore`].
///
/// Fetches run on blocking workers, at most `max_concurrent_fetches` at a
/// time, each bounded by the fetch timeout. A timed-out fetch keeps its slot
/// until the store call actually returns. The whole stage is bounded by the
/// build timeout; fetches still outstanding then are abandoned.
pub struct MediaResolver {
    store: Arc<dyn MediaStore>,
    project_id: Option<String>,
    fetch_timeout: Duration,
    build_timeout: Duration,
    concurrency: usize,
}

impl MediaResolver {
    pub fn new(store: Arc<dyn MediaStore>, config: &BuildConfig) -> Self {
        Self {
            store,
            project_id: config.project_id.clone(),
            fetch_timeout: config.fetch_timeout(),
            build_timeout: config.build_timeout(),
            concurrency: config.fetch_concurrency(),
        }
    }

    /// Resolve every media reference in `content`.
    ///
    /// Missing items never fail the build; they are dropped and reported as
    /// [`BuildWarning::MissingMedia`]. Only cancellation is an error.
    pub async fn resolve(&self, content: &CourseContent, cancel: &CancelToken) -> Result<Resolution> {
        cancel.check()?;

        let refs = super::collect_media(content);
        let mut warnings = Vec::new();
        let inventory = self.inventory(&mut warnings).await;

        let mut media = ResolvedMedia::new();
        let mut pending = Vec::new();
        for mut media_ref in refs {
            if let Some(listed) = inventory.get(&media_ref.key()) {
                if media_ref.embed_url.is_none() {
                    media_ref.embed_url = listed.embed_url.clone();
                }
                if media_ref.source.is_none() {
                    media_ref.source = listed.source.clone();
                }
            }
            match &media_ref.embed_url {
                Some(url) => {
                    debug!(id = %media_ref.id, url = %url, "media is an external embed");
                    media.insert(media_ref.key(), ResolvedEntry::Embed { url: url.clone() });
                }
                None => pending.push(media_ref),
            }
        }

        info!(
            fetches = pending.len(),
            embeds = media.len(),
            concurrency = self.concurrency,
            "resolving media"
        );

        let outcomes = self.fetch_all(&pending, cancel).await?;

        let mut used_paths = BTreeSet::new();
        for (media_ref, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(stored) => {
                    let asset = build_asset(media_ref, stored, &mut used_paths);
                    debug!(id = %media_ref.id, path = %asset.path, bytes = asset.byte_len, "media resolved");
                    media.insert(media_ref.key(), ResolvedEntry::File(asset));
                }
                Err(reason) => {
                    if media_ref.origin == MediaOrigin::Declared {
                        warn!(id = %media_ref.id, kind = %media_ref.kind, %reason, "dropping media");
                    } else {
                        debug!(id = %media_ref.id, %reason, "no conventional narration");
                    }
                    warnings.push(BuildWarning::MissingMedia {
                        id: media_ref.id.clone(),
                        kind: media_ref.kind,
                        page_id: media_ref.page_id.clone(),
                        declared: media_ref.origin == MediaOrigin::Declared,
                        reason,
                    });
                }
            }
        }

        warnings.sort();
        Ok(Resolution {
            media,
            warnings,
            attempted: pending.iter().map(MediaRef::key).collect(),
        })
    }

    /// Consult the store's listing for the configured project.
    async fn inventory(&self, warnings: &mut Vec<BuildWarning>) -> BTreeMap<MediaKey, MediaRef> {
        let Some(project_id) = self.project_id.clone() else {
            return BTreeMap::new();
        };
        let store = Arc::clone(&self.store);
        let listing = tokio::task::spawn_blocking(move || store.list(&project_id));

        let message = match tokio::time::timeout(self.fetch_timeout, listing).await {
            Ok(Ok(Ok(items))) => {
                debug!(items = items.len(), "loaded media inventory");
                return items.into_iter().map(|m| (m.key(), m)).collect();
            }
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "listing timed out".to_string(),
        };
        warn!(error = %message, "media inventory unavailable");
        warnings.push(BuildWarning::InventoryUnavailable(message));
        BTreeMap::new()
    }

    /// Fetch every pending reference; outcomes come back in input order.
    async fn fetch_all(&self, pending: &[MediaRef], cancel: &CancelToken) -> Result<Vec<FetchOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, media_ref) in pending.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let id = media_ref.id.clone();
            let timeout = self.fetch_timeout;

            tasks.spawn(async move {
                let Ok(permit) = semaphore.acquire_owned().await else {
                    return (index, Err(MissingReason::Abandoned));
                };
                // The worker holds the permit until the store call returns,
                // even after a timeout or abort has given up on it.
                let fetch = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    store.fetch(&id)
                });
                let outcome = match tokio::time::timeout(timeout, fetch).await {
                    Ok(Ok(Ok(stored))) => Ok(stored),
                    Ok(Ok(Err(StoreError::NotFound(_)))) => Err(MissingReason::NotFound),
                    Ok(Ok(Err(e))) => Err(MissingReason::Store(e.to_string())),
                    Ok(Err(e)) => Err(MissingReason::Store(e.to_string())),
                    Err(_) => Err(MissingReason::TimedOut),
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; pending.len()];
        let deadline = tokio::time::sleep(self.build_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    info!("media resolution cancelled");
                    return Err(Error::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(
                        outstanding = tasks.len(),
                        "build time limit reached, abandoning outstanding fetches"
                    );
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => outcomes[index] = Some(outcome),
                    Some(Err(e)) => warn!(error = %e, "fetch task failed"),
                    None => break,
                },
            }
        }

        Ok(outcomes
            .into_iter()
            .map(|o| o.unwrap_or(Err(MissingReason::Abandoned)))
            .collect())
    }
}

/// Pick a MIME type and archive path for fetched bytes.
fn build_asset(media_ref: &MediaRef, stored: StoredMedia, used_paths: &mut BTreeSet<String>) -> ResolvedAsset {
    let raw_name = media_ref.source.as_deref().unwrap_or(&media_ref.id);
    let mime_type = stored
        .mime_type
        .filter(|m| MediaFormat::from_mime(m).is_some())
        .or_else(|| {
            let sniffed = sniff_media_format(&stored.data);
            (sniffed != MediaFormat::Binary).then(|| sniffed.mime_type().to_string())
        })
        .or_else(|| source_format(raw_name).map(|f| f.mime_type().to_string()))
        .unwrap_or_else(|| default_mime(media_ref.kind).to_string());

    let base = canonical_media_path(media_ref.kind, &media_ref.id, Some(&mime_type));
    let path = unique_path(base, used_paths);

    ResolvedAsset {
        path,
        byte_len: stored.data.len() as u64,
        mime_type,
        data: stored.data,
    }
}

fn default_mime(kind: MediaKind) -> &'static str {
    MediaFormat::from_extension(kind.default_extension())
        .map(MediaFormat::mime_type)
        .unwrap_or("application/octet-stream")
}

/// Suffix `-2`, `-3`, ... onto the stem until the path is unused.
fn unique_path(base: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let (stem, ext) = base.rsplit_once('.').unwrap_or((base.as_str(), ""));
    let mut n = 2;
    loop {
        let candidate = if ext.is_empty() {
            format!("{stem}-{n}")
        } else {
            format!("{stem}-{n}.{ext}")
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
