//! Listing pagination.
//!
//! Presents one logical listing over a server API that truncates at a page
//! size. The paginator is generic over the page fetch so it can be driven by
//! the client or by a scripted source in tests.

use std::future::Future;

use s3kit_model::{BucketListing, ListingPage};
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::request::ListObjectsRequest;

/// Query parameters of one `ListObjects` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Key prefix.
    pub prefix: String,
    /// Resume after this key.
    pub marker: String,
    /// Page size; only sent on the first page.
    pub max_keys: Option<u32>,
    /// Grouping delimiter.
    pub delimiter: String,
}

impl PageQuery {
    /// Query for the first page of `request`.
    #[must_use]
    pub fn first(request: &ListObjectsRequest) -> Self {
        Self {
            prefix: request.prefix.clone(),
            marker: request.marker.clone(),
            max_keys: request.max_keys,
            delimiter: request.delimiter.clone(),
        }
    }

    /// Query for a continuation page: same prefix and delimiter, new marker,
    /// no page size.
    #[must_use]
    pub fn continuation(&self, marker: impl Into<String>) -> Self {
        Self {
            prefix: self.prefix.clone(),
            marker: marker.into(),
            max_keys: None,
            delimiter: self.delimiter.clone(),
        }
    }

    /// Query string parameters. Empty values are omitted.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(4);
        if !self.prefix.is_empty() {
            params.push(("prefix".to_owned(), self.prefix.clone()));
        }
        if !self.marker.is_empty() {
            params.push(("marker".to_owned(), self.marker.clone()));
        }
        if let Some(max_keys) = self.max_keys {
            params.push(("max-keys".to_owned(), max_keys.to_string()));
        }
        if !self.delimiter.is_empty() {
            params.push(("delimiter".to_owned(), self.delimiter.clone()));
        }
        params
    }
}

/// Fetch pages until the listing is complete.
///
/// - An explicit `max_keys` returns after the first page.
/// - Otherwise pages are fetched while the last page was truncated and a
///   continuation marker is known.
/// - Only a first-page error is returned. A failing continuation page ends
///   the listing with what was gathered so far.
pub async fn paginate<F, Fut>(
    request: &ListObjectsRequest,
    mut fetch: F,
) -> ClientResult<BucketListing>
where
    F: FnMut(PageQuery) -> Fut,
    Fut: Future<Output = ClientResult<ListingPage>>,
{
    let first = PageQuery::first(request);
    let page = fetch(first.clone()).await?;

    let mut listing = BucketListing::default();
    let mut truncated = page.is_truncated;
    let mut marker = page.continuation_marker().map(str::to_owned);
    listing.merge(page, request.include_common_prefixes);

    if request.max_keys.is_some() {
        debug!(bucket = %request.bucket, objects = listing.len(), "listed one page");
        return Ok(listing);
    }

    let mut pages = 1usize;
    while truncated {
        let Some(current) = marker.take() else {
            break;
        };

        match fetch(first.continuation(&current)).await {
            Ok(page) => {
                pages += 1;
                truncated = page.is_truncated;
                marker = page.continuation_marker().map(str::to_owned);
                listing.merge(page, request.include_common_prefixes);

                if marker.as_deref() == Some(current.as_str()) {
                    warn!(
                        bucket = %request.bucket,
                        marker = %current,
                        "listing marker did not advance"
                    );
                    break;
                }
            }
            Err(err) => {
                warn!(
                    bucket = %request.bucket,
                    marker = %current,
                    error = %err,
                    "continuation page failed, returning partial listing"
                );
                break;
            }
        }
    }

    debug!(bucket = %request.bucket, pages, objects = listing.len(), "listed objects");
    Ok(listing)
}
