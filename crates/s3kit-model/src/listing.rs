//! Object and bucket listings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Owner;

/// Listing snapshot of one object. Not refreshed after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// Object key.
    pub name: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// ETag with surrounding quotes removed.
    pub content_hash: String,
}

/// A key prefix grouped by the listing delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonPrefix {
    /// The prefix, including the trailing delimiter.
    pub prefix: String,
}

/// One `ListBucketResult` page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Objects in server order.
    pub objects: Vec<ObjectMetadata>,
    /// Grouped prefixes in server order.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Whether more results follow.
    pub is_truncated: bool,
    /// Explicit `NextMarker`, if the server sent one.
    pub next_marker: Option<String>,
}

impl ListingPage {
    /// The marker to resume from: the explicit `NextMarker` when present,
    /// otherwise the last key on the page.
    #[must_use]
    pub fn continuation_marker(&self) -> Option<&str> {
        self.next_marker
            .as_deref()
            .or_else(|| self.objects.last().map(|o| o.name.as_str()))
    }
}

/// Objects and prefixes accumulated across listing pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketListing {
    /// Objects keyed by name.
    pub objects: BTreeMap<String, ObjectMetadata>,
    /// Common prefixes keyed by prefix. Empty unless requested.
    pub common_prefixes: BTreeMap<String, CommonPrefix>,
}

impl BucketListing {
    /// Merge a page into the listing. A later entry for the same name
    /// replaces an earlier one.
    pub fn merge(&mut self, page: ListingPage, include_common_prefixes: bool) {
        for object in page.objects {
            self.objects.insert(object.name.clone(), object);
        }
        if include_common_prefixes {
            for prefix in page.common_prefixes {
                self.common_prefixes.insert(prefix.prefix.clone(), prefix);
            }
        }
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the listing contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

/// One bucket of a detailed bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Bucket name.
    pub name: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Detailed `ListAllMyBucketsResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInventory {
    /// Account owner, when reported.
    pub owner: Option<Owner>,
    /// Buckets in server order.
    pub buckets: Vec<BucketEntry>,
}

impl BucketInventory {
    /// Bucket names in server order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.name.clone()).collect()
    }
}
