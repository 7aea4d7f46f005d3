use s3kit_model::{BucketInventory, BucketListing, ListingPage};
use s3kit_xml::from_xml;
use tracing::debug;

use crate::classify::Operation;
use crate::client::{RequestSpec, S3Client};
use crate::error::ClientResult;
use crate::paginate::{PageQuery, paginate};
use crate::request::ListObjectsRequest;

impl S3Client {
    /// List the objects in a bucket, following continuation markers unless
    /// `max_keys` is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::ListObjectsFailed`] or
    /// [`crate::ClientError::Xml`] if the first page fails. Later pages that
    /// fail end the listing early without an error.
    pub async fn list_objects(&self, request: &ListObjectsRequest) -> ClientResult<BucketListing> {
        let bucket = request.bucket.as_str();
        paginate(request, move |query| self.list_page(bucket, query)).await
    }

    /// Fetch and decode one `ListObjects` page.
    async fn list_page(&self, bucket: &str, query: PageQuery) -> ClientResult<ListingPage> {
        let mut spec = RequestSpec::new(http::Method::GET, bucket, "");
        spec.query = query.to_params();
        let response = self.call(Operation::ListObjects, spec).await?;
        Ok(from_xml::<ListingPage>(&response.body)?)
    }

    /// Names of all buckets owned by the caller.
    ///
    /// # Errors
    ///
    /// See [`S3Client::list_buckets_detailed`].
    pub async fn list_buckets(&self) -> ClientResult<Vec<String>> {
        Ok(self.list_buckets_detailed().await?.names())
    }

    /// All buckets owned by the caller, with owner and creation dates.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::ListBucketsFailed`] when the service
    /// rejects the request and [`crate::ClientError::Xml`] when the response
    /// cannot be decoded.
    pub async fn list_buckets_detailed(&self) -> ClientResult<BucketInventory> {
        let spec = RequestSpec::new(http::Method::GET, "", "");
        let response = self.call(Operation::ListBuckets, spec).await?;
        let inventory = from_xml::<BucketInventory>(&response.body)?;
        debug!(count = inventory.buckets.len(), "listed buckets");
        Ok(inventory)
    }
}
