//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use s3kit_client::{
        Body, ClientError, MultipartStage, PositionedRead, PutObjectRequest, UploadPartRequest,
        upload_parts_concurrently,
    };
    use s3kit_model::MultipartSession;

    use crate::{create_test_bucket, memory_client};

    const TOTAL: usize = 12_000_000;

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 253) as u8).collect()
    }

    /// Serves the same pattern as [`patterned`] without holding it in memory.
    #[derive(Debug)]
    struct PatternReader;

    #[async_trait]
    impl PositionedRead for PatternReader {
        async fn read_at(&self, offset: u64, len: u64) -> std::io::Result<Bytes> {
            Ok((offset..offset + len).map(|i| (i % 253) as u8).collect())
        }
    }

    #[tokio::test]
    async fn test_should_upload_in_caller_driven_loop() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-loop");
        let body = Body::from_bytes(patterned(TOTAL)).with_content_type("application/x-tar");
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("archive.tar")
            .build();

        let upload_id = client.start_multipart(&body, &request).await?;
        assert_eq!(server.open_uploads(), 1);

        let mut etags = Vec::new();
        let mut part_number = 1;
        while let Some(etag) = client
            .upload_multipart(
                &body,
                &UploadPartRequest::builder()
                    .bucket(&bucket)
                    .key("archive.tar")
                    .upload_id(&upload_id)
                    .part_number(part_number)
                    .build(),
            )
            .await?
        {
            etags.push(etag);
            part_number += 1;
        }
        assert_eq!(etags.len(), 3);

        client
            .finalize_multipart(&bucket, "archive.tar", &upload_id, &etags)
            .await?;

        let stored = server.object(&bucket, "archive.tar").expect("stored");
        assert_eq!(stored.data.len(), TOTAL);
        assert_eq!(stored.data, Bytes::from(patterned(TOTAL)));
        assert!(stored.etag.ends_with("-3"));
        assert_eq!(stored.content_type, "application/x-tar");
        assert_eq!(server.open_uploads(), 0);

        let sizes: Vec<_> = server
            .requests()
            .iter()
            .filter(|r| r.query_param("partNumber").is_some())
            .map(|r| r.body.len())
            .collect();
        assert_eq!(sizes, vec![5_242_880, 5_242_880, 1_514_240]);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_upload_session_concurrently() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-par");
        let body = Body::from_reader(Arc::new(PatternReader), TOTAL as u64);
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("streamed.bin")
            .build();

        let mut session = client.start_session(&body, &request).await?;
        upload_parts_concurrently(&client, &mut session, &body, 3).await?;
        assert!(session.is_complete());

        let persisted = serde_json::to_string(&session)?;
        let restored: MultipartSession = serde_json::from_str(&persisted)?;
        assert_eq!(restored, session);
        client.finalize_session(restored).await?;

        let stored = server.object(&bucket, "streamed.bin").expect("stored");
        assert_eq!(stored.data, Bytes::from(patterned(TOTAL)));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_resume_session_after_part_failure() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-resume");
        let body = Body::from_bytes(patterned(TOTAL));
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("resumed.bin")
            .build();

        let mut session = client.start_session(&body, &request).await?;
        client.upload_session_part(&mut session, &body, 1).await?;

        server.fail_request_at(
            0,
            s3kit_client::TransportError::new("ConnectionReset", "connection reset"),
        );
        let err = client
            .upload_session_part(&mut session, &body, 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MultipartFailed {
                stage: MultipartStage::UploadPart,
                ..
            }
        ));
        assert_eq!(session.missing_parts(), vec![2, 3]);

        upload_parts_concurrently(&client, &mut session, &body, 2).await?;
        client.finalize_session(session).await?;
        assert_eq!(
            server.object(&bucket, "resumed.bin").expect("stored").data.len(),
            TOTAL
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_should_resume_concurrent_upload_after_failure() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-par-resume");
        let body = Body::from_bytes(patterned(TOTAL));
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("interrupted.bin")
            .build();

        let mut session = client.start_session(&body, &request).await?;
        server.fail_request_at(
            2,
            s3kit_client::TransportError::new("ConnectionReset", "connection reset"),
        );
        let err = upload_parts_concurrently(&client, &mut session, &body, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ConnectionReset"));
        assert_eq!(session.missing_parts(), vec![3]);

        let persisted = serde_json::to_string(&session)?;
        let mut restored: MultipartSession = serde_json::from_str(&persisted)?;
        let sent_before = server.requests().len();
        upload_parts_concurrently(&client, &mut restored, &body, 2).await?;
        assert_eq!(server.requests().len(), sent_before + 1);

        client.finalize_session(restored).await?;
        let stored = server.object(&bucket, "interrupted.bin").expect("stored");
        assert_eq!(stored.data, Bytes::from(patterned(TOTAL)));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_upload_empty_object_as_single_part() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-empty");
        let body = Body::from_bytes(Bytes::new());
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("empty")
            .build();

        let mut session = client.start_session(&body, &request).await?;
        assert!(client.upload_session_part(&mut session, &body, 1).await?.is_some());
        assert!(client.upload_session_part(&mut session, &body, 2).await?.is_none());
        client.finalize_session(session).await?;

        let stored = server.object(&bucket, "empty").expect("stored");
        assert!(stored.data.is_empty());
        assert!(stored.etag.ends_with("-1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_should_treat_request_timeout_on_finalize_as_success() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-timeout");
        let body = Body::from_bytes(patterned(1024));
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("slow.bin")
            .build();

        let mut session = client.start_session(&body, &request).await?;
        client.upload_session_part(&mut session, &body, 1).await?;

        server.time_out_after_complete(true);
        client.finalize_session(session).await?;
        assert!(server.object(&bucket, "slow.bin").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_unknown_part_etag() -> anyhow::Result<()> {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-badpart");
        let body = Body::from_bytes(patterned(1024));
        let request = PutObjectRequest::builder()
            .bucket(&bucket)
            .key("bad.bin")
            .build();

        let upload_id = client.start_multipart(&body, &request).await?;
        let err = client
            .finalize_multipart(&bucket, "bad.bin", &upload_id, &["0".repeat(32)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MultipartFailed {
                stage: MultipartStage::Finalize,
                ..
            }
        ));
        assert_eq!(err.code(), Some("InvalidPart"));
        assert_eq!(server.open_uploads(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_should_fail_part_for_unknown_upload() {
        let (client, server) = memory_client();
        let bucket = create_test_bucket(&server, "mpu-noupload");

        let request = UploadPartRequest::builder()
            .bucket(&bucket)
            .key("k")
            .upload_id("does-not-exist")
            .part_number(1)
            .build();
        let err = client
            .upload_multipart(&Body::from_bytes("abc"), &request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("NoSuchUpload"));
    }
}
