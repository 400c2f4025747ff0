#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use mockito::{Server, ServerGuard};

    use super::super::*;
    use crate::snapshot::{BuildId, BuildSnapshot};

    fn settings(dir: &std::path::Path) -> CrawlSettings {
        CrawlSettings {
            poll_interval: Duration::from_millis(20),
            request_timeout: Some(Duration::from_secs(5)),
            output_dir: Some(dir.to_path_buf()),
            ..CrawlSettings::default()
        }
    }

    async fn mock_stage(server: &mut ServerGuard) -> (mockito::Mock, mockito::Mock) {
        let stage = server
            .mock("GET", "/job/app/9/execution/node/6/wfapi/describe")
            .with_status(200)
            .with_body(
                r#"{"name": "build1", "startTimeMillis": 100,
                    "_links": {"log": {"href": "/job/app/9/execution/node/6/wfapi/log"}}}"#,
            )
            .create_async()
            .await;
        let log = server
            .mock("GET", "/job/app/9/execution/node/6/wfapi/log")
            .with_status(200)
            .with_body(r#"{"nodeStatus": "IN_PROGRESS", "length": 3, "text": "abc"}"#)
            .create_async()
            .await;
        (stage, log)
    }

    fn describe_body(status: &str) -> Vec<u8> {
        format!(
            r#"{{"id": "9", "name": "app #9", "status": "{status}",
                "stages": [{{"_links": {{"self": {{"href": "/job/app/9/execution/node/6/wfapi/describe"}}}}}}]}}"#
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_crawl_polls_until_terminal_status() {
        let mut server = Server::new_async().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let describe = server
            .mock("GET", "/job/app/9/wfapi/describe")
            .with_status(200)
            .with_body_from_request(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    describe_body("IN_PROGRESS")
                } else {
                    describe_body("SUCCESS")
                }
            })
            .expect(2)
            .create_async()
            .await;
        let _stage = mock_stage(&mut server).await;

        let dir = tempfile::tempdir().unwrap();
        let handle = start_crawl(
            settings(dir.path()),
            &format!("{}/job/app/9/", server.url()),
            BuildId::from("build1"),
        )
        .await
        .unwrap();
        let output_path = handle.output_path().to_path_buf();

        let last = tokio::time::timeout(Duration::from_secs(10), handle.wait())
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        describe.assert_async().await;
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(last.status, "SUCCESS");
        assert_eq!(last.stages.len(), 1);
        assert_eq!(last.stages[0].name, "build1");
        assert_eq!(last.stages[0].start_time, 100);
        assert_eq!(last.stages[0].log_text, "abc");

        assert_eq!(output_path, dir.path().join("out_build1.json"));
        let written: BuildSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(written, last);
    }

    #[tokio::test]
    async fn test_cancel_stops_running_crawl() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("GET", "/job/app/9/wfapi/describe")
            .with_status(200)
            .with_body(describe_body("IN_PROGRESS"))
            .create_async()
            .await;
        let _stage = mock_stage(&mut server).await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.poll_interval = Duration::from_secs(3600);

        let handle = start_crawl(
            settings,
            &format!("{}/job/app/9", server.url()),
            BuildId::from("build1"),
        )
        .await
        .unwrap();

        let output_path = handle.output_path().to_path_buf();
        tokio::time::timeout(Duration::from_secs(10), async {
            while !output_path.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        handle.cancellation_token().cancel();
        let last = tokio::time::timeout(Duration::from_secs(10), handle.wait())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(last.map(|s| s.status), Some("IN_PROGRESS".to_string()));
    }

    #[tokio::test]
    async fn test_start_crawl_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let result = start_crawl(settings(dir.path()), "::not a url::", BuildId::from("x")).await;

        assert!(result.is_err());
    }
}
