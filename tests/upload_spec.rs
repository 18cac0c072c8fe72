use speculate2::speculate;

speculate! {
    use std::collections::HashMap;

    use axum::extract::{Multipart, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use issue_tracker::upload::{ImageHost, ImgbbClient, UploadError};
    use serde_json::json;
    use tokio_test::block_on;

    /// Stand-in for the ImgBB upload endpoint. The API key picks the outcome.
    async fn fake_imgbb(
        Query(params): Query<HashMap<String, String>>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut image = None;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("image") {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap_or_default();
                image = Some((filename, bytes.len()));
            }
        }

        let Some((filename, size)) = image else {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "no image"})));
        };

        match params.get("key").map(String::as_str) {
            Some("good-key") => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": {"url": format!("https://i.ibb.test/{size}/{filename}")},
                })),
            ),
            Some("flaky-key") => (
                StatusCode::OK,
                Json(json!({"success": false, "error": {"message": "Invalid image source"}})),
            ),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": {"message": "Invalid API v1 key."}})),
            ),
        }
    }

    /// Serves the fake endpoint on an ephemeral port for the current runtime.
    async fn spawn_imgbb() -> String {
        let app = Router::new().route("/1/upload", post(fake_imgbb));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/1/upload")
    }

    fn upload_with(key: Option<&str>) -> Result<String, UploadError> {
        block_on(async {
            let endpoint = spawn_imgbb().await;
            ImgbbClient::new(key.map(str::to_string), endpoint)
                .upload(vec![0u8; 16], "crash.png", "image/png")
                .await
        })
    }

    describe "imgbb client" {
        it "returns the hosted url on success" {
            let url = upload_with(Some("good-key")).unwrap();

            assert_eq!(url, "https://i.ibb.test/16/crash.png");
        }

        it "reports an unsuccessful body" {
            let err = upload_with(Some("flaky-key")).unwrap_err();

            assert!(matches!(err, UploadError::Unsuccessful(ref msg) if msg == "Invalid image source"));
        }

        it "reports a rejected status with the response body" {
            match upload_with(Some("revoked-key")).unwrap_err() {
                UploadError::Rejected(body) => assert!(body.contains("Invalid API v1 key.")),
                other => panic!("expected Rejected, got {other:?}"),
            }
        }

        it "refuses to upload without an api key" {
            assert!(matches!(upload_with(None).unwrap_err(), UploadError::NotConfigured));
            assert!(matches!(upload_with(Some("  ")).unwrap_err(), UploadError::NotConfigured));
        }
    }
}
