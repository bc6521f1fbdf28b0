mod common;

use audiobook_catalog::controllers::routes;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;

use common::{message_of, multipart_body, offline_storage, unreachable_pool};

#[tokio::test]
async fn health_answers_without_a_database() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/health")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/nothing-here")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(response.body()), "Not found");
}

#[tokio::test]
async fn malformed_book_id_is_not_found() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/books/not-a-uuid")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_book_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    for path in ["/api/books", "/api/admin/books"] {
        let response = warp::test::request()
            .method("POST")
            .path(path)
            .json(&json!({ "title": "Dune", "author": "Frank Herbert" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(message_of(response.body()), "Unauthorized");
    }
}

#[tokio::test]
async fn updating_a_book_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let id = Uuid::new_v4();
    for path in [
        format!("/api/books/{}", id),
        format!("/api/admin/books/{}", id),
    ] {
        let response = warp::test::request()
            .method("PUT")
            .path(&path)
            .json(&json!({ "rating": 4.0 }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[tokio::test]
async fn admin_reads_and_deletes_require_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let id = Uuid::new_v4();
    let requests = [
        ("GET", "/api/admin/books".to_string()),
        ("GET", format!("/api/admin/books/{}", id)),
        ("DELETE", format!("/api/admin/books/{}", id)),
        ("GET", "/api/admin/stats".to_string()),
    ];
    for (method, path) in requests {
        let response = warp::test::request()
            .method(method)
            .path(&path)
            .reply(&api)
            .await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {}",
            method,
            path
        );
    }
}

#[tokio::test]
async fn blank_authorization_header_counts_as_missing() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/admin/books")
        .header("authorization", "  ")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("POST")
        .path("/api/progress")
        .header("authorization", "Bearer token")
        .header("content-type", "application/json")
        .body("{ not json")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(response.body()), "Malformed request body");
}

#[tokio::test]
async fn saving_progress_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("POST")
        .path("/api/progress")
        .json(&json!({
            "bookId": Uuid::new_v4(),
            "userId": "uid-1",
            "progress": 12,
            "currentTime": 300.0,
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn progress_over_one_hundred_percent_is_rejected() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("POST")
        .path("/api/progress")
        .header("authorization", "Bearer token")
        .json(&json!({
            "bookId": Uuid::new_v4(),
            "userId": "uid-1",
            "progress": 150,
            "currentTime": 300.0,
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(response.body()),
        "Progress must be between 0 and 100."
    );
}

#[tokio::test]
async fn progress_lookup_needs_a_user() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path(&format!("/api/progress?bookId={}", Uuid::new_v4()))
        .header("authorization", "Bearer token")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(response.body()), "Missing required parameters");
}

#[tokio::test]
async fn profile_lookup_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/users/profile?email=reader@example.com")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_creation_validates_email() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("POST")
        .path("/api/users/profile")
        .json(&json!({ "email": "nobody" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let boundary = "audiobook-boundary";
    let response = warp::test::request()
        .method("POST")
        .path("/api/storage/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(multipart_body(boundary, "audio/mpeg", "audio"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_rejects_wrong_content_type() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let boundary = "audiobook-boundary";
    let response = warp::test::request()
        .method("POST")
        .path("/api/storage/upload")
        .header("authorization", "Bearer token")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(multipart_body(boundary, "text/plain", "audio"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(response.body()),
        "Invalid file type for audio file"
    );
}

#[tokio::test]
async fn delete_needs_a_path() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("DELETE")
        .path("/api/storage/delete")
        .header("authorization", "Bearer token")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(response.body()), "File path is required");
}

#[tokio::test]
async fn listing_files_requires_authorization() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/storage/files?path=books")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn well_formed_upload_reaches_storage() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let boundary = "audiobook-boundary";
    let response = warp::test::request()
        .method("POST")
        .path("/api/storage/upload")
        .header("authorization", "Bearer token")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(multipart_body(boundary, "audio/mpeg", "audio"))
        .reply(&api)
        .await;
    // The storage endpoint is unreachable, so getting this far is a 500.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message_of(response.body()),
        "An internal exception occurred."
    );
}

#[tokio::test]
async fn missing_authorization_wins_over_a_bad_body() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let requests = vec![
        warp::test::request()
            .method("POST")
            .path("/api/progress")
            .header("content-type", "application/json")
            .body("{}"),
        warp::test::request()
            .method("PUT")
            .path(&format!("/api/admin/books/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(r#"{"rating":"five"}"#),
        warp::test::request()
            .method("POST")
            .path("/api/books")
            .header("content-type", "application/json")
            .body("{ not json"),
    ];
    for request in requests {
        let response = request.reply(&api).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message_of(response.body()), "Unauthorized");
    }
}

#[tokio::test]
async fn missing_authorization_wins_over_a_bad_query() {
    let api = routes(&unreachable_pool(), &offline_storage());
    let response = warp::test::request()
        .method("GET")
        .path("/api/progress?userId=u&bookId=zzz")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response.body()), "Unauthorized");
}
