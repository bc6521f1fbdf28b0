//! Runs against the database named by DATABASE_URL:
//! `cargo test -- --ignored`
mod common;

use audiobook_catalog::controllers::routes;
use serde_json::{json, Value};
use tokio_test::assert_ok;
use uuid::Uuid;
use warp::http::StatusCode;

use common::{database_pool, message_of, offline_storage};

const AUTH: &str = "Bearer test-token";

fn sample_book(title: &str) -> Value {
    json!({
        "title": title,
        "author": "Ada Writer",
        "narrator": "Sam Reader",
        "duration": "7h 12m",
        "rating": 4.5,
        "reviews": 12,
        "genre": "fantasy",
        "description": "A long walk.",
        "publishDate": "2021-04-01",
        "chapters": [
            { "id": 1, "title": "Opening", "duration": "12:00", "startTime": 0 },
            { "id": 2, "title": "", "duration": "3:00", "startTime": 720 }
        ]
    })
}

#[tokio::test]
#[ignore]
async fn book_lifecycle() {
    let api = routes(&database_pool(), &offline_storage());
    let title = format!("Lifecycle {}", Uuid::new_v4());

    let created = warp::test::request()
        .method("POST")
        .path("/api/admin/books")
        .header("authorization", AUTH)
        .json(&sample_book(&title))
        .reply(&api)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let book: Value = assert_ok!(serde_json::from_slice(created.body()));
    assert_eq!(book["genre"], json!("Fantasy"));
    assert_eq!(book["chapters"].as_array().map(Vec::len), Some(1));
    let id = book["id"].as_str().unwrap().to_owned();

    let fetched = warp::test::request()
        .method("GET")
        .path(&format!("/api/books/{}", id))
        .reply(&api)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let updated = warp::test::request()
        .method("PUT")
        .path(&format!("/api/admin/books/{}", id))
        .header("authorization", AUTH)
        .json(&json!({ "rating": 3.0 }))
        .reply(&api)
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let book: Value = serde_json::from_slice(updated.body()).unwrap();
    assert_eq!(book["rating"], json!(3.0));
    assert_eq!(book["title"], json!(title));

    let deleted = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/admin/books/{}", id))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = warp::test::request()
        .method("GET")
        .path(&format!("/api/books/{}", id))
        .reply(&api)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(gone.body()), "Book not found");
}

#[tokio::test]
#[ignore]
async fn search_matches_title_case_insensitively() {
    let api = routes(&database_pool(), &offline_storage());
    let marker = Uuid::new_v4().to_simple().to_string();
    let title = format!("Searchable {}", marker);
    let created = warp::test::request()
        .method("POST")
        .path("/api/books")
        .header("authorization", AUTH)
        .json(&sample_book(&title))
        .reply(&api)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let found = warp::test::request()
        .method("GET")
        .path(&format!(
            "/api/books?search={}&genre=All",
            marker.to_uppercase()
        ))
        .reply(&api)
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    let books: Vec<Value> = serde_json::from_slice(found.body()).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], json!(title));
}

#[tokio::test]
#[ignore]
async fn updating_a_missing_book_is_not_found() {
    let api = routes(&database_pool(), &offline_storage());
    let response = warp::test::request()
        .method("PUT")
        .path(&format!("/api/books/{}", Uuid::new_v4()))
        .header("authorization", AUTH)
        .json(&json!({ "title": "Nobody" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn progress_keeps_the_latest_write() {
    let api = routes(&database_pool(), &offline_storage());
    let user = format!("user-{}", Uuid::new_v4());
    let book = Uuid::new_v4();

    for (progress, current_time) in [(10.0, 60.0), (55.4, 3300.5)] {
        let saved = warp::test::request()
            .method("POST")
            .path("/api/progress")
            .header("authorization", AUTH)
            .json(&json!({
                "bookId": book,
                "userId": user,
                "progress": progress,
                "currentTime": current_time,
            }))
            .reply(&api)
            .await;
        assert_eq!(saved.status(), StatusCode::OK);
    }

    let one = warp::test::request()
        .method("GET")
        .path(&format!("/api/progress?userId={}&bookId={}", user, book))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let record: Value = serde_json::from_slice(one.body()).unwrap();
    assert_eq!(record["progress"], json!(55));
    assert_eq!(record["currentTime"], json!(3300.5));

    let all = warp::test::request()
        .method("GET")
        .path(&format!("/api/progress?userId={}", user))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let records: Vec<Value> = serde_json::from_slice(all.body()).unwrap();
    assert_eq!(records.len(), 1);

    let unknown = warp::test::request()
        .method("GET")
        .path(&format!(
            "/api/progress?userId={}&bookId={}",
            user,
            Uuid::new_v4()
        ))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let empty: Value = serde_json::from_slice(unknown.body()).unwrap();
    assert_eq!(empty, json!({ "progress": 0, "currentTime": 0.0 }));
}

#[tokio::test]
#[ignore]
async fn profile_is_created_once() {
    let api = routes(&database_pool(), &offline_storage());
    let email = format!("{}@example.com", Uuid::new_v4().to_simple());

    let first = warp::test::request()
        .method("POST")
        .path("/api/users/profile")
        .json(&json!({ "email": email }))
        .reply(&api)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let created: Value = serde_json::from_slice(first.body()).unwrap();
    assert_eq!(created["preferences"]["theme"], json!("light"));

    let second = warp::test::request()
        .method("POST")
        .path("/api/users/profile")
        .json(&json!({ "email": email }))
        .reply(&api)
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let existing: Value = serde_json::from_slice(second.body()).unwrap();
    assert_eq!(existing["id"], created["id"]);

    let fetched = warp::test::request()
        .method("GET")
        .path(&format!("/api/users/profile?email={}", email))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn admin_list_starts_with_newest() {
    let api = routes(&database_pool(), &offline_storage());
    let newest = format!("Newest {}", Uuid::new_v4());
    for title in [format!("Older {}", Uuid::new_v4()), newest.clone()] {
        let created = warp::test::request()
            .method("POST")
            .path("/api/admin/books")
            .header("authorization", AUTH)
            .json(&sample_book(&title))
            .reply(&api)
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
    }

    let listed = warp::test::request()
        .method("GET")
        .path("/api/admin/books")
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let books: Vec<Value> = serde_json::from_slice(listed.body()).unwrap();
    assert_eq!(books[0]["title"], json!(newest));

    let stats = warp::test::request()
        .method("GET")
        .path("/api/admin/stats")
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let stats: Value = serde_json::from_slice(stats.body()).unwrap();
    assert!(stats["totalBooks"].as_i64().unwrap_or_default() >= 2);
}

#[tokio::test]
#[ignore]
async fn deleting_a_book_drops_its_progress() {
    let api = routes(&database_pool(), &offline_storage());
    let user = format!("user-{}", Uuid::new_v4());

    let created = warp::test::request()
        .method("POST")
        .path("/api/admin/books")
        .header("authorization", AUTH)
        .json(&sample_book(&format!("Doomed {}", Uuid::new_v4())))
        .reply(&api)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let book: Value = serde_json::from_slice(created.body()).unwrap();
    let id = book["id"].as_str().unwrap().to_owned();

    let saved = warp::test::request()
        .method("POST")
        .path("/api/progress")
        .header("authorization", AUTH)
        .json(&json!({
            "bookId": id,
            "userId": user,
            "progress": 20,
            "currentTime": 90,
        }))
        .reply(&api)
        .await;
    assert_eq!(saved.status(), StatusCode::OK);

    let deleted = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/admin/books/{}", id))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(message_of(deleted.body()), "Book deleted successfully");

    let remaining = warp::test::request()
        .method("GET")
        .path(&format!("/api/progress?userId={}", user))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    let records: Vec<Value> = serde_json::from_slice(remaining.body()).unwrap();
    assert!(records.iter().all(|record| record["bookId"] != json!(id)));

    let again = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/admin/books/{}", id))
        .header("authorization", AUTH)
        .reply(&api)
        .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(again.body()), "Book not found");
}
