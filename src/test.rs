use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    error::ErrorVerbosity,
    server::{router, ServerConfig},
    state::ApiState,
    store::{Book, BookStore, NewBook},
};

#[tokio::test]
async fn example_config_is_valid() {
    ServerConfig::from_config_file("config.example.yaml")
        .await
        .expect("Example config is not parsable");
}

async fn test_state() -> ApiState {
    let store = BookStore::connect(":memory:")
        .await
        .expect("Failed to open in-memory store");

    ApiState::new(ErrorVerbosity::Full, store)
}

async fn test_router() -> (ApiState, Router) {
    let state = test_state().await;
    let app = router(state.clone());

    (state, app)
}

async fn seed(state: &ApiState, titles: &[&str]) {
    for title in titles {
        state
            .book_store()
            .insert(&NewBook {
                title: title.to_string(),
                rating: 4.0,
                price: 4000.0,
            })
            .await
            .expect("Failed to seed book");
    }
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn response_body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

#[tokio::test]
async fn create_book_returns_stored_book_with_generated_id() {
    let (_state, app) = test_router().await;

    let request = json_request(
        Method::POST,
        "/book",
        &json!({"title": "시험 1", "rating": 4.0, "price": 4000.0}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let book: Book = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(book.id, 1);
    assert_eq!(book.title, "시험 1");
    assert_eq!(book.rating, 4.0);
    assert_eq!(book.price, 4000.0);
}

#[tokio::test]
async fn list_books_returns_all_books_in_insertion_order() {
    let (state, app) = test_router().await;
    seed(&state, &["시험 1", "시험 2", "시험 3"]).await;

    let response = app.oneshot(empty_request(Method::GET, "/book")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let books: Vec<Book> = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(
        books.iter().map(|book| book.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(books[0].title, "시험 1");
}

#[tokio::test]
async fn get_book_returns_inserted_book() {
    let (state, app) = test_router().await;
    seed(&state, &["시험 1"]).await;

    let response = app
        .oneshot(empty_request(Method::GET, "/book/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let book: Book = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(book.id, 1);
    assert_eq!(book.title, "시험 1");
}

#[tokio::test]
async fn get_book_missing_id_is_not_found() {
    let (_state, app) = test_router().await;

    let response = app
        .oneshot(empty_request(Method::GET, "/book/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "NotFound");
    assert_eq!(body["message"], "Book not found");
}

#[tokio::test]
async fn update_book_replaces_fields_and_keeps_id() {
    let (state, app) = test_router().await;
    seed(&state, &["시험 1", "시험 2", "시험 3"]).await;

    let request = json_request(
        Method::PUT,
        "/book/1",
        &json!({"title": "시험입니다.", "rating": 4.0, "price": 5000.0}),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let book: Book = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(book.id, 1);
    assert_eq!(book.title, "시험입니다.");
    assert_eq!(book.price, 5000.0);

    let response = app
        .oneshot(empty_request(Method::GET, "/book/1"))
        .await
        .unwrap();
    let book: Book = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(book.title, "시험입니다.");
}

#[tokio::test]
async fn update_book_missing_id_is_not_found() {
    let (_state, app) = test_router().await;

    let request = json_request(
        Method::PUT,
        "/book/42",
        &json!({"title": "시험입니다.", "rating": 4.0, "price": 5000.0}),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "NotFound");
}

#[tokio::test]
async fn delete_book_acknowledges_and_removes_the_book() {
    let (state, app) = test_router().await;
    seed(&state, &["시험 1", "시험 2", "시험 3"]).await;

    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, "/book/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_body_json(response).await, json!({"data": "ok"}));

    let response = app.oneshot(empty_request(Method::GET, "/book")).await.unwrap();
    let books: Vec<Book> = serde_json::from_value(response_body_json(response).await).unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|book| book.id != 1));
}

#[tokio::test]
async fn delete_book_missing_id_is_still_acknowledged() {
    let (_state, app) = test_router().await;

    let response = app
        .oneshot(empty_request(Method::DELETE, "/book/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_body_json(response).await, json!({"data": "ok"}));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (_state, app) = test_router().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/book")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "Body");
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let (_state, app) = test_router().await;

    let response = app
        .oneshot(empty_request(Method::GET, "/book/abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "Path");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (_state, app) = test_router().await;

    let response = app
        .oneshot(empty_request(Method::GET, "/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "NotFound");
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let (_state, app) = test_router().await;

    let response = app
        .oneshot(empty_request(Method::PATCH, "/book"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = response_body_json(response).await;
    assert_eq!(body["error_type"], "MethodNotAllowed");
}
