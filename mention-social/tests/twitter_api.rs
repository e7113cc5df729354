use mention_http::HttpError;
use mention_social::twitter::{RateLimitStatus, TwitterApi, TwitterTransport};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn budget(limit: u32, remaining: u32, reset: i64) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("x-rate-limit-limit", limit.to_string().as_str())
        .insert_header("x-rate-limit-remaining", remaining.to_string().as_str())
        .insert_header("x-rate-limit-reset", reset.to_string().as_str())
}

async fn api(server: &MockServer) -> TwitterApi {
    TwitterApi::with_base_url(&server.uri(), "test-token".into()).expect("client")
}

#[tokio::test]
async fn rate_limit_status_reads_lookup_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/application/rate_limit_status.json"))
        .and(query_param("resources", "users"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(budget(10, 15, 1_700_000_900).set_body_json(json!({
            "resources": {
                "users": {
                    "/users/lookup": { "limit": 180, "remaining": 180, "reset": 1_700_000_900i64 }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let got = api(&server).await.rate_limit_status(&["users"]).await.unwrap();
    let lookup = got.results.resources.users["/users/lookup"];
    assert_eq!(lookup, RateLimitStatus::new(180, 180, 1_700_000_900));
    // The probe's own headers describe a different bucket.
    assert_eq!(got.rate_limit, Some(RateLimitStatus::new(10, 15, 1_700_000_900)));
}

#[tokio::test]
async fn followers_ids_passes_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/followers/ids.json"))
        .and(query_param("user_id", "42"))
        .and(query_param("cursor", "-1"))
        .and(query_param("count", "5000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": [1, 2, 3],
            "next_cursor": 77,
            "next_cursor_str": "77",
            "previous_cursor": 0,
            "previous_cursor_str": "0"
        })))
        .mount(&server)
        .await;

    let page = api(&server).await.followers_ids("42", -1).await.unwrap();
    assert_eq!(page.results.ids, vec![1, 2, 3]);
    assert_eq!(page.results.next_cursor, 77);
    assert!(!page.results.is_last_page());
    assert_eq!(page.rate_limit, None);
}

#[tokio::test]
async fn users_lookup_joins_ids_and_attaches_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/lookup.json"))
        .and(query_param("user_id", "100,200"))
        .and(query_param("include_entities", "false"))
        .respond_with(budget(900, 899, 1_700_000_000).set_body_json(json!([
            {
                "id": 100,
                "screen_name": "alice",
                "status": { "id": 1, "created_at": "Wed Aug 27 13:08:45 +0000 2008", "text": "foo" }
            },
            { "id": 200, "screen_name": "bob" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let got = api(&server).await.users_lookup(&[100, 200]).await.unwrap();
    assert_eq!(got.results.len(), 2);
    assert_eq!(got.results[0].status.as_ref().unwrap().text, "foo");
    assert_eq!(got.rate_limit, Some(RateLimitStatus::new(900, 899, 1_700_000_000)));
}

#[tokio::test]
async fn api_errors_surface_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/lookup.json"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "errors": [{ "message": "Rate limit exceeded", "code": 88 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = api(&server).await.users_lookup(&[1]).await.unwrap_err();
    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 429);
            assert!(message.contains("Rate limit exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
