//! Full-endpoint tests: both protocols on one port, the shared chain, and
//! graceful shutdown.

use std::time::Duration;

use serde_json::{json, Value};
use tonic::Code;

use ms_project::lifecycle::EndpointState;
use ms_project::proto::movie::movie_service_client::MovieServiceClient;
use ms_project::proto::movie::{CreateMovieRequest, GetMovieRequest, ListMoviesRequest, Movie};
use ms_project::proto::testing::test_service_client::TestServiceClient;
use ms_project::proto::testing::PingRequest;
use ms_project::security::Role;

mod common;

fn movie(name: &str) -> Movie {
    Movie {
        name: name.into(),
        summary: "A linguist is recruited to talk to visitors.".into(),
        director: "Denis Villeneuve".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn both_protocols_share_one_port() {
    let endpoint = common::start(common::config(100)).await;

    let mut rpc = TestServiceClient::connect(endpoint.url()).await.unwrap();
    let reply = rpc
        .ping(PingRequest {
            value: "over-rpc".into(),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(reply.value, "over-rpc");

    let res = reqwest::Client::new()
        .post(format!("{}/v1/ping", endpoint.url()))
        .json(&json!({ "value": "over-http" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(res.version(), reqwest::Version::HTTP_11);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["value"], "over-http");

    endpoint.stop().await;
}

#[tokio::test]
async fn guests_can_read_the_catalog() {
    let endpoint = common::start(common::config(100)).await;
    let admin = endpoint.credential(common::ADMIN, Role::Admin);
    let mut client = MovieServiceClient::connect(endpoint.url()).await.unwrap();

    let created = client
        .create_movie(common::authorized(
            CreateMovieRequest {
                movie: Some(movie("Arrival")),
            },
            &admin,
        ))
        .await
        .unwrap()
        .into_inner();

    let fetched = client
        .get_movie(GetMovieRequest { id: created.id.clone() })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(fetched.name, "Arrival");

    let listed = client
        .list_movies(ListMoviesRequest::default())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(listed.movies.len(), 1);
    assert!(listed.next_page_token.is_empty());

    endpoint.stop().await;
}

#[tokio::test]
async fn authorization_runs_before_rate_limiting() {
    let endpoint = common::start(common::config(2)).await;
    let admin = endpoint.credential(common::ADMIN, Role::Admin);
    let normal = endpoint.credential("nora", Role::Normal);
    let mut client = MovieServiceClient::connect(endpoint.url()).await.unwrap();

    let create = |credential: Option<&str>| {
        let message = CreateMovieRequest {
            movie: Some(movie("Dune")),
        };
        match credential {
            Some(credential) => common::authorized(message, credential),
            None => tonic::Request::new(message),
        }
    };

    let err = client.create_movie(create(None)).await.unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);

    for _ in 0..3 {
        let err = client.create_movie(create(Some(&normal))).await.unwrap_err();
        assert_eq!(err.code(), Code::PermissionDenied);
    }

    // rejected calls above spent no quota
    client.create_movie(create(Some(&admin))).await.unwrap();
    client.create_movie(create(Some(&admin))).await.unwrap();
    let err = client.create_movie(create(Some(&admin))).await.unwrap_err();
    assert_eq!(err.code(), Code::ResourceExhausted);
    assert!(err.message().contains("CreateMovie"));

    endpoint.stop().await;
}

#[tokio::test]
async fn login_over_rpc_and_http_issue_usable_tokens() {
    let endpoint = common::start(common::config(100)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/v1/auth/login", endpoint.url()))
        .json(&json!({ "username": common::ADMIN, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();

    let mut client = MovieServiceClient::connect(endpoint.url()).await.unwrap();
    client
        .create_movie(common::authorized(
            CreateMovieRequest {
                movie: Some(movie("Sicario")),
            },
            &format!("Basic {token}"),
        ))
        .await
        .unwrap();

    endpoint.stop().await;
}

#[tokio::test]
async fn shutdown_lets_an_inflight_stream_finish() {
    let endpoint = common::start(common::config(100)).await;
    let mut client = TestServiceClient::connect(endpoint.url()).await.unwrap();

    let mut stream = client
        .ping_list(PingRequest {
            value: "drain".into(),
            count: 5,
            delay_ms: 100,
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();

    let first = stream.message().await.unwrap().unwrap();
    assert_eq!(first.value, "drain");

    let handle = endpoint.handle.clone();
    let stopping = tokio::spawn(async move { handle.shutdown().await });

    let mut received = 1;
    while let Some(reply) = stream.message().await.unwrap() {
        assert_eq!(reply.value, "drain");
        received += 1;
    }
    assert_eq!(received, 5);

    stopping.await.unwrap();
    assert_eq!(endpoint.handle.state(), EndpointState::Stopped);

    // a second request is a no-op
    tokio::time::timeout(Duration::from_secs(1), endpoint.handle.shutdown())
        .await
        .unwrap();
    endpoint.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn new_connections_are_refused_after_shutdown() {
    let endpoint = common::start(common::config(100)).await;
    let addr = endpoint.addr;
    endpoint.stop().await;

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/v1/ping"))
        .json(&json!({ "value": "late" }))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(res.is_err());
}
