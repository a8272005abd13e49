// Chirp - An object-oriented client for the Twitter REST and Streaming APIs
// Copyright (C) 2025 Chirp Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! End to end over real HTTP against a mock server

use std::sync::Arc;

use chirp_core::{
    Api, ApiConfig, ApplicationCredentials, Error, FilterParams, Message, SharedCredentials,
    Stream, TokenCredentials,
};
use futures::StreamExt;
use mockito::{Matcher, Server, ServerGuard};

async fn create_server_and_api() -> (ServerGuard, Api) {
    let server = Server::new_async().await;
    let api = Api::new(ApiConfig::local(&server.host_with_port())).unwrap();
    (server, api)
}

#[tokio::test]
async fn test_three_stage_handshake() {
    let (mut server, api) = create_server_and_api().await;

    let request_token = server
        .mock("POST", "/oauth/request_token")
        .match_header(
            "authorization",
            Matcher::AllOf(vec![
                Matcher::Regex(r#"^OAuth "#.into()),
                Matcher::Regex(r#"oauth_callback="oob""#.into()),
                Matcher::Regex(r#"oauth_consumer_key="consumer""#.into()),
                Matcher::Regex(r#"oauth_signature_method="HMAC-SHA1""#.into()),
            ]),
        )
        .with_status(200)
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body("oauth_token=req-key&oauth_token_secret=req-secret&oauth_callback_confirmed=true")
        .create_async()
        .await;

    let access_token = server
        .mock("POST", "/oauth/access_token")
        .match_header(
            "authorization",
            Matcher::AllOf(vec![
                Matcher::Regex(r#"oauth_token="req-key""#.into()),
                Matcher::Regex(r#"oauth_verifier="4242""#.into()),
            ]),
        )
        .with_status(200)
        .with_body("oauth_token=acc-key&oauth_token_secret=acc-secret&user_id=12&screen_name=jack")
        .create_async()
        .await;

    let verify = server
        .mock("GET", "/1/account/verify_credentials.json")
        .match_header("authorization", Matcher::Regex(r#"oauth_token="acc-key""#.into()))
        .match_header("user-agent", Matcher::Regex("^chirp-core/".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":12,"id_str":"12","screen_name":"jack","name":"Jack"}"#)
        .create_async()
        .await;

    let application = ApplicationCredentials::with_api(api, "consumer", "secret").unwrap();

    let temporary = application.request(None).await.unwrap();
    assert!(temporary.callback_confirmed());
    assert_eq!(
        temporary.authorization_url(),
        format!(
            "http://{}/oauth/authorize?oauth_token=req-key",
            server.host_with_port()
        )
    );

    let token = temporary.confirm("4242").await.unwrap();
    assert_eq!(token.screen_name(), Some("jack"));
    assert_eq!(token.user_id(), Some("12"));

    let me = token.account().verify_credentials().await.unwrap();
    assert_eq!(me.id, 12);
    assert_eq!(me.name, "Jack");

    request_token.assert_async().await;
    access_token.assert_async().await;
    verify.assert_async().await;
}

#[tokio::test]
async fn test_sample_stream_over_http() {
    let (mut server, api) = create_server_and_api().await;

    let sample = server
        .mock("GET", "/1/statuses/sample.json")
        .match_header("authorization", Matcher::Regex(r#"oauth_token="acc-key""#.into()))
        .with_status(200)
        .with_body(concat!(
            "{\"id\":1,\"text\":\"first\",\"user\":{\"id\":12,\"screen_name\":\"jack\"}}\r\n",
            "\r\n",
            "{\"delete\":{\"status\":{\"id\":1,\"user_id\":12}}}\r\n",
            "{\"id\":2,\"text\":\"second\"}\r\n",
        ))
        .create_async()
        .await;

    let credentials: SharedCredentials = Arc::new(
        TokenCredentials::with_api(api, "consumer", "secret", "acc-key", "acc-secret").unwrap(),
    );
    let messages: Vec<Message> = Stream::sample(credentials)
        .open()
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(messages.len(), 3);
    match &messages[0] {
        Message::Status(status) => {
            assert_eq!(status.text, "first");
            assert_eq!(status.user().unwrap().screen_name, "jack");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(matches!(messages[1], Message::Delete { id: 1, user_id: Some(12) }));
    assert!(matches!(&messages[2], Message::Status(status) if status.id == 2));

    sample.assert_async().await;
}

#[tokio::test]
async fn test_filter_stream_over_http() {
    let (mut server, api) = create_server_and_api().await;

    let filter = server
        .mock("POST", "/1/statuses/filter.json")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("follow=12%2C13")
        .with_status(200)
        .with_body("{\"id\":3,\"text\":\"followed\"}\n")
        .create_async()
        .await;

    let credentials: SharedCredentials = Arc::new(
        TokenCredentials::with_api(api, "consumer", "secret", "acc-key", "acc-secret").unwrap(),
    );
    let mut messages = Stream::filter(credentials, FilterParams::follow([12, 13]))
        .open()
        .await
        .unwrap();

    assert!(matches!(messages.next().await, Some(Ok(Message::Status(_)))));
    assert!(messages.next().await.is_none());

    filter.assert_async().await;
}

#[tokio::test]
async fn test_rejected_signature() {
    let (mut server, api) = create_server_and_api().await;

    let _mock = server
        .mock("POST", "/oauth/request_token")
        .with_status(401)
        .with_body("Failed to validate oauth signature and token")
        .create_async()
        .await;

    let application = ApplicationCredentials::with_api(api, "consumer", "wrong").unwrap();
    match application.request(None).await {
        Err(Error::CredentialsRejected { body }) => {
            assert_eq!(body, "Failed to validate oauth signature and token")
        }
        other => panic!("unexpected: {:?}", other),
    }
}
