use gptcard_engine::{
    execute_query, CompletionClient, CompletionError, GptConfig, OpenAiCompletionClient,
    INLINE_ERROR_TEXT,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, config: GptConfig) -> OpenAiCompletionClient {
    OpenAiCompletionClient::new(GptConfig {
        api_base: Some(format!("{}/v1", server.uri())),
        ..config
    })
}

fn keyed() -> GptConfig {
    GptConfig {
        api_key: "sk-test".to_string(),
        ..GptConfig::default()
    }
}

#[tokio::test]
async fn posts_prompt_with_default_sampling_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-davinci-003",
            "prompt": "summarize this",
            "temperature": 0.0,
            "max_tokens": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "\n\nIt is short." }, { "text": "ignored" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, keyed());
    let text = client.complete("summarize this").await.expect("completion ok");
    assert_eq!(text, "\n\nIt is short.");
}

#[tokio::test]
async fn configured_sampling_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_partial_json(json!({ "max_tokens": 256, "model": "custom-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "ok" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GptConfig {
        max_tokens: Some(256),
        model: Some("custom-model".to_string()),
        ..keyed()
    };
    let client = client_for(&server, config);
    assert_eq!(client.complete("q").await.unwrap(), "ok");
}

#[tokio::test]
async fn fractional_temperature_is_sent_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_partial_json(json!({ "temperature": 0.7 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "warm" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GptConfig {
        temperature: Some(0.7),
        ..keyed()
    };
    let client = client_for(&server, config);
    assert_eq!(client.complete("q").await.unwrap(), "warm");
}

#[tokio::test]
async fn auth_failure_is_http_status_and_inline_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = client_for(&server, keyed());
    let err = client.complete("q").await.unwrap_err();
    assert_eq!(
        err,
        CompletionError::HttpStatus {
            status: 401,
            body: "bad key".to_string()
        }
    );
    assert_eq!(execute_query(&client, "q").await, INLINE_ERROR_TEXT);
}

#[tokio::test]
async fn malformed_and_empty_responses_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_partial_json(json!({ "prompt": "malformed" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_partial_json(json!({ "prompt": "empty" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server, keyed());
    assert!(matches!(
        client.complete("malformed").await,
        Err(CompletionError::MalformedResponse(_))
    ));
    assert_eq!(
        client.complete("empty").await,
        Err(CompletionError::EmptyResponse)
    );
}

#[tokio::test]
async fn missing_api_key_skips_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, GptConfig::default());
    assert_eq!(
        client.complete("q").await,
        Err(CompletionError::MissingApiKey)
    );
    assert_eq!(execute_query(&client, "q").await, INLINE_ERROR_TEXT);
}
