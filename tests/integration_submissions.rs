#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, unreachable_pub)]
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

mod common;

use common::{FakeTelegram, TEST_CHAT_ID, TestApp, strip_part_label};

/// Nine thousand chars of transcript with line breaks at the given offsets.
fn transcript(len: usize, newlines: &[usize]) -> String {
    (0..len).map(|i| if newlines.contains(&i) { '\n' } else { 'w' }).collect()
}

#[tokio::test]
async fn test_short_submission_is_sent_as_one_message() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;
    let message = "Reading: 35/40\nListening: 31/40\n".repeat(2);
    let message = &message[..50];

    let resp = app
        .submit(json!({
            "message": message,
            "studentName": "Aruzhan",
            "teacherName": "Ms. Patel",
            "groupName": "IELTS-7"
        }))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Test submitted and sent to Telegram successfully");
    assert_eq!(body["details"]["studentName"], "Aruzhan");
    assert_eq!(body["details"]["teacherName"], "Ms. Patel");
    assert_eq!(body["details"]["groupName"], "IELTS-7");
    assert_eq!(body["details"]["messageParts"], 1);
    assert_eq!(body["details"]["results"], json!([{"part": 1, "success": true}]));
    assert!(body["details"]["timestamp"].is_string());

    let received = telegram.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["text"], message);
    assert_eq!(received[0]["chat_id"], TEST_CHAT_ID);
    assert_eq!(received[0]["parse_mode"], "HTML");
    assert_eq!(received[0]["disable_web_page_preview"], true);
}

#[tokio::test]
async fn test_missing_message_is_rejected() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app.submit(json!({"studentName": "Aruzhan"})).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "error": "Message is required"}));
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app.submit(json!({"message": ""})).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_long_transcript_is_split_and_reassembles() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;
    let message = transcript(9000, &[3800, 7900]);

    let resp = app.submit(json!({"message": message, "studentName": "Timur"})).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["details"]["messageParts"], 3);

    let texts = telegram.received_texts();
    assert_eq!(texts.len(), 3);
    for (i, text) in texts.iter().enumerate() {
        assert!(text.ends_with(&format!("(Part {}/3)", i + 1)));
        assert!(text.encode_utf16().count() <= 4096);
    }

    let parts: Vec<&str> = texts.iter().map(|t| strip_part_label(t)).collect();
    assert_eq!(parts[0].len(), 3800);
    assert!(parts[1].starts_with('\n'));
    assert_eq!(parts.concat(), message);
}

#[tokio::test]
async fn test_options_request_skips_pipeline() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app.client.request(Method::OPTIONS, app.submit_url()).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.bytes().await.unwrap().is_empty());
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_cors_preflight() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app
        .client
        .request(Method::OPTIONS, app.submit_url())
        .header("Origin", "https://forms.example.edu")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let methods = resp.headers()["access-control-allow-methods"].to_str().unwrap().to_string();
    assert!(methods.contains("POST"));
    assert!(resp.bytes().await.unwrap().is_empty());
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_post_response_carries_cors_and_request_id_headers() {
    let (_telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app
        .client
        .post(app.submit_url())
        .header("Origin", "https://forms.example.edu")
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let resp = app.client.request(method, app.submit_url()).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"success": false, "error": "Method not allowed"}));
    }
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_failed_part_does_not_stop_the_rest() {
    let (telegram, telegram_url) = FakeTelegram::spawn_failing_on(&[2]).await;
    let app = TestApp::spawn(&telegram_url).await;
    let message = transcript(9000, &[]);

    let resp = app.submit(json!({"message": message, "studentName": "Timur", "teacherName": "Mr. Cole"})).await;

    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Some parts failed to send");
    assert_eq!(body["details"]["studentName"], "Timur");
    assert_eq!(body["details"]["teacherName"], "Mr. Cole");

    let results = body["details"]["results"].as_array().unwrap();
    let flags: Vec<bool> = results.iter().map(|r| r["success"].as_bool().unwrap()).collect();
    assert_eq!(flags, vec![true, false, true]);
    assert_eq!(results[1]["part"], 2);
    assert_eq!(results[1]["error"], "Telegram API error: Bad Request: can't parse entities");
    assert!(results[0].get("error").is_none());

    assert_eq!(telegram.received().len(), 3);
}

#[tokio::test]
async fn test_placeholder_credentials_fail_at_telegram() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let mut config = common::get_test_config(&telegram_url);
    config.telegram.bot_token = "YOUR_BOT_TOKEN_HERE".to_string();
    let app = TestApp::spawn_with_config(config).await;

    let resp = app.submit(json!({"message": "Speaking: 6.5"})).await;

    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["details"]["results"][0]["error"], "Telegram API error: Unauthorized");
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_unbuildable_client_is_a_soft_failure() {
    let mut config = common::get_test_config("http://127.0.0.1:1");
    config.telegram.api_url = "not a url".to_string();
    let app = TestApp::spawn_with_config(config).await;

    let resp = app.submit(json!({"message": "Writing task 1"})).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["fallback"], true);
    assert_eq!(
        body["note"],
        "Test was submitted locally but failed to send to Telegram. Please check bot configuration."
    );
    assert!(body["error"].as_str().unwrap().contains("invalid Telegram API URL"));
}

#[tokio::test]
async fn test_strict_failure_status_exposes_bad_gateway() {
    let mut config = common::get_test_config("http://127.0.0.1:1");
    config.telegram.api_url = "not a url".to_string();
    config.delivery.strict_failure_status = true;
    let app = TestApp::spawn_with_config(config).await;

    let resp = app.submit(json!({"message": "Writing task 1"})).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fallback"], true);
}

#[tokio::test]
async fn test_malformed_body_is_a_soft_failure() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app
        .client
        .post(app.submit_url())
        .header("Content-Type", "application/json")
        .body("{\"message\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["fallback"], true);
    assert!(telegram.received().is_empty());
}

#[tokio::test]
async fn test_unreachable_telegram_reports_every_part() {
    // Nothing listens on port 1, so every send fails at the transport.
    let app = TestApp::spawn("http://127.0.0.1:1").await;

    let resp = app.submit(json!({"message": transcript(4500, &[])})).await;

    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body: Value = resp.json().await.unwrap();
    let results = body["details"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["success"] == false));
    assert!(results.iter().all(|r| r["error"].as_str().unwrap().starts_with("Transport error")));
}

#[tokio::test]
async fn test_labels_can_be_turned_off() {
    let (telegram, telegram_url) = FakeTelegram::spawn().await;
    let mut config = common::get_test_config(&telegram_url);
    config.delivery.part_labels = false;
    config.telegram.parse_mode = transcript_relay::config::ParseMode::Plain;
    let app = TestApp::spawn_with_config(config).await;
    let message = transcript(4500, &[]);

    let resp = app.submit(json!({"message": message})).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let received = telegram.received();
    assert!(received.iter().all(|r| r.get("parse_mode").is_none()));
    assert_eq!(telegram.received_texts().concat(), message);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (_telegram, telegram_url) = FakeTelegram::spawn().await;
    let app = TestApp::spawn(&telegram_url).await;

    let resp = app.client.post(format!("{}/api/whatsapp", app.server_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
