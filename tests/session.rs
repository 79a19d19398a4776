// Session-loop scenario tests against a mock food backend. The blocking
// client runs under `spawn_blocking` so it can talk to the wiremock
// server owned by the async test runtime.

use foodlog_cli::{api::ApiClient, session::run_session};
use serde_json::{json, Value};
use std::io::Cursor;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Drive a full session with `input` piped in; returns captured stdout.
async fn run_session_against(server: &MockServer, input: &str) -> String {
    let base = server.uri();
    let input = input.to_string();
    tokio::task::spawn_blocking(move || {
        let api = ApiClient::new(base).unwrap();
        let mut output = Vec::new();
        run_session(&api, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    })
    .await
    .unwrap()
}

fn catalog_json() -> Value {
    json!([
        {"name": "Tofu", "calories": 80, "dietary_preferances": ["vegan"]},
        {"name": "Steak", "calories": 300, "dietary_preferances": ["carnivore"]}
    ])
}

async fn mount_catalog(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/food"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_vegan_foods_prints_only_matching_names() {
    let server = MockServer::start().await;
    mount_catalog(&server, 1).await;

    let output = run_session_against(&server, "list vegan foods\n").await;

    assert_eq!(output, "enter command > Tofu\nenter command > ");
}

#[tokio::test]
async fn catalog_is_fetched_fresh_for_every_command() {
    let server = MockServer::start().await;
    mount_catalog(&server, 2).await;

    let output =
        run_session_against(&server, "list vegan foods\nlist vegan foods\n").await;

    assert_eq!(
        output,
        "enter command > Tofu\nenter command > Tofu\nenter command > "
    );
}

#[tokio::test]
async fn logging_a_serving_replaces_the_full_user_record() {
    let server = MockServer::start().await;
    mount_catalog(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Sam",
            "log": [
                {"1650000000000": {"food": "Rice", "servingSize": 1.0, "calories": 200.0}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_session_against(&server, "log\nTofu\n2\n").await;

    assert_eq!(
        output,
        "enter command > What do you like to log today? \
         Tofu has 80 calories\n\
         How many servings did you eat? (as a decimal: 1, 0.5, 1.25 etc...) ->>> \
         Tofu with a serving size of 2 has a 160 calories\n\
         enter command > "
    );

    // requests happen in workflow order
    let requests = server.received_requests().await.unwrap();
    let paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, vec!["/food", "/users/1", "/users/1"]);

    // the PUT carries the whole record: prior log entries and fields
    // this tool does not model survive, plus exactly one new entry
    let put = requests
        .iter()
        .find(|r| r.url.path() == "/users/1" && !r.body.is_empty())
        .expect("no PUT body captured");
    let body: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["name"], "Sam");
    assert_eq!(body["id"], 1);

    let log = body["log"].as_array().expect("log is not an array");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0]["1650000000000"]["food"], "Rice");

    let appended = log[1].as_object().unwrap();
    assert_eq!(appended.len(), 1);
    let (key, entry) = appended.iter().next().unwrap();
    assert!(key.parse::<i64>().is_ok(), "key is not a timestamp: {key}");
    assert_eq!(entry["food"], "Tofu");
    assert_eq!(entry["servingSize"], 2.0);
    assert_eq!(entry["calories"], 160.0);
}

#[tokio::test]
async fn cancelling_at_the_serving_prompt_touches_no_user_record() {
    let server = MockServer::start().await;
    mount_catalog(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_session_against(&server, "log\nTofu\nn\nlog\nTofu\nnevermind\n").await;

    // both cancel tokens end the flow with no output beyond the prompts
    assert_eq!(
        output,
        "enter command > What do you like to log today? \
         Tofu has 80 calories\n\
         How many servings did you eat? (as a decimal: 1, 0.5, 1.25 etc...) ->>> \
         enter command > What do you like to log today? \
         Tofu has 80 calories\n\
         How many servings did you eat? (as a decimal: 1, 0.5, 1.25 etc...) ->>> \
         enter command > "
    );
}

#[tokio::test]
async fn non_numeric_serving_size_is_reported_and_not_persisted() {
    let server = MockServer::start().await;
    mount_catalog(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_session_against(&server, "log\nTofu\ntwo\n").await;

    assert!(
        output.contains("error: \"two\" is not a decimal serving size"),
        "got: {output}"
    );
}

#[tokio::test]
async fn unknown_food_name_ends_the_workflow_silently() {
    let server = MockServer::start().await;
    mount_catalog(&server, 1).await;

    let output = run_session_against(&server, "log\nPizza\n").await;

    assert_eq!(
        output,
        "enter command > What do you like to log today? enter command > "
    );
}

#[tokio::test]
async fn backend_failure_is_reported_and_the_session_survives() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/food"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_session_against(&server, "list vegan foods\n").await;

    assert!(output.contains("error:"), "got: {output}");
    assert!(output.ends_with("enter command > "), "got: {output}");
}
