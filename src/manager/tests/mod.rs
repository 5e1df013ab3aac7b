
use super::test_helpers::{create_test_fetcher, create_test_fetcher_with_limits, wait_for_event};
use crate::error::Error;
use crate::types::{Event, FileFailure, TaskStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a 200 response with the given body under `route`.
async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
