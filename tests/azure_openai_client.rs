use tfplan_report::report::{self, ReportConfig};
use tfplan_report::summarizers::azure_openai::{AzureOpenAiSummarizer, ChatMessage};
use tfplan_report::{AzureOpenAiClient, AzureOpenAiError};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/openai/deployments/gpt-4o/chat/completions";

fn client(base_url: String) -> AzureOpenAiClient {
    AzureOpenAiClient::new(base_url, "test_key".to_string(), "gpt-4o".to_string()).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "finish_reason": "stop",
                "message": { "role": "assistant", "content": content }
            }
        ]
    })
}

#[tokio::test]
async fn test_chat_completion_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(query_param("api-version", "2024-02-15-preview"))
        .and(header("api-key", "test_key"))
        .and(body_partial_json(serde_json::json!({
            "temperature": 0.0,
            "messages": [{ "role": "system", "content": "rules" }, { "role": "user", "content": "plan" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("<tr><td>x</td></tr>")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let messages = vec![ChatMessage::system("rules"), ChatMessage::user("plan")];
    let content = client(mock_server.uri())
        .chat_completion(&messages)
        .await
        .unwrap();

    assert_eq!(content, "<tr><td>x</td></tr>");
}

#[tokio::test]
async fn test_chat_completion_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {
                "code": "401",
                "message": "Access denied due to invalid subscription key or wrong API endpoint."
            }
        })))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .chat_completion(&[ChatMessage::user("plan")])
        .await;

    match result {
        Err(AzureOpenAiError::Auth { message }) => {
            assert!(message.contains("Access denied"));
            assert!(!message.contains("test_key"));
        }
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_completion_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .chat_completion(&[ChatMessage::user("plan")])
        .await;

    match result {
        Err(AzureOpenAiError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_completion_missing_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-123",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .chat_completion(&[ChatMessage::user("plan")])
        .await;

    assert!(matches!(
        result,
        Err(AzureOpenAiError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_chat_completion_non_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri())
        .chat_completion(&[ChatMessage::user("plan")])
        .await;

    assert!(matches!(
        result,
        Err(AzureOpenAiError::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_text_plan_rows_flow_through_dedup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "<tr><td>network</td><td>aat</td><td>uksouth</td><td>a</td><td>delete</td><td>No</td><td>from text</td></tr>\n\
             <tr><td>network</td><td>aat</td><td>uksouth</td><td>vnet</td><td>update</td><td>Yes</td><td>tags updated</td></tr>",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let plans = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(
        plans.path().join("tfplan-aat-network.json"),
        r#"{"resource_changes": [{"address": "azurerm_subnet.a", "change": {"actions": ["create"], "after": {"name": "a"}}}]}"#,
    )
    .unwrap();
    std::fs::write(
        plans.path().join("tfplan-aat-network.txt"),
        "Terraform will perform the following actions:\n\n  # azurerm_subnet.a will be destroyed\n",
    )
    .unwrap();

    let summarizer = AzureOpenAiSummarizer::with_client(client(mock_server.uri()));
    let config = ReportConfig::new(plans.path(), out.path());
    let outcome = report::generate_report(&config, Some(&summarizer))
        .await
        .unwrap();

    let names: Vec<(&str, &str)> = outcome
        .rows
        .iter()
        .map(|r| (r.resource_name.as_str(), r.change_type.as_str()))
        .collect();
    assert_eq!(names, vec![("a", "create"), ("vnet", "update")]);
    assert_eq!(outcome.stats.text_chunks, 1);
}
