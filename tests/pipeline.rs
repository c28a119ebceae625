use chrono::NaiveDate;
use filing_watch::config::{EmailConfig, FeedConfig};
use filing_watch::{
    CsvLedger, FederalRegisterClient, GeminiAdapter, Ledger, ModelClassifier, Orchestrator,
    ResendNotifier,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    }))
}

#[tokio::test]
async fn test_daily_run_end_to_end() {
    let server = MockServer::start().await;
    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/documents.json"))
        .and(query_param("conditions[publication_date][is]", "2026-10-18"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"document_number": "2026-500", "title": "Already seen notice"},
                {"document_number": "2026-501", "title": "Approval of NDA for Xalkor", "abstract": "Acme filed."},
                {"document_number": "2026-502", "title": "Meeting of advisory committee", "html_url": "https://fr.example/502"}
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(body_string_contains("Approval of NDA for Xalkor"))
        .respond_with(gemini_reply(
            "```json\n{\"is_relevant\": true, \"drug\": \"Xalkor\", \"sponsor\": \"Acme\", \"type\": \"NDA\"}\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(body_string_contains("Meeting of advisory committee"))
        .respond_with(gemini_reply("{\"is_relevant\": false}"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({
            "to": ["me@example.com"],
            "subject": "🚨 1 New FDA Filings: 2026-10-18"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("drug_approvals.csv");
    std::fs::write(
        &ledger_path,
        "ID,Drug Name,Sponsor,Type,Date Found,Source URL\n2026-500,Old,Prior Co,BLA,2026-10-01,https://fr.example/500\n",
    )
    .unwrap();

    let orchestrator = Orchestrator::new(
        FederalRegisterClient::new(&FeedConfig {
            base_url: server.uri(),
            ..Default::default()
        }),
        ModelClassifier::new(GeminiAdapter::new("test-key".to_string()).with_base_url(&server.uri())),
        CsvLedger::new(&ledger_path),
        ResendNotifier::new(
            &EmailConfig {
                base_url: server.uri(),
                ..Default::default()
            },
            "re_test".to_string(),
            "me@example.com".to_string(),
        ),
    );

    let first = orchestrator.run(today).await.unwrap();
    assert_eq!(first.fetched, 3);
    assert_eq!(first.skipped, 1);
    assert_eq!(first.classified, 2);
    assert_eq!(first.message(), "Agent Action: Logged 1 items and sent alert.");

    let stored = orchestrator.ledger().records().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].id, "2026-501");
    assert_eq!(stored[1].drug, "Xalkor");
    assert_eq!(stored[1].source_url, "https://www.federalregister.gov/d/2026-501");

    // Same feed again: only the irrelevant notice is unknown, so it is asked about again
    let second = orchestrator.run(today).await.unwrap();
    assert_eq!(second.skipped, 2);
    assert_eq!(second.classified, 1);
    assert_eq!(second.message(), "Agent Action: No new filings found today.");
}

#[tokio::test]
async fn test_feed_outage_is_a_quiet_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        FederalRegisterClient::new(&FeedConfig {
            base_url: server.uri(),
            ..Default::default()
        }),
        ModelClassifier::new(GeminiAdapter::new("test-key".to_string()).with_base_url(&server.uri())),
        CsvLedger::new(dir.path().join("drug_approvals.csv")),
        ResendNotifier::new(
            &EmailConfig {
                base_url: server.uri(),
                ..Default::default()
            },
            "re_test".to_string(),
            "me@example.com".to_string(),
        ),
    );

    let summary = orchestrator
        .run(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.accepted(), 0);
    assert!(dir.path().join("drug_approvals.csv").exists());
}
