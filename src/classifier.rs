use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::adapters::TextModel;
use crate::models::{null_as_empty, Notice};

/// A model's verdict on one notice
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Classification {
    pub is_relevant: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub drug: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sponsor: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub filing_type: String,
}

impl Classification {
    pub fn not_relevant() -> Self {
        Self {
            is_relevant: false,
            drug: String::new(),
            sponsor: String::new(),
            filing_type: String::new(),
        }
    }
}

/// Decides whether a notice is a drug filing and extracts its fields.
///
/// Implementations never fail: anything short of a clean verdict is
/// reported as not relevant.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, notice: &Notice) -> Classification;
}

/// Classifier backed by a generative text model
pub struct ModelClassifier<M: TextModel> {
    model: M,
}

impl<M: TextModel> ModelClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: TextModel> Classifier for ModelClassifier<M> {
    #[instrument(skip(self, notice), fields(document = %notice.document_number))]
    async fn classify(&self, notice: &Notice) -> Classification {
        let prompt = build_prompt(notice);

        let text = match self.model.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Classification request failed, treating as not relevant");
                return Classification::not_relevant();
            }
        };

        match parse_classification(&text) {
            Ok(verdict) => {
                debug!(relevant = verdict.is_relevant, "Classified notice");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "Unparseable model output, treating as not relevant");
                Classification::not_relevant()
            }
        }
    }
}

/// Instruction sent to the model for one notice
pub fn build_prompt(notice: &Notice) -> String {
    format!(
        r#"Identify if this is a new IND, NDA, or BLA drug filing/approval. Extract the Drug Name and Sponsor.
Return ONLY JSON: {{"is_relevant": bool, "drug": "str", "sponsor": "str", "type": "str"}}

Title: {}
Abstract: {}"#,
        notice.title,
        notice.summary.as_deref().unwrap_or("")
    )
}

/// Remove markdown code-fence markers around a JSON payload
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a model response into a verdict
pub fn parse_classification(text: &str) -> serde_json::Result<Classification> {
    serde_json::from_str(&strip_code_fences(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ModelError;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or(ModelError::EmptyResponse { provider: "scripted" })
        }
    }

    fn notice() -> Notice {
        Notice {
            document_number: "2026-100".to_string(),
            title: "Approval of Xalkor NDA".to_string(),
            summary: Some("Acme Pharma received approval.".to_string()),
            html_url: None,
        }
    }

    #[test]
    fn test_strip_code_fences() {
        let text = "```json\n{\"is_relevant\": true}\n```";
        assert_eq!(strip_code_fences(text), "{\"is_relevant\": true}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_parse_fenced_classification() {
        let text = r#"```json
{"is_relevant": true, "drug": "Xalkor", "sponsor": "Acme", "type": "NDA"}
```"#;
        let verdict = parse_classification(text).unwrap();
        assert!(verdict.is_relevant);
        assert_eq!(verdict.drug, "Xalkor");
        assert_eq!(verdict.sponsor, "Acme");
        assert_eq!(verdict.filing_type, "NDA");
    }

    #[test]
    fn test_parse_null_fields_as_empty() {
        let verdict = parse_classification(
            r#"{"is_relevant": true, "drug": "Xalkor", "sponsor": null, "type": null}"#,
        )
        .unwrap();
        assert!(verdict.is_relevant);
        assert_eq!(verdict.drug, "Xalkor");
        assert_eq!(verdict.sponsor, "");
        assert_eq!(verdict.filing_type, "");

        let missing =
            parse_classification(r#"{"is_relevant": true, "drug": "Xalkor"}"#).unwrap();
        assert_eq!(verdict, missing);
    }

    #[test]
    fn test_parse_rejects_prose_and_missing_flag() {
        assert!(parse_classification("This notice is about a drug approval.").is_err());
        assert!(parse_classification(r#"{"drug": "Xalkor"}"#).is_err());
        assert!(parse_classification(r#"{"is_relevant": "yes"}"#).is_err());
    }

    #[test]
    fn test_prompt_includes_title_and_abstract() {
        let prompt = build_prompt(&notice());
        assert!(prompt.contains("Title: Approval of Xalkor NDA"));
        assert!(prompt.contains("Abstract: Acme Pharma received approval."));
        assert!(prompt.contains("\"is_relevant\": bool"));
    }

    #[tokio::test]
    async fn test_classify_relevant() {
        let classifier = ModelClassifier::new(ScriptedModel::replying(
            r#"{"is_relevant": true, "drug": "Xalkor", "sponsor": "Acme", "type": "NDA"}"#,
        ));

        let verdict = classifier.classify(&notice()).await;
        assert!(verdict.is_relevant);
        assert_eq!(verdict.drug, "Xalkor");
        assert_eq!(classifier.model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_classify_model_error_fails_closed() {
        let classifier = ModelClassifier::new(ScriptedModel::failing());
        assert_eq!(
            classifier.classify(&notice()).await,
            Classification::not_relevant()
        );
    }

    #[tokio::test]
    async fn test_classify_non_json_fails_closed() {
        let classifier = ModelClassifier::new(ScriptedModel::replying("I cannot tell."));
        assert!(!classifier.classify(&notice()).await.is_relevant);
    }
}
