use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EmailConfig;
use crate::models::LedgerRecord;

/// Delivers the digest of a run's findings
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one digest. Callers must not pass an empty slice.
    async fn notify(&self, records: &[LedgerRecord], date: NaiveDate) -> Result<()>;
}

/// Subject and HTML body of a digest email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
}

/// Compose the digest for a run's findings
pub fn build_digest(records: &[LedgerRecord], date: NaiveDate) -> Digest {
    let subject = format!(
        "🚨 {} New FDA Filings: {}",
        records.len(),
        date.format("%Y-%m-%d")
    );

    let items: String = records
        .iter()
        .map(|r| {
            format!(
                "<li><b>{}</b> ({}) by {}<br><a href='{}'>View Official Notice</a></li><br>",
                escape_html(&r.drug),
                escape_html(&r.filing_type),
                escape_html(&r.sponsor),
                escape_html(&r.source_url)
            )
        })
        .collect();

    Digest {
        subject,
        html: format!("<h2>Today's Drug Intelligence Report</h2><ul>{}</ul>", items),
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Email notifier using the Resend HTTP API
pub struct ResendNotifier {
    client: Client,
    api_key: String,
    base_url: String,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

impl ResendNotifier {
    pub fn new(config: &EmailConfig, api_key: String, recipient: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            from: config.from.clone(),
            to: recipient,
        }
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(&self, records: &[LedgerRecord], date: NaiveDate) -> Result<()> {
        let digest = build_digest(records, date);

        debug!(subject = %digest.subject, "Sending digest email");

        let request = EmailRequest {
            from: &self.from,
            to: vec![self.to.as_str()],
            subject: &digest.subject,
            html: &digest.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send digest email")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Digest email rejected");
            anyhow::bail!("Email API returned error: {} - {}", status, body);
        }

        info!(count = records.len(), "Digest email sent");
        Ok(())
    }
}
