use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::classifier::Classification;

/// Base for canonical document links when the feed omits `html_url`
pub const DOCUMENT_LINK_BASE: &str = "https://www.federalregister.gov/d";

/// A regulatory notice as returned by the document feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub document_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Read a string field where JSON `null` means the same as an absent key
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Notice {
    /// Link to the published notice, falling back to the registry's short link
    pub fn source_url(&self) -> String {
        match &self.html_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}/{}", DOCUMENT_LINK_BASE, self.document_number),
        }
    }
}

/// A persisted finding. Field names match the ledger's header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Drug Name")]
    pub drug: String,
    #[serde(rename = "Sponsor")]
    pub sponsor: String,
    #[serde(rename = "Type")]
    pub filing_type: String,
    #[serde(rename = "Date Found")]
    pub date_found: NaiveDate,
    #[serde(rename = "Source URL")]
    pub source_url: String,
}

impl LedgerRecord {
    pub fn from_finding(notice: &Notice, classification: Classification, found: NaiveDate) -> Self {
        Self {
            id: notice.document_number.clone(),
            drug: classification.drug,
            sponsor: classification.sponsor,
            filing_type: classification.filing_type,
            date_found: found,
            source_url: notice.source_url(),
        }
    }
}

/// Outcome of a single run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub skipped: usize,
    pub classified: usize,
    pub findings: Vec<LedgerRecord>,
}

impl RunSummary {
    pub fn accepted(&self) -> usize {
        self.findings.len()
    }

    /// One-line outcome printed at the end of a run
    pub fn message(&self) -> String {
        if self.findings.is_empty() {
            "Agent Action: No new filings found today.".to_string()
        } else {
            format!(
                "Agent Action: Logged {} items and sent alert.",
                self.findings.len()
            )
        }
    }
}
