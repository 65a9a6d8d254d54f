//! Resume extraction via the parse-resume function.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::functions::{FunctionsClient, PARSE_RESUME};
use crate::models::resume::ParsedResume;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseResumeRequest<'a> {
    resume_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResumeResponse {
    success: Option<bool>,
    data: Option<ParsedResume>,
}

fn extracted_payload(response: ParseResumeResponse) -> anyhow::Result<ParsedResume> {
    if response.success == Some(false) {
        anyhow::bail!("{PARSE_RESUME} reported an unsuccessful extraction");
    }
    response
        .data
        .ok_or_else(|| anyhow::anyhow!("no parsed data received from {PARSE_RESUME}"))
}

/// Extraction collaborator: fetches the stored resume by URL and returns
/// its structured contents.
///
/// Carried as `Arc<dyn ResumeParser>` so the pipeline can run against an
/// in-memory parser in tests.
#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, resume_url: &str) -> anyhow::Result<ParsedResume>;
}

/// Production parser backed by the parse-resume function.
pub struct HttpResumeParser {
    functions: FunctionsClient,
}

impl HttpResumeParser {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }
}

#[async_trait]
impl ResumeParser for HttpResumeParser {
    async fn parse(&self, resume_url: &str) -> anyhow::Result<ParsedResume> {
        let response: ParseResumeResponse = self
            .functions
            .invoke(PARSE_RESUME, &ParseResumeRequest { resume_url })
            .await?;

        extracted_payload(response)
    }
}
