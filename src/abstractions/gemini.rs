//! Gemini-backed agent invoker
//!
//! Sends one `generateContent` request per agent invocation. The prompt is a
//! thin wrapper around the deal JSON and the agent's command; all analysis is
//! performed by the model.

use super::agent::{AgentDescriptor, AgentInvoker, AgentMode, AgentResult, GroundingSource};
use super::metrics::parse_metrics_from_text;
use crate::config::GeminiConfig;
use crate::deal::DealContext;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "\
You are an M&A copilot for structuring SBA-compliant acquisitions under SOP 50 10 8.

Help buyers of small and micro-businesses build compliant, financeable acquisition structures. \
Each request comes from one specialised assistant in a multi-step analysis pipeline; answer as \
that assistant.

Guardrails:
- Always ensure a minimum 10% equity injection.
- Seller notes count for at most 50% of required equity, and only on full-life standby.
- Rollover equity does not count toward the 10% equity requirement.
- Output sources & uses, DSCR estimates and a required-documents checklist when applicable.
- Format every answer as a readable Markdown report.";

const THINKING_BUDGET: u32 = 32_768;
const INVALID_KEY_MESSAGE: &str =
    "The configured API key is invalid. Please check your API key and try again.";

/// Agent whose reports carry a key-metrics block
const CAPITAL_STACK_AGENT: &str = "capital_stack_builder";

pub struct GeminiAgentInvoker {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiAgentInvoker {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn model_for(&self, agent: &AgentDescriptor) -> &str {
        match agent.mode {
            AgentMode::Thinking => &self.config.thinking_model,
            AgentMode::Default | AgentMode::Search => &self.config.default_model,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl AgentInvoker for GeminiAgentInvoker {
    async fn invoke(
        &self,
        agent: &AgentDescriptor,
        context: &DealContext,
        input: &str,
    ) -> Result<AgentResult> {
        let api_key = self
            .config
            .usable_api_key()
            .ok_or_else(|| anyhow!("API key is not set. Set DEALFLOW_API_KEY or gemini.api_key."))?;

        let prompt = build_prompt(agent, context, input)?;
        let body = build_request(agent, &prompt);
        let model = self.model_for(agent);
        debug!("Invoking agent '{}' with model {}", agent.id, model);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to get a response from the AI service")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Agent '{}' request failed with {}", agent.id, status);
            if text.contains("API key not valid") {
                return Err(anyhow!(INVALID_KEY_MESSAGE));
            }
            return Err(anyhow!(
                "AI service returned {}: {}",
                status,
                truncate(&text, 300)
            ));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to decode AI service response")?;
        into_agent_result(agent, payload)
    }
}

/// Assemble the user prompt for one invocation
pub fn build_prompt(agent: &AgentDescriptor, context: &DealContext, input: &str) -> Result<String> {
    let deal_json = context.to_pretty_json()?;
    let request = if input.is_empty() {
        format!("Execute the agent's core command: {}", agent.command)
    } else {
        input.to_string()
    };

    let mut prompt = format!(
        "## Deal Information Context\n\
         Use this data as the single source of truth for your response.\n\
         ```json\n{deal_json}\n```\n\
         ---\n\
         ## Agent Task & User Request\n\
         **Agent:** {}\n\
         **User's Request:** \"{request}\"\n",
        agent.title
    );

    if !agent.output_requirements.is_empty() {
        prompt.push_str("\n**The report MUST include the following components:**\n");
        prompt.push_str(&agent.output_requirements);
        prompt.push('\n');
    }

    if agent.mode == AgentMode::Search {
        prompt.push_str(
            "\nUse Google Search to find the most relevant, up-to-date information and \
             synthesize the results into the report.\n",
        );
    }

    Ok(prompt)
}

fn build_request(agent: &AgentDescriptor, prompt: &str) -> serde_json::Value {
    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
    });

    match agent.mode {
        AgentMode::Search => {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }
        AgentMode::Thinking => {
            body["generationConfig"] =
                json!({ "thinkingConfig": { "thinkingBudget": THINKING_BUDGET } });
        }
        AgentMode::Default => {}
    }

    body
}

fn into_agent_result(
    agent: &AgentDescriptor,
    payload: GenerateContentResponse,
) -> Result<AgentResult> {
    let candidate = payload
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("AI service returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(anyhow!("AI service returned an empty response"));
    }

    let sources = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(GroundingChunk::into_source)
                .collect()
        })
        .unwrap_or_default();

    let mut result = AgentResult::new(text).with_sources(sources);
    if agent.id == CAPITAL_STACK_AGENT {
        let metrics = parse_metrics_from_text(&result.text);
        result = result.with_metrics(metrics);
    }
    Ok(result)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<ChunkLink>,
    maps: Option<ChunkLink>,
}

#[derive(Debug, Deserialize)]
struct ChunkLink {
    uri: Option<String>,
    title: Option<String>,
}

impl GroundingChunk {
    /// Chunks lacking either a uri or a title are dropped
    fn into_source(self) -> Option<GroundingSource> {
        if let Some(ChunkLink {
            uri: Some(uri),
            title: Some(title),
        }) = self.web
        {
            return Some(GroundingSource::Web { uri, title });
        }
        if let Some(ChunkLink {
            uri: Some(uri),
            title: Some(title),
        }) = self.maps
        {
            return Some(GroundingSource::Maps { uri, title });
        }
        None
    }
}
