//! LLM-backed assessment client
//!
//! Real implementation of the `AssessmentCapability` port over an
//! OpenAI-compatible chat API (Azure, Gemini, Doubao and similar gateways
//! all work through the same surface). Extracted work images travel as
//! vision content parts encoded as data URLs.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, AssessmentError};
use crate::services::qualitative::{
    AssessmentCapability, AssessmentContext, AssessmentDetails, AssessmentOutcome, StepAssessment,
};

/// Assessment client over an OpenAI-compatible chat endpoint
pub struct LlmAssessmentClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

/// JSON shape the model is asked to reply with
#[derive(Debug, Deserialize)]
struct LlmReply {
    score: f64,
    feedback: String,
    accuracy: Option<f64>,
    completeness: Option<f64>,
    logic: Option<f64>,
    expression: Option<f64>,
    steps: Option<Vec<LlmStep>>,
}

/// One solution step in the model reply
#[derive(Debug, Deserialize)]
struct LlmStep {
    description: String,
    expression: Option<String>,
    is_correct: bool,
    feedback: String,
}

impl LlmAssessmentClient {
    /// Build a client from the engine configuration
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    fn system_message(detailed: bool) -> String {
        let mut msg = String::from(
            "You are a strict but fair grader for student answers. Score the answer from 0 to \
             100 against the question, the rubric when given, and the worked solution when \
             given. Reply with JSON only: {\"score\": number, \"feedback\": string",
        );
        if detailed {
            msg.push_str(
                ", \"accuracy\": number, \"completeness\": number, \"logic\": number, \
                 \"expression\": number",
            );
        }
        msg.push_str(
            "}. When the answer is a multi-step solution, also include \"steps\": \
             [{\"description\": string, \"expression\": string or null, \"is_correct\": bool, \
             \"feedback\": string}] in solution order. The feedback must be short, concrete, \
             and addressed to the student.",
        );
        msg
    }

    fn user_message(context: &AssessmentContext, rubric: Option<&str>) -> String {
        let mut msg = format!("Question:\n{}\n\nStudent answer:\n{}", context.prompt, {
            if context.answer.trim().is_empty() && context.work_image.is_some() {
                "(handwritten work, see attached image)"
            } else {
                context.answer.as_str()
            }
        });

        if let Some(solution) = &context.solution {
            msg.push_str("\n\nReference solution:\n");
            msg.push_str(solution);
        }
        if let Some(rubric) = rubric {
            msg.push_str("\n\nRubric:\n");
            msg.push_str(rubric);
        }
        if context.work_image.is_some() {
            msg.push_str("\n\nThe attached image shows the student's written work.");
        }
        msg
    }

    /// Base64 data URL for an in-memory PNG
    fn data_url(png_bytes: &[u8]) -> String {
        let encoded = base64::prelude::BASE64_STANDARD.encode(png_bytes);
        format!("data:image/png;base64,{}", encoded)
    }

    /// Interpret the model reply. Accepts plain JSON or JSON wrapped in a
    /// markdown code fence; models are not reliable about fences.
    fn parse_reply(response: &str) -> AppResult<LlmReply> {
        let trimmed = response.trim();
        let candidate = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .map(str::trim)
            .unwrap_or(trimmed);

        serde_json::from_str::<LlmReply>(candidate).map_err(|_| {
            AppError::Assessment(AssessmentError::MalformedResponse {
                response: response.chars().take(200).collect(),
            })
        })
    }
}

#[async_trait]
impl AssessmentCapability for LlmAssessmentClient {
    async fn assess(
        &self,
        context: &AssessmentContext,
        rubric: Option<&str>,
    ) -> AppResult<AssessmentOutcome> {
        debug!("calling assessment model: {}", self.model_name);

        let mut messages = Vec::new();

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(Self::system_message(context.detailed))
            .build()
            .map_err(|e| {
                AppError::Assessment(AssessmentError::CallFailed {
                    model: self.model_name.clone(),
                    source: Box::new(e),
                })
            })?;
        messages.push(ChatCompletionRequestMessage::System(system_msg));

        let user_text = Self::user_message(context, rubric);
        let user_msg = if let Some(png) = &context.work_image {
            let content_parts = vec![
                ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText { text: user_text },
                ),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: Self::data_url(png),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ),
            ];

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()
        } else {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_text)
                .build()
        }
        .map_err(|e| {
            AppError::Assessment(AssessmentError::CallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })
        })?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| {
                AppError::Assessment(AssessmentError::CallFailed {
                    model: self.model_name.clone(),
                    source: Box::new(e),
                })
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("assessment API call failed: {}", e);
            AppError::Assessment(AssessmentError::CallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Assessment(AssessmentError::EmptyResponse {
                    model: self.model_name.clone(),
                })
            })?;

        let reply = Self::parse_reply(&content)?;

        let details = match (
            reply.accuracy,
            reply.completeness,
            reply.logic,
            reply.expression,
        ) {
            (Some(accuracy), Some(completeness), Some(logic), Some(expression)) => {
                Some(AssessmentDetails {
                    accuracy,
                    completeness,
                    logic,
                    expression,
                })
            }
            _ => None,
        };

        let steps = reply.steps.map(|steps| {
            steps
                .into_iter()
                .map(|s| StepAssessment {
                    description: s.description,
                    expression: s.expression,
                    is_correct: s.is_correct,
                    feedback: s.feedback,
                })
                .collect()
        });

        Ok(AssessmentOutcome {
            score: reply.score.clamp(0.0, 100.0),
            feedback: reply.feedback,
            details,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_reply() {
        let reply =
            LlmAssessmentClient::parse_reply(r#"{"score": 82.5, "feedback": "Good work."}"#)
                .unwrap();
        assert_eq!(reply.score, 82.5);
        assert_eq!(reply.feedback, "Good work.");
        assert!(reply.accuracy.is_none());
    }

    #[test]
    fn parses_fenced_json_reply() {
        let fenced = "```json\n{\"score\": 40, \"feedback\": \"Missing the second step.\", \
                      \"accuracy\": 50, \"completeness\": 30, \"logic\": 45, \"expression\": 60}\n```";
        let reply = LlmAssessmentClient::parse_reply(fenced).unwrap();
        assert_eq!(reply.score, 40.0);
        assert_eq!(reply.accuracy, Some(50.0));
    }

    #[test]
    fn malformed_reply_is_a_typed_error() {
        let result = LlmAssessmentClient::parse_reply("I would give this a 7/10");
        assert!(matches!(
            result,
            Err(AppError::Assessment(AssessmentError::MalformedResponse { .. }))
        ));
    }

    #[test]
    fn data_url_encodes_base64() {
        assert_eq!(
            LlmAssessmentClient::data_url(b"Man"),
            "data:image/png;base64,TWFu"
        );
        assert_eq!(
            LlmAssessmentClient::data_url(b"Ma"),
            "data:image/png;base64,TWE="
        );
        assert_eq!(
            LlmAssessmentClient::data_url(b"M"),
            "data:image/png;base64,TQ=="
        );
    }

    /// Live-network check. Run manually:
    /// `LLM_API_KEY=... cargo test llm_assess_live -- --ignored --nocapture`
    #[tokio::test]
    #[ignore]
    async fn llm_assess_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let client = LlmAssessmentClient::new(&config);

        let context = AssessmentContext {
            prompt: "Explain why the sum of two even numbers is even.".to_string(),
            answer: "Two even numbers are 2a and 2b, their sum is 2(a+b), which is even."
                .to_string(),
            work_image: None,
            solution: None,
            detailed: true,
        };

        let outcome = client.assess(&context, None).await.expect("live call failed");
        println!("score: {}, feedback: {}", outcome.score, outcome.feedback);
        assert!((0.0..=100.0).contains(&outcome.score));
        assert!(!outcome.feedback.is_empty());
    }
}
