//! Tool-selecting agent.
//!
//! The model sees the closed tool list and answers each step with either
//! `ACCION: <tool> | <input>` or `RESPUESTA: <text>`. Tool output is fed back
//! as an observation. The loop is bounded by `max_steps`.

use std::sync::Arc;
use std::time::Duration;

use crate::providers::{ChatMessage, Provider, ProviderError};
use crate::tools::{ToolKind, Toolbox};

/// Tool calls allowed before the agent must stop.
pub const DEFAULT_MAX_STEPS: usize = 3;

/// Upper bound for one model call inside the loop.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(90);

const ACTION_MARKERS: &[&str] = &["accion:", "acción:", "action:"];
const ANSWER_MARKERS: &[&str] = &["respuesta:", "respuesta final:", "final answer:", "answer:"];

/// What the model asked for in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    UseTool { tool: ToolKind, input: String },
    UnknownTool(String),
    Answer(String),
}

/// Strip a leading marker (case-insensitive) from a line.
fn strip_marker<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    let lower = line.to_lowercase();
    markers.iter().find_map(|m| {
        if lower.starts_with(m) {
            // Markers are ASCII apart from 'ó', whose byte length matches in both cases.
            line.get(m.len()..).map(str::trim)
        } else {
            None
        }
    })
}

/// Parse one model reply. A reply with no marker is taken as the final answer.
pub fn parse_step(reply: &str) -> AgentStep {
    let lines: Vec<&str> = reply.lines().collect();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();

        if let Some(rest) = strip_marker(line, ANSWER_MARKERS) {
            let mut answer = rest.to_string();
            for more in &lines[i + 1..] {
                answer.push('\n');
                answer.push_str(more);
            }
            return AgentStep::Answer(answer.trim().to_string());
        }

        if let Some(rest) = strip_marker(line, ACTION_MARKERS) {
            let (name, input) = match rest.split_once('|') {
                Some((name, input)) => (name.trim(), input.trim()),
                None => (rest.trim(), ""),
            };
            return match name.parse::<ToolKind>() {
                Ok(tool) => AgentStep::UseTool { tool, input: input.to_string() },
                Err(_) => AgentStep::UnknownTool(name.to_string()),
            };
        }
    }

    AgentStep::Answer(reply.trim().to_string())
}

fn system_prompt() -> String {
    let tools = ToolKind::ALL
        .iter()
        .map(|t| format!("- {}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Eres Serena, una asistente de bienestar emocional que responde en español, con calidez y \
brevedad. No das diagnósticos. Si detectas señales de autolesión o ideas suicidas, recomienda con \
claridad buscar ayuda profesional o una línea de crisis de inmediato.\n\n\
Puedes usar estas herramientas:\n{}\n\n\
Responde SIEMPRE en uno de estos dos formatos:\n\
ACCION: <herramienta> | <entrada>\n\
RESPUESTA: <tu respuesta final para la persona>\n\n\
Después de cada ACCION recibirás un mensaje OBSERVACION con el resultado.",
        tools
    )
}

/// Bounded tool-using agent.
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Toolbox,
    max_steps: usize,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, tools: Toolbox) -> Self {
        Self { provider, tools, max_steps: DEFAULT_MAX_STEPS }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Answer `user_text` given prior `history`. Errors only when the model fails.
    pub async fn run(&self, history: &[ChatMessage], user_text: &str) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(history.len() + 2 + self.max_steps * 2);
        messages.push(ChatMessage::system(system_prompt()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_text));

        let mut last_observation = None;

        for step in 1..=self.max_steps {
            let reply = tokio::time::timeout(STEP_TIMEOUT, self.provider.complete(&messages))
                .await
                .map_err(|_| ProviderError::other(format!("agent step {} timed out", step)))??;

            let observation = match parse_step(&reply) {
                AgentStep::Answer(answer) if answer.is_empty() => {
                    return Err(ProviderError::EmptyResponse);
                }
                AgentStep::Answer(answer) => {
                    tracing::debug!("Agent answered after {} step(s)", step);
                    return Ok(answer);
                }
                AgentStep::UseTool { tool, input } => {
                    tracing::info!("Agent step {}: {} {:?}", step, tool, input);
                    let result = self.tools.invoke(tool, &input).await;
                    last_observation = Some(result.text.clone());
                    result.text
                }
                AgentStep::UnknownTool(name) => {
                    tracing::warn!("Agent step {} asked for unknown tool {:?}", step, name);
                    format!(
                        "La herramienta '{}' no existe. Usa una de: {}.",
                        name,
                        ToolKind::ALL.map(|t| t.name()).join(", ")
                    )
                }
            };

            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(format!("OBSERVACION: {}", observation)));
        }

        tracing::info!("Agent hit its {}-step budget", self.max_steps);
        last_observation.ok_or_else(|| ProviderError::other("agent produced no answer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedProvider;
    use crate::tools::testing::recording_toolbox;

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_step("Pensamiento: necesito el clima\nACCION: clima | San Salvador"),
            AgentStep::UseTool { tool: ToolKind::Weather, input: "San Salvador".into() }
        );
        assert_eq!(
            parse_step("Acción: motivacion"),
            AgentStep::UseTool { tool: ToolKind::Motivation, input: String::new() }
        );
        assert_eq!(
            parse_step("ACCION: calculadora | 2+2"),
            AgentStep::UnknownTool("calculadora".into())
        );
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            parse_step("RESPUESTA: Respira hondo.\nEstoy aquí."),
            AgentStep::Answer("Respira hondo.\nEstoy aquí.".into())
        );
        assert_eq!(parse_step("Hola, ¿en qué te ayudo?"), AgentStep::Answer("Hola, ¿en qué te ayudo?".into()));
    }

    #[tokio::test]
    async fn test_direct_answer_uses_no_tools() {
        let (tools, recorders) = recording_toolbox();
        let provider = ScriptedProvider::replies(&["RESPUESTA: ¡Hola!"]);
        let agent = Agent::new(provider.clone(), tools);

        assert_eq!(agent.run(&[], "hola").await.unwrap(), "¡Hola!");
        assert!(recorders.weather.calls().is_empty());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let (tools, recorders) = recording_toolbox();
        let provider = ScriptedProvider::replies(&[
            "ACCION: clima | Paris",
            "RESPUESTA: En París hace buen tiempo.",
        ]);
        let agent = Agent::new(provider.clone(), tools);

        let answer = agent.run(&[ChatMessage::user("antes"), ChatMessage::assistant("ok")], "¿clima en París?")
            .await
            .unwrap();
        assert_eq!(answer, "En París hace buen tiempo.");
        assert_eq!(recorders.weather.calls(), vec!["Paris".to_string()]);

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][1].content, "antes");
        assert_eq!(calls[1].last().unwrap().content, "OBSERVACION: clima:Paris");
    }

    #[tokio::test]
    async fn test_step_budget_returns_last_observation() {
        let (tools, recorders) = recording_toolbox();
        let provider = ScriptedProvider::replies(&[
            "ACCION: animo | triste",
            "ACCION: motivacion | ánimo",
        ]);
        let agent = Agent::new(provider, tools).with_max_steps(2);

        assert_eq!(agent.run(&[], "estoy mal").await.unwrap(), "motivacion:ánimo");
        assert_eq!(recorders.mood.calls().len(), 1);
        assert_eq!(recorders.motivation.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_answer_is_empty_response() {
        let (tools, _recorders) = recording_toolbox();
        let agent = Agent::new(ScriptedProvider::replies(&["RESPUESTA:   "]), tools);
        assert!(matches!(agent.run(&[], "hola").await, Err(ProviderError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let (tools, _recorders) = recording_toolbox();
        let agent = Agent::new(ScriptedProvider::failing(), tools);
        assert!(agent.run(&[], "hola").await.is_err());
    }
}
