//! Step protocol: decoding assistant replies and encoding observations
//!
//! The model answers every turn with a single JSON object:
//! `{"step": "PLAN"|"TOOL"|"OUTPUT", "content": ..., "tool": ..., "input": ...}`.
//! Tool results travel back as `{"step": "OBSERVE", "tool": ..., "output": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

const OBSERVE: &str = "OBSERVE";

/// The three step kinds a model may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Plan,
    Tool,
    Output,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Plan => "PLAN",
            StepKind::Tool => "TOOL",
            StepKind::Output => "OUTPUT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PLAN" => Some(StepKind::Plan),
            "TOOL" => Some(StepKind::Tool),
            "OUTPUT" => Some(StepKind::Output),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded assistant turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Plan { content: String },
    Tool { tool: String, input: String },
    Output { content: String },
}

/// Why an assistant reply could not be turned into a step
#[derive(Debug, Error)]
pub enum StepError {
    #[error("reply is not a JSON object: {0}")]
    Malformed(String),

    #[error("reply has no \"step\" field")]
    MissingStep,

    #[error("unknown step kind '{0}'")]
    UnknownKind(String),

    #[error("{kind} step is missing \"{field}\"")]
    MissingField { kind: StepKind, field: &'static str },
}

impl Step {
    #[cfg(test)]
    pub fn plan(content: impl Into<String>) -> Self {
        Step::Plan {
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn tool(tool: impl Into<String>, input: impl Into<String>) -> Self {
        Step::Tool {
            tool: tool.into(),
            input: input.into(),
        }
    }

    #[cfg(test)]
    pub fn output(content: impl Into<String>) -> Self {
        Step::Output {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Plan { .. } => StepKind::Plan,
            Step::Tool { .. } => StepKind::Tool,
            Step::Output { .. } => StepKind::Output,
        }
    }

    /// Decode one raw assistant reply
    ///
    /// The reply must be a single JSON object (surrounding whitespace aside)
    /// whose `step` is exactly `PLAN`, `TOOL` or `OUTPUT`.
    pub fn decode(raw: &str) -> Result<Self, StepError> {
        let object = parse_object(raw.trim())?;
        Self::from_object(&object)
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self, StepError> {
        let step = match object.get("step") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => return Err(StepError::MissingStep),
            Some(other) => return Err(StepError::UnknownKind(other.to_string())),
        };

        let kind = StepKind::parse(step)
            .ok_or_else(|| StepError::UnknownKind(step.to_string()))?;

        match kind {
            StepKind::Plan => Ok(Step::Plan {
                content: text_field(object, "content").unwrap_or_default(),
            }),
            StepKind::Tool => {
                let tool = match object.get("tool") {
                    Some(Value::String(name)) if !name.is_empty() => name.clone(),
                    _ => {
                        return Err(StepError::MissingField {
                            kind,
                            field: "tool",
                        })
                    }
                };
                let input = text_field(object, "input").ok_or(StepError::MissingField {
                    kind,
                    field: "input",
                })?;
                Ok(Step::Tool { tool, input })
            }
            StepKind::Output => {
                let content = text_field(object, "content").ok_or(StepError::MissingField {
                    kind,
                    field: "content",
                })?;
                Ok(Step::Output { content })
            }
        }
    }

    /// Encode in the wire format the model is asked to produce
    #[cfg(test)]
    pub fn to_json(&self) -> String {
        let value = match self {
            Step::Plan { content } => json!({ "step": "PLAN", "content": content }),
            Step::Tool { tool, input } => json!({ "step": "TOOL", "tool": tool, "input": input }),
            Step::Output { content } => json!({ "step": "OUTPUT", "content": content }),
        };
        value.to_string()
    }
}

/// Result of a tool run, fed back to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub tool: String,
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ObservationWire {
    step: String,
    tool: String,
    output: String,
}

impl Observation {
    pub fn new(tool: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            output: output.into(),
        }
    }

    pub fn encode(&self) -> String {
        json!({ "step": OBSERVE, "tool": self.tool, "output": self.output }).to_string()
    }

    pub fn decode(raw: &str) -> Result<Self, StepError> {
        let wire: ObservationWire =
            serde_json::from_str(raw).map_err(|e| StepError::Malformed(e.to_string()))?;
        if wire.step != OBSERVE {
            return Err(StepError::UnknownKind(wire.step));
        }
        Ok(Self {
            tool: wire.tool,
            output: wire.output,
        })
    }
}

/// String fields are taken verbatim; other JSON values (a model sending the
/// write_file payload as a nested object, say) become their compact JSON text.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_object(content: &str) -> Result<Map<String, Value>, StepError> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StepError::Malformed(format!(
            "expected an object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(StepError::Malformed(e.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
