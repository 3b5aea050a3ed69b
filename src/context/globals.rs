//! Caller-supplied global bindings

use boa_engine::{Context, JsObject, JsResult, JsString, JsValue, Source};

use crate::error::{Result, config};

/// Value of one injected global
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue {
    /// Converted from JSON into a fresh engine value in every context
    Json(serde_json::Value),
    /// Expression evaluated in every context; its completion value is bound
    Script(String),
}

/// Ordered global overrides; later entries win
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals {
    entries: Vec<(String, GlobalValue)>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a JSON value
    #[must_use]
    pub fn with_json(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.push((name.into(), GlobalValue::Json(value)));
        self
    }

    /// Bind `name` to the result of evaluating `expression`
    #[must_use]
    pub fn with_script(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.entries
            .push((name.into(), GlobalValue::Script(expression.into())));
        self
    }

    /// Build from a JSON object, one global per key
    pub fn from_json_object(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| config::invalid("globals must be a JSON object"))?;
        Ok(object
            .iter()
            .fold(Self::new(), |globals, (name, value)| {
                globals.with_json(name.clone(), value.clone())
            }))
    }

    /// Parse a `NAME=JSON` pair as given on the command line
    pub fn parse_assignment(assignment: &str) -> Result<(String, serde_json::Value)> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| config::invalid(format!("expected NAME=JSON, got '{}'", assignment)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(config::invalid(format!(
                "missing global name in '{}'",
                assignment
            )));
        }
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        Ok((name.to_string(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Names in application order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn install(&self, global: &JsObject, context: &mut Context) -> JsResult<()> {
        for (name, value) in &self.entries {
            let value = match value {
                GlobalValue::Json(json) => JsValue::from_json(json, context)?,
                GlobalValue::Script(expression) => {
                    context.eval(Source::from_bytes(expression.as_bytes()))?
                }
            };
            global.set(JsString::from(name.as_str()), value, true, context)?;
        }
        Ok(())
    }
}
