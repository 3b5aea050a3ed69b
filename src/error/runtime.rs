//! Resolution and execution errors

use super::HarnessError;

/// Creates a module resolution error
pub fn module_not_found(specifier: impl Into<String>, from: impl Into<String>) -> HarnessError {
    HarnessError::ModuleNotFound {
        specifier: specifier.into(),
        from: from.into(),
    }
}

/// Creates an error for a value thrown by executed code
pub fn execution(name: impl Into<String>, message: impl Into<String>) -> HarnessError {
    thrown(name, message, None, None, serde_json::Value::Null)
}

/// Creates an execution error keeping the details of the thrown value
pub fn thrown(
    name: impl Into<String>,
    message: impl Into<String>,
    code: Option<String>,
    stack: Option<String>,
    thrown: serde_json::Value,
) -> HarnessError {
    HarnessError::Execution {
        name: name.into(),
        message: message.into(),
        code,
        stack,
        thrown,
    }
}

/// Creates an engine failure unrelated to the executed code
pub fn engine(message: impl ToString) -> HarnessError {
    HarnessError::Engine {
        message: message.to_string(),
    }
}
