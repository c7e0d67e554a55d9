//! Fault isolation for rendering.
//!
//! A `Boundary` runs each render unit on its own. A unit that returns an
//! error or panics is replaced by a `Failed` placeholder carrying its key;
//! siblings still render and no session state is touched. The placeholder
//! persists until the unit is explicitly retried.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed field '{field}': {reason}")]
    Malformed { field: String, reason: String },
}

impl RenderError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        RenderError::Malformed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Rendered<V> {
    Ok { view: V },
    Failed { key: String, message: String },
}

impl<V> Rendered<V> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Rendered::Failed { .. })
    }
}

#[derive(Debug, Default)]
pub struct Boundary {
    failed: HashMap<String, String>,
}

impl Boundary {
    pub fn render<V, F>(&mut self, key: &str, unit: F) -> Rendered<V>
    where
        F: FnOnce() -> Result<V, RenderError>,
    {
        if let Some(message) = self.failed.get(key) {
            return Rendered::Failed {
                key: key.to_string(),
                message: message.clone(),
            };
        }

        let message = match catch_unwind(AssertUnwindSafe(unit)) {
            Ok(Ok(view)) => return Rendered::Ok { view },
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        error!("Render of {key} failed: {message}");
        self.failed.insert(key.to_string(), message.clone());
        Rendered::Failed {
            key: key.to_string(),
            message,
        }
    }

    /// Clears a failure so the next render re-attempts the unit.
    pub fn retry(&mut self, key: &str) -> bool {
        self.failed.remove(key).is_some()
    }

    /// Forgets every recorded failure, e.g. when a new batch replaces the
    /// units being rendered.
    pub fn reset(&mut self) {
        self.failed.clear();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "render panicked".to_string()
    }
}
