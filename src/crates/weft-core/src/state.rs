//! Channel-based state and reducer system
//!
//! Graph state is a JSON object whose top-level keys are **channels**. Nodes
//! never mutate state in place: they return a partial update (a subset of
//! channels), and the engine merges it through the channel's [`Reducer`].
//! Channels absent from an update are left untouched.
//!
//! # Built-in Reducers
//!
//! | Reducer | Behavior |
//! |---------|----------|
//! | [`OverwriteReducer`] | New value replaces the old one |
//! | [`AppendReducer`] | New values concatenate onto an ordered list |
//!
//! Anything else comes in through a custom [`Reducer`] implementation.
//! Reducers must be deterministic and side-effect free: replaying the same
//! step from the same checkpoint with the same updates has to produce
//! byte-identical state, which is what makes crash recovery sound.
//!
//! # Examples
//!
//! ```rust
//! use weft_core::state::{AppendReducer, OverwriteReducer, StateSchema};
//! use serde_json::json;
//!
//! let mut schema = StateSchema::new();
//! schema.add_channel("log", Box::new(AppendReducer));
//! schema.add_channel("phase", Box::new(OverwriteReducer));
//!
//! let mut state = json!({"log": ["started"], "phase": "ingest"});
//! schema
//!     .apply(&mut state, &json!({"log": ["parsed"], "phase": "route"}))
//!     .unwrap();
//!
//! assert_eq!(state["log"], json!(["started", "parsed"]));
//! assert_eq!(state["phase"], json!("route"));
//! ```

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during state operations
#[derive(Debug, Error)]
pub enum StateError {
    /// State structure is invalid (e.g., not an object)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reducer encountered incompatible types or failed to merge
    #[error("Reducer error on channel '{channel}': {error}")]
    ReducerError {
        /// Channel whose merge failed
        channel: String,
        /// Description of the failure
        error: String,
    },
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Merge policy combining a channel's current value with a node's update
pub trait Reducer: Send + Sync {
    /// Merge `update` into `current`, returning the new channel value
    ///
    /// `current` is [`Value::Null`] the first time a channel is written.
    fn reduce(&self, current: &Value, update: &Value) -> std::result::Result<Value, String>;

    /// Human-readable name for logs and debugging
    fn name(&self) -> &str;
}

/// Overwrite reducer - the new value replaces the old one
///
/// The default policy for channels without an explicit reducer. Right for
/// scalar status fields where only the latest value matters.
///
/// # Examples
///
/// ```rust
/// use weft_core::state::{OverwriteReducer, Reducer};
/// use serde_json::json;
///
/// let result = OverwriteReducer.reduce(&json!("old"), &json!("new")).unwrap();
/// assert_eq!(result, json!("new"));
/// ```
#[derive(Debug, Clone)]
pub struct OverwriteReducer;

impl Reducer for OverwriteReducer {
    fn reduce(&self, _current: &Value, update: &Value) -> std::result::Result<Value, String> {
        Ok(update.clone())
    }

    fn name(&self) -> &str {
        "overwrite"
    }
}

/// Append reducer - update values concatenate onto an ordered list
///
/// The policy for accumulating channels: message histories, event logs,
/// results gathered from fan-out branches. A scalar update is appended as a
/// single element; a null current value initializes the list.
///
/// # Examples
///
/// ```rust
/// use weft_core::state::{AppendReducer, Reducer};
/// use serde_json::json;
///
/// let result = AppendReducer.reduce(&json!(["a"]), &json!(["b", "c"])).unwrap();
/// assert_eq!(result, json!(["a", "b", "c"]));
///
/// let result = AppendReducer.reduce(&json!([1, 2]), &json!(3)).unwrap();
/// assert_eq!(result, json!([1, 2, 3]));
/// ```
#[derive(Debug, Clone)]
pub struct AppendReducer;

impl Reducer for AppendReducer {
    fn reduce(&self, current: &Value, update: &Value) -> std::result::Result<Value, String> {
        match (current, update) {
            (Value::Array(curr), Value::Array(upd)) => {
                let mut result = curr.clone();
                result.extend_from_slice(upd);
                Ok(Value::Array(result))
            }
            (Value::Null, Value::Array(upd)) => Ok(Value::Array(upd.clone())),
            (Value::Array(curr), single) => {
                let mut result = curr.clone();
                result.push(single.clone());
                Ok(Value::Array(result))
            }
            (Value::Null, single) => Ok(Value::Array(vec![single.clone()])),
            _ => Err("append requires the current value to be an array".to_string()),
        }
    }

    fn name(&self) -> &str {
        "append"
    }
}

/// State schema mapping channel names to their reducers
///
/// Channels without an explicit reducer fall back to the default reducer, or
/// to overwrite semantics if no default is configured.
#[derive(Default)]
pub struct StateSchema {
    channels: HashMap<String, Box<dyn Reducer>>,
    default_reducer: Option<Box<dyn Reducer>>,
}

impl StateSchema {
    /// Create an empty schema (every channel overwrites)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel with a specific reducer
    pub fn add_channel(&mut self, name: impl Into<String>, reducer: Box<dyn Reducer>) {
        self.channels.insert(name.into(), reducer);
    }

    /// Set the fallback reducer for channels not explicitly registered
    pub fn with_default_reducer(mut self, reducer: Box<dyn Reducer>) -> Self {
        self.default_reducer = Some(reducer);
        self
    }

    fn reducer_for(&self, channel: &str) -> Option<&dyn Reducer> {
        self.channels
            .get(channel)
            .map(|r| r.as_ref())
            .or_else(|| self.default_reducer.as_ref().map(|r| r.as_ref()))
    }

    /// Merge a partial update into `state`, channel by channel
    ///
    /// Channels absent from the update are untouched. Both `state` and
    /// `update` must be JSON objects.
    pub fn apply(&self, state: &mut Value, update: &Value) -> Result<()> {
        let state_obj = state
            .as_object_mut()
            .ok_or_else(|| StateError::InvalidState("State must be an object".to_string()))?;

        let update_obj = update
            .as_object()
            .ok_or_else(|| StateError::InvalidState("Update must be an object".to_string()))?;

        for (channel, update_value) in update_obj {
            let current = state_obj.get(channel).cloned().unwrap_or(Value::Null);

            let merged = match self.reducer_for(channel) {
                Some(reducer) => reducer.reduce(&current, update_value).map_err(|error| {
                    StateError::ReducerError {
                        channel: channel.clone(),
                        error,
                    }
                })?,
                None => update_value.clone(),
            };

            state_obj.insert(channel.clone(), merged);
        }

        Ok(())
    }

    /// Check that a value is a usable state object
    pub fn validate(&self, state: &Value) -> Result<()> {
        if !state.is_object() {
            return Err(StateError::InvalidState(
                "State must be an object".to_string(),
            ));
        }
        Ok(())
    }

    /// Names of explicitly registered channels
    pub fn channels(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overwrite_reducer() {
        let result = OverwriteReducer
            .reduce(&json!({"old": true}), &json!({"new": true}))
            .unwrap();
        assert_eq!(result, json!({"new": true}));
    }

    #[test]
    fn test_append_reducer_arrays() {
        let result = AppendReducer.reduce(&json!([1, 2]), &json!([3, 4])).unwrap();
        assert_eq!(result, json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_append_reducer_null_current() {
        let result = AppendReducer.reduce(&Value::Null, &json!(["first"])).unwrap();
        assert_eq!(result, json!(["first"]));
    }

    #[test]
    fn test_append_reducer_rejects_non_array() {
        assert!(AppendReducer.reduce(&json!(42), &json!([1])).is_err());
    }

    #[test]
    fn test_schema_apply_mixed_channels() {
        let mut schema = StateSchema::new();
        schema.add_channel("log", Box::new(AppendReducer));
        schema.add_channel("phase", Box::new(OverwriteReducer));

        let mut state = json!({"log": ["a"], "phase": "one", "untouched": 9});
        schema
            .apply(&mut state, &json!({"log": ["b"], "phase": "two"}))
            .unwrap();

        assert_eq!(state["log"], json!(["a", "b"]));
        assert_eq!(state["phase"], json!("two"));
        assert_eq!(state["untouched"], json!(9));
    }

    #[test]
    fn test_unregistered_channel_overwrites() {
        let schema = StateSchema::new();
        let mut state = json!({"field": "old"});
        schema.apply(&mut state, &json!({"field": "new"})).unwrap();
        assert_eq!(state["field"], json!("new"));
    }

    #[test]
    fn test_default_reducer() {
        let schema = StateSchema::new().with_default_reducer(Box::new(AppendReducer));
        let mut state = json!({});
        schema.apply(&mut state, &json!({"events": ["x"]})).unwrap();
        schema.apply(&mut state, &json!({"events": ["y"]})).unwrap();
        assert_eq!(state["events"], json!(["x", "y"]));
    }

    #[test]
    fn test_reducer_error_carries_channel() {
        let mut schema = StateSchema::new();
        schema.add_channel("log", Box::new(AppendReducer));

        let mut state = json!({"log": "not-an-array"});
        let err = schema
            .apply(&mut state, &json!({"log": ["x"]}))
            .unwrap_err();
        assert!(matches!(err, StateError::ReducerError { ref channel, .. } if channel == "log"));
    }

    #[test]
    fn test_custom_reducer() {
        /// Keeps the maximum numeric value ever written
        struct MaxReducer;

        impl Reducer for MaxReducer {
            fn reduce(
                &self,
                current: &Value,
                update: &Value,
            ) -> std::result::Result<Value, String> {
                let a = current.as_f64().unwrap_or(f64::MIN);
                let b = update.as_f64().ok_or("max requires a number")?;
                Ok(json!(a.max(b)))
            }

            fn name(&self) -> &str {
                "max"
            }
        }

        let mut schema = StateSchema::new();
        schema.add_channel("high_score", Box::new(MaxReducer));

        let mut state = json!({"high_score": 10});
        schema.apply(&mut state, &json!({"high_score": 7})).unwrap();
        assert_eq!(state["high_score"], json!(10.0));
        schema.apply(&mut state, &json!({"high_score": 12})).unwrap();
        assert_eq!(state["high_score"], json!(12.0));
    }

    #[test]
    fn test_idempotent_replay() {
        // Applying the same recorded updates to the same starting snapshot
        // must produce identical results both times.
        let mut schema = StateSchema::new();
        schema.add_channel("log", Box::new(AppendReducer));

        let snapshot = json!({"log": ["a"], "phase": "x"});
        let update = json!({"log": ["b"], "phase": "y"});

        let mut first = snapshot.clone();
        schema.apply(&mut first, &update).unwrap();
        let mut second = snapshot.clone();
        schema.apply(&mut second, &update).unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_reducer_names() {
        assert_eq!(OverwriteReducer.name(), "overwrite");
        assert_eq!(AppendReducer.name(), "append");
    }
}
