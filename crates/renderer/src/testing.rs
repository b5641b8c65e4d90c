//! In-memory engine for native tests

use crate::engine::ChartEngine;
use eco_chart_config::RendererKind;
use eco_chart_shared::{EcoChartError, EcoChartResult};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Handle issued by [`MockEngine`]; deliberately not `Clone`
#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Init { renderer: RendererKind, handle: u32 },
    SetOption { handle: u32, option: Value, replace: bool },
    Resize { handle: u32 },
    Dispose { handle: u32 },
}

impl EngineCall {
    pub fn is_replace(&self) -> bool {
        matches!(self, EngineCall::SetOption { replace: true, .. })
    }

    pub fn option(&self) -> Option<&Value> {
        match self {
            EngineCall::SetOption { option, .. } => Some(option),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<EngineCall>,
    next_handle: u32,
    live: HashSet<u32>,
    fail_next_init: bool,
    fail_set_option: bool,
}

/// Records every call; clones share the same log so a test can keep one
/// copy while the widget owns another.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Rc<RefCell<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_init(&self) {
        self.state.borrow_mut().fail_next_init = true;
    }

    pub fn set_fail_set_option(&self, fail: bool) {
        self.state.borrow_mut().fail_set_option = fail;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn init_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Init { .. }))
    }

    pub fn set_option_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::SetOption { .. }))
    }

    pub fn resize_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Resize { .. }))
    }

    pub fn dispose_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Dispose { .. }))
    }

    pub fn live_handles(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Last option fragment passed to `set_option`
    pub fn last_option(&self) -> Option<Value> {
        self.state
            .borrow()
            .calls
            .iter()
            .rev()
            .find_map(|c| c.option().cloned())
    }

    /// Option the engine would hold after merging every call since the last replace
    pub fn merged_option(&self) -> Value {
        let state = self.state.borrow();
        let mut merged = Value::Null;
        for call in &state.calls {
            if let EngineCall::SetOption { option, replace, .. } = call {
                if *replace {
                    merged = option.clone();
                } else {
                    merge_option(&mut merged, option);
                }
            }
        }
        merged
    }

    fn assert_live(state: &MockState, handle: &MockHandle, operation: &str) {
        assert!(
            state.live.contains(&handle.0),
            "{} on disposed handle {}",
            operation,
            handle.0
        );
    }
}

/// Objects merge key by key, `series` merges by position, other arrays replace
fn merge_option(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(Value::Array(existing)) if key == "series" => {
                        if let Value::Array(entries) = value {
                            for (i, entry) in entries.iter().enumerate() {
                                match existing.get_mut(i) {
                                    Some(slot) => merge_option(slot, entry),
                                    None => existing.push(entry.clone()),
                                }
                            }
                        }
                    }
                    Some(slot) => merge_option(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

impl ChartEngine for MockEngine {
    type Handle = MockHandle;

    fn init(&mut self, renderer: RendererKind) -> EcoChartResult<MockHandle> {
        let mut state = self.state.borrow_mut();
        if state.fail_next_init {
            state.fail_next_init = false;
            return Err(EcoChartError::EngineInit {
                message: "container rejected".to_string(),
            });
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.live.insert(handle);
        state.calls.push(EngineCall::Init { renderer, handle });
        Ok(MockHandle(handle))
    }

    fn set_option(&mut self, handle: &MockHandle, option: &Value, replace: bool) -> EcoChartResult<()> {
        let mut state = self.state.borrow_mut();
        Self::assert_live(&state, handle, "set_option");
        if state.fail_set_option {
            return Err(EcoChartError::engine_call("setOption", "engine refused option"));
        }
        state.calls.push(EngineCall::SetOption {
            handle: handle.0,
            option: option.clone(),
            replace,
        });
        Ok(())
    }

    fn resize(&mut self, handle: &MockHandle) -> EcoChartResult<()> {
        let mut state = self.state.borrow_mut();
        Self::assert_live(&state, handle, "resize");
        state.calls.push(EngineCall::Resize { handle: handle.0 });
        Ok(())
    }

    fn dispose(&mut self, handle: MockHandle) {
        let mut state = self.state.borrow_mut();
        assert!(state.live.remove(&handle.0), "double dispose of {}", handle.0);
        state.calls.push(EngineCall::Dispose { handle: handle.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_follows_engine_rules() {
        let engine = MockEngine::new();
        let mut writer = engine.clone();
        let handle = writer.init(RendererKind::Svg).unwrap();

        writer
            .set_option(
                &handle,
                &json!({ "xAxis": { "type": "category", "data": [1, 2] },
                         "series": [{ "name": "Mass", "data": [] }, { "name": "Energy", "data": [] }] }),
                true,
            )
            .unwrap();
        writer
            .set_option(
                &handle,
                &json!({ "xAxis": { "data": [3] }, "series": [{ "name": "Mass" }, { "name": "Energy", "data": [9] }] }),
                false,
            )
            .unwrap();

        let merged = engine.merged_option();
        assert_eq!(merged["xAxis"], json!({ "type": "category", "data": [3] }));
        assert_eq!(merged["series"][0]["data"], json!([]));
        assert_eq!(merged["series"][1]["data"], json!([9]));

        writer.dispose(handle);
        assert_eq!(engine.live_handles(), 0);
        assert_eq!(engine.dispose_count(), 1);
    }

    #[test]
    fn test_failed_init_issues_no_handle() {
        let mut engine = MockEngine::new();
        engine.fail_next_init();
        assert!(engine.init(RendererKind::Canvas).is_err());
        assert_eq!(engine.init_count(), 0);
        assert!(engine.init(RendererKind::Canvas).is_ok());
    }
}
