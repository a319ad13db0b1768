//! In-memory host for tests
//!
//! Answers the window methods from a table, echoes whatever was set, and
//! behaves like the real host for closed windows: `nvim_win_is_valid`
//! answers `false` and every other call is rejected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use crate::{ChannelError, RemoteChannel};

#[derive(Debug, Clone)]
pub struct MockWindow {
    pub buf: i64,
    pub cursor: (i64, i64),
    pub height: i64,
    pub width: i64,
    pub position: (i64, i64),
    pub tabpage: i64,
    pub number: i64,
    pub config: Map<String, Value>,
    pub valid: bool,
}

impl MockWindow {
    fn new(id: i64) -> Self {
        let mut config = Map::new();
        config.insert("relative".to_string(), json!(""));
        Self {
            buf: 1,
            cursor: (1, 0),
            height: 24,
            width: 80,
            position: (0, 0),
            tabpage: 1,
            number: id - 999,
            config,
            valid: true,
        }
    }
}

#[derive(Debug, Default)]
struct HostState {
    windows: HashMap<i64, MockWindow>,
    calls: Vec<(String, Vec<Value>)>,
}

#[derive(Debug, Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

fn rejected(message: impl Into<String>) -> ChannelError {
    ChannelError::Remote(json!([1, message.into()]))
}

fn int_arg(args: &[Value], index: usize) -> Result<i64, ChannelError> {
    args.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| rejected(format!("Expected integer argument at {}", index)))
}

fn pair_arg(args: &[Value], index: usize) -> Result<(i64, i64), ChannelError> {
    serde_json::from_value(args.get(index).cloned().unwrap_or(Value::Null))
        .map_err(|_| rejected(format!("Expected [row, col] at {}", index)))
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_window(self: Arc<Self>, id: i64) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .windows
            .insert(id, MockWindow::new(id));
        self
    }

    /// Edit a window's state directly, bypassing the request log
    pub fn edit_window(&self, id: i64, edit: impl FnOnce(&mut MockWindow)) {
        let mut state = self.state.lock().unwrap();
        edit(state.windows.get_mut(&id).expect("unknown mock window"));
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

impl RemoteChannel for MockHost {
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, ChannelError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((method.to_string(), args.clone()));

        let id = int_arg(&args, 0)?;
        let window = match state.windows.get_mut(&id) {
            Some(window) if window.valid => window,
            Some(_) if method == "nvim_win_is_valid" => return Ok(json!(false)),
            None if method == "nvim_win_is_valid" => return Ok(json!(false)),
            _ => return Err(rejected(format!("Invalid window id: {}", id))),
        };

        match method {
            "nvim_win_get_buf" => Ok(json!(window.buf)),
            "nvim_win_set_buf" => {
                window.buf = int_arg(&args, 1)?;
                Ok(Value::Null)
            }
            "nvim_win_get_cursor" => Ok(json!([window.cursor.0, window.cursor.1])),
            "nvim_win_set_cursor" => {
                let (row, col) = pair_arg(&args, 1)?;
                if row < 1 {
                    return Err(rejected("Cursor position outside buffer"));
                }
                window.cursor = (row, col);
                Ok(Value::Null)
            }
            "nvim_win_get_height" => Ok(json!(window.height)),
            "nvim_win_set_height" => {
                window.height = int_arg(&args, 1)?;
                Ok(Value::Null)
            }
            "nvim_win_get_width" => Ok(json!(window.width)),
            "nvim_win_set_width" => {
                window.width = int_arg(&args, 1)?;
                Ok(Value::Null)
            }
            "nvim_win_get_position" => Ok(json!([window.position.0, window.position.1])),
            "nvim_win_get_tabpage" => Ok(json!(window.tabpage)),
            "nvim_win_is_valid" => Ok(json!(true)),
            "nvim_win_get_number" => Ok(json!(window.number)),
            "nvim_win_close" => {
                if !args.get(1).map(Value::is_boolean).unwrap_or(false) {
                    return Err(rejected("Expected boolean force argument"));
                }
                window.valid = false;
                Ok(Value::Null)
            }
            "nvim_win_hide" => {
                window.valid = false;
                Ok(Value::Null)
            }
            "nvim_win_get_config" => {
                let mut config = window.config.clone();
                config.entry("focusable").or_insert(json!(true));
                config.entry("external").or_insert(json!(false));
                // nvim reports positions as floats whatever was set
                for key in ["row", "col"] {
                    if let Some(value) = config.get_mut(key) {
                        if let Some(v) = value.as_f64() {
                            *value = json!(v);
                        }
                    }
                }
                Ok(Value::Object(config))
            }
            "nvim_win_set_config" => match args.get(1) {
                Some(Value::Object(update)) => {
                    for (key, value) in update {
                        window.config.insert(key.clone(), value.clone());
                    }
                    Ok(Value::Null)
                }
                _ => Err(rejected("Expected config dictionary")),
            },
            other => Err(rejected(format!("Invalid method: {}", other))),
        }
    }
}
