use crate::config::ConfigTree;
use crate::ctl::{CommandOutput, CtlRunner};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::Path;

pub(crate) fn sample_config() -> ConfigTree {
    let value = json!({
        "foo": 123,
        "bar": "BAR",
        "baz": {"aaa": "nested", "bbb": {"ccc": "more nested"}},
        "blah": [1, 2, 3],
    });
    match value {
        Value::Object(tree) => tree,
        _ => unreachable!(),
    }
}

/// Records calls and replays queued outputs. When built with a config
/// tree it also answers `get -d` and `set` like snapctl does.
#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    calls: RefCell<Vec<Vec<String>>>,
    outputs: RefCell<VecDeque<CommandOutput>>,
    store: Option<RefCell<ConfigTree>>,
}

impl FakeRunner {
    pub(crate) fn with_config(config: ConfigTree) -> Self {
        Self {
            store: Some(RefCell::new(config)),
            ..Self::default()
        }
    }

    pub(crate) fn push_output(&self, output: CommandOutput) {
        self.outputs.borrow_mut().push_back(output);
    }

    pub(crate) fn push_stdout(&self, stdout: &str) {
        self.push_output(CommandOutput {
            status_code: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        });
    }

    pub(crate) fn push_failure(&self, status_code: i32, stderr: &str) {
        self.push_output(CommandOutput {
            status_code,
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        });
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    fn emulate(&self, store: &RefCell<ConfigTree>, args: &[String]) -> Vec<u8> {
        match args.first().map(String::as_str) {
            Some("get") => {
                let store = store.borrow();
                let mut result = ConfigTree::new();
                for key in args[1..].iter().filter(|arg| !arg.starts_with('-')) {
                    if let Some(value) = store.get(key) {
                        result.insert(key.clone(), value.clone());
                    }
                }
                Value::Object(result).to_string().into_bytes()
            }
            Some("set") => {
                let mut store = store.borrow_mut();
                for arg in &args[1..] {
                    if let Some(key) = arg.strip_suffix('!') {
                        unset_path(&mut store, key);
                    } else if let Some((key, raw)) = arg.split_once('=') {
                        let value = serde_json::from_str(raw).unwrap_or(Value::Null);
                        set_path(&mut store, key, value);
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

impl CtlRunner for FakeRunner {
    fn run(&self, _executable: &Path, args: &[String]) -> Result<CommandOutput, io::Error> {
        self.calls.borrow_mut().push(args.to_vec());
        if let Some(output) = self.outputs.borrow_mut().pop_front() {
            return Ok(output);
        }
        let stdout = match &self.store {
            Some(store) => self.emulate(store, args),
            None => Vec::new(),
        };
        Ok(CommandOutput {
            status_code: 0,
            stdout,
            stderr: Vec::new(),
        })
    }
}

fn set_path(tree: &mut ConfigTree, key: &str, value: Value) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(leaf) = segments.pop() else { return };
    let mut current = tree;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(ConfigTree::new()));
        if !entry.is_object() {
            *entry = Value::Object(ConfigTree::new());
        }
        let Value::Object(next) = entry else { return };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}

fn unset_path(tree: &mut ConfigTree, key: &str) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(leaf) = segments.pop() else { return };
    let mut current = tree;
    for segment in segments {
        match current.get_mut(segment) {
            Some(Value::Object(next)) => current = next,
            _ => return,
        }
    }
    current.remove(leaf);
}
