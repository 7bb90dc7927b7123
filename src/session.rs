use crate::io_adapters::LineSource;
use crate::value::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Name and description of a registered command, as shown by the listing
/// built-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub alias: String,
    pub description: String,
}

/// Mutable state of one running shell, handed to every command handler.
///
/// The session holds:
/// - the input and output streams used for prompts and messages,
/// - the global values injected as named arguments into every invocation,
/// - the running flag checked by the dispatch loop,
/// - a catalog of the registered commands.
pub struct Session {
    name: Option<String>,
    globals: BTreeMap<String, Value>,
    running: bool,
    catalog: Vec<CommandEntry>,
    input: Box<dyn LineSource>,
    output: Box<dyn Write>,
}

impl Session {
    pub fn new(name: Option<String>, input: Box<dyn LineSource>, output: Box<dyn Write>) -> Self {
        Self {
            name,
            globals: BTreeMap::new(),
            running: false,
            catalog: Vec::new(),
            input,
            output,
        }
    }

    pub(crate) fn replace_io(&mut self, input: Box<dyn LineSource>, output: Box<dyn Write>) {
        self.input = input;
        self.output = output;
    }

    /// Name shown in the welcome and farewell messages, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Stream handlers should write their messages to.
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Show `prompt` and read one line of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.input.read_line(prompt, self.output.as_mut())
    }

    pub fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Set or override a global value.
    ///
    /// A prompt with the same name still takes precedence within a single
    /// command invocation.
    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(name.into(), value.into());
    }

    pub fn remove_global(&mut self, name: &str) -> Option<Value> {
        self.globals.remove(name)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the dispatch loop to finish after the current command returns.
    pub fn request_stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn resume(&mut self) {
        self.running = true;
    }

    /// Registered commands in registration order.
    pub fn commands(&self) -> &[CommandEntry] {
        &self.catalog
    }

    pub(crate) fn record_command(&mut self, alias: &str, description: &str) {
        self.catalog.push(CommandEntry {
            alias: alias.to_string(),
            description: description.to_string(),
        });
    }

    /// Write one `"<alias>: <description>"` line per registered command.
    pub fn write_command_listing(&mut self) -> io::Result<()> {
        for entry in &self.catalog {
            writeln!(self.output, "{}: {}", entry.alias, entry.description)?;
        }
        Ok(())
    }
}
