use crate::convert;
use crate::prompt::{Prompt, PromptMessage};
use crate::session::Session;
use crate::value::{Arguments, Value};
use std::fmt;
use thiserror::Error;

/// Rejection a handler or conversion can return to refuse an invocation
/// without ending the session.
///
/// The dispatch loop prints the message and reads the next command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid Command{}", detail(.message))]
pub struct InvalidCommand {
    message: Option<String>,
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl InvalidCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Failure of a single command invocation.
///
/// Only [`CommandError::Invalid`] is recoverable; the shell stops on every
/// other variant and returns it to the caller of
/// [`Shell::start`](crate::Shell::start).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Invalid(#[from] InvalidCommand),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Failed(anyhow::Error),
}

/// An `anyhow` error carrying an [`InvalidCommand`] stays recoverable, so a
/// conversion or handler can reject input through `?` without ending the
/// session.
impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<InvalidCommand>() {
            Ok(rejection) => Self::Invalid(rejection),
            Err(err) => Self::Failed(err),
        }
    }
}

impl CommandError {
    /// Shorthand for rejecting an invocation with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(InvalidCommand::with_message(message))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// Result returned by command handlers.
pub type CommandResult = Result<(), CommandError>;

/// Function run once all of a command's parameters are collected.
pub type Handler = Box<dyn FnMut(&mut Session, Arguments) -> CommandResult>;

/// A command the user can invoke from the shell by any of its aliases.
///
/// The first alias is the canonical one shown in the command listing.
/// Parameters are collected in the order they were added.
///
/// Example
/// ```
/// use cmdline_ui::{Command, Prompt, convert};
/// use std::io::Write;
///
/// let add = Command::new("add", "Add an expense", |session, args| {
///     let amount = args.positional(0).cloned();
///     writeln!(session.output(), "{:?}", amount)?;
///     Ok(())
/// })
/// .add_alias("a")
/// .add_prompt(Prompt::new("Amount:").converted_with(convert::float))
/// .add_named_parameter("note", "Note:");
///
/// assert_eq!(add.aliases(), ["add", "a"]);
/// assert_eq!(add.parameters().len(), 2);
/// ```
pub struct Command {
    aliases: Vec<String>,
    description: String,
    handler: Handler,
    params: Vec<Prompt>,
}

impl Command {
    pub fn new(
        default_alias: impl Into<String>,
        description: impl Into<String>,
        handler: impl FnMut(&mut Session, Arguments) -> CommandResult + 'static,
    ) -> Self {
        Self {
            aliases: vec![default_alias.into()],
            description: description.into(),
            handler: Box::new(handler),
            params: Vec::new(),
        }
    }

    /// Add another alias. Duplicates are not checked.
    pub fn add_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add an unnamed parameter whose value is passed positionally as typed.
    pub fn add_parameter(self, message: impl Into<PromptMessage>) -> Self {
        self.add_converted_parameter(message, None, convert::text)
    }

    /// Add a parameter passed under `name`, as typed.
    pub fn add_named_parameter(
        self,
        name: impl Into<String>,
        message: impl Into<PromptMessage>,
    ) -> Self {
        self.add_converted_parameter(message, Some(name.into()), convert::text)
    }

    /// Add a parameter with an explicit name (or none) and conversion.
    pub fn add_converted_parameter(
        self,
        message: impl Into<PromptMessage>,
        name: Option<String>,
        convert: impl Fn(&str) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        let mut prompt = Prompt::new(message).converted_with(convert);
        if let Some(name) = name {
            prompt = prompt.named(name);
        }
        self.add_prompt(prompt)
    }

    /// Add a ready-made prompt, used as is.
    pub fn add_prompt(mut self, prompt: Prompt) -> Self {
        self.params.push(prompt);
        self
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn primary_alias(&self) -> &str {
        &self.aliases[0]
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Prompt] {
        &self.params
    }

    /// Exact, case-sensitive alias match.
    pub fn matches(&self, input: &str) -> bool {
        self.aliases.iter().any(|alias| alias == input)
    }

    /// Collect every parameter and run the handler once.
    ///
    /// Named arguments start as a copy of the session globals; a named prompt
    /// overwrites a global of the same name. Unnamed prompt values are passed
    /// positionally in declaration order.
    pub fn invoke(&mut self, session: &mut Session) -> CommandResult {
        let mut args = Arguments::with_named(session.globals().clone());

        for prompt in &self.params {
            let value = prompt.prompt(session, &args)?;
            tracing::trace!(
                command = %self.aliases[0],
                param = ?prompt.name(),
                "collected parameter"
            );
            match prompt.name() {
                Some(name) => {
                    args.insert(name, value);
                }
                None => args.push(value),
            }
        }

        (self.handler)(session, args)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
