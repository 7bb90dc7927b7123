//! Building blocks for interactive, prompt-driven command shells.
//!
//! A host program registers [`Command`]s on a [`Shell`]. Each command has one
//! or more aliases, a handler and an ordered list of [`Prompt`]s. When the user
//! types an alias at the shell prompt, the command asks for each of its
//! parameters in turn, converts the answers with the prompt's conversion
//! function and calls the handler with the collected [`Arguments`].
//!
//! Shell-wide globals are passed to every handler as named arguments unless a
//! prompt of the same name overrides them. Handlers receive the running
//! [`Session`], which they use for output, for updating globals and for
//! ending the session.
//!
//! The public module [`convert`] holds ready-made conversion functions,
//! including dates and time deltas.

mod builtin;
pub mod command;
pub mod convert;
mod io_adapters;
mod prompt;
mod session;
mod shell;
mod value;

pub use command::{Command, CommandError, CommandResult, Handler, InvalidCommand};
pub use convert::ConversionError;
pub use io_adapters::{EditorSource, LineSource, ReaderSource, SharedBuffer};
pub use prompt::{Prompt, PromptMessage};
pub use session::{CommandEntry, Session};
pub use shell::{COMMAND_PROMPT, Shell};
pub use value::{Arguments, Value};
