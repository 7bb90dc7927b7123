use crate::builtin;
use crate::command::{Command, CommandError};
use crate::io_adapters::{LineSource, ReaderSource};
use crate::session::Session;
use crate::value::Value;
use std::io::{self, Write};

/// Prompt shown while waiting for a command alias.
pub const COMMAND_PROMPT: &str = " # ";

/// An interactive shell that keeps asking for commands until the user quits.
///
/// Two built-in commands are added the first time the shell starts:
/// `commands` (aliases `cmds`, `show commands`) lists the registered commands
/// and `quit` (alias `exit`) ends the session.
///
/// Example
/// ```
/// use cmdline_ui::{Command, ReaderSource, SharedBuffer, Shell};
/// use std::io::{Cursor, Write};
///
/// let out = SharedBuffer::new();
/// let mut shell = Shell::named("Test Shell")
///     .with_io(ReaderSource::new(Cursor::new("greet\nBob\nquit\n")), out.clone());
///
/// shell.add_command(
///     Command::new("greet", "Say hello", |session, args| {
///         let name = args.positional(0).map(|v| v.to_string()).unwrap_or_default();
///         writeln!(session.output(), "Hello, {name}")?;
///         Ok(())
///     })
///     .add_parameter("Name:"),
/// );
///
/// shell.start()?;
/// assert!(out.contents().ends_with("Hello, Bob\n # Leaving the Test Shell\n"));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Shell {
    commands: Vec<Command>,
    session: Session,
    builtins_registered: bool,
}

impl Shell {
    /// Unnamed shell reading from stdin and writing to stdout.
    pub fn new() -> Self {
        Self::with_session(None)
    }

    /// Named shell; the name appears in the welcome and farewell messages.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_session(Some(name.into()))
    }

    fn with_session(name: Option<String>) -> Self {
        Self {
            commands: Vec::new(),
            session: Session::new(
                name,
                Box::new(ReaderSource::new(io::BufReader::new(io::stdin()))),
                Box::new(io::stdout()),
            ),
            builtins_registered: false,
        }
    }

    /// Replace the input and output streams, keeping name, globals and
    /// commands.
    pub fn with_io(
        mut self,
        input: impl LineSource + 'static,
        output: impl Write + 'static,
    ) -> Self {
        self.session.replace_io(Box::new(input), Box::new(output));
        self
    }

    /// Register a command. Earlier registrations win when aliases collide.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.session
            .record_command(command.primary_alias(), command.description());
        self.commands.push(command);
        self
    }

    /// Set a value passed as a named argument to every command invocation.
    ///
    /// A command parameter with the same name overrides it for that call.
    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.session.set_global(name, value);
        self
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.session.global(name)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Run the read-dispatch loop until a command requests a stop or the input
    /// runs out.
    ///
    /// An [`InvalidCommand`](crate::InvalidCommand) rejection, from a handler
    /// or from a prompt's conversion, has its message printed and the loop
    /// continues. Any other failure, including a conversion error such as
    /// [`ConversionError`](crate::ConversionError), ends the loop and is
    /// returned here.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if let Some(name) = self.session.name().map(str::to_string) {
            let out = self.session.output();
            writeln!(out, "You have entered the {name}")?;
            writeln!(out, "Type 'cmds' to see the list of available commands")?;
        }

        self.register_builtins();
        self.session.resume();
        tracing::debug!(commands = self.commands.len(), "shell session started");

        while self.session.is_running() {
            let Some(line) = self.session.read_line(COMMAND_PROMPT)? else {
                tracing::debug!("input closed, ending session");
                self.session.request_stop();
                break;
            };

            if let Err(err) = self.dispatch(&line) {
                tracing::error!(input = %line, error = %err, "command failed, ending session");
                self.session.request_stop();
                return Err(err);
            }
        }

        tracing::debug!("shell session stopped");
        Ok(())
    }

    fn register_builtins(&mut self) {
        if self.builtins_registered {
            return;
        }
        self.add_command(builtin::show_commands());
        self.add_command(builtin::quit());
        self.builtins_registered = true;
    }

    /// Find the first command with an alias equal to `input` and run it.
    fn dispatch(&mut self, input: &str) -> anyhow::Result<()> {
        let Some(command) = self.commands.iter_mut().find(|c| c.matches(input)) else {
            tracing::debug!(input, "no command with this alias");
            writeln!(self.session.output(), "Invalid command:  {input}")?;
            return Ok(());
        };

        tracing::debug!(command = command.primary_alias(), "dispatching");
        match command.invoke(&mut self.session) {
            Ok(()) => Ok(()),
            Err(CommandError::Invalid(rejection)) => {
                tracing::info!(command = command.primary_alias(), %rejection, "command rejected");
                writeln!(self.session.output(), "{rejection}")?;
                Ok(())
            }
            Err(CommandError::Io(err)) => Err(err.into()),
            Err(CommandError::Failed(err)) => Err(err),
        }
    }
}

impl Default for Shell {
    /// Same as [`Shell::new`].
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::InvalidCommand;
    use crate::convert::{self, ConversionError};
    use crate::io_adapters::SharedBuffer;
    use crate::prompt::Prompt;
    use crate::value::Arguments;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn scripted(shell: Shell, input: &str) -> (Shell, SharedBuffer) {
        let out = SharedBuffer::new();
        let shell = shell.with_io(ReaderSource::new(Cursor::new(input.to_string())), out.clone());
        (shell, out)
    }

    fn greet() -> Command {
        Command::new("greet", "Say hello", |session, args| {
            let name = args.positional(0).map(Value::to_string).unwrap_or_default();
            writeln!(session.output(), "Hello, {name}")?;
            Ok(())
        })
        .add_parameter("Name:")
    }

    #[test]
    fn test_greet_scenario() {
        let (mut shell, out) = scripted(Shell::named("Test Shell"), "greet\nBob\nquit\n");
        shell.add_command(greet());

        shell.start().unwrap();

        assert_eq!(
            out.contents(),
            "You have entered the Test Shell\n\
             Type 'cmds' to see the list of available commands\n \
             # Name:Hello, Bob\n \
             # Leaving the Test Shell\n"
        );
        assert!(!shell.session().is_running());
    }

    #[test]
    fn test_unknown_command_keeps_looping() {
        let (mut shell, out) = scripted(Shell::new(), "foo\nexit\n");

        shell.start().unwrap();

        assert_eq!(out.contents(), " # Invalid command:  foo\n # See YA!\n");
    }

    #[test]
    fn test_quit_reads_no_further_input() {
        let (mut shell, out) = scripted(Shell::new(), "quit\ngreet\nBob\n");
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        shell.add_command(Command::new("greet", "Say hello", move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        shell.start().unwrap();

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(out.contents(), " # See YA!\n");
    }

    #[test]
    fn test_listing_includes_builtins_in_order() {
        let (mut shell, out) = scripted(Shell::new(), "cmds\nshow commands\nquit\n");
        shell.add_command(greet());

        shell.start().unwrap();

        let listing = "greet: Say hello\n\
                       commands: Show available commands\n\
                       quit: Quit\n";
        assert_eq!(
            out.contents(),
            format!(" # {listing} # {listing} # See YA!\n")
        );
    }

    #[test]
    fn test_alias_match_is_case_sensitive() {
        let (mut shell, out) = scripted(Shell::new(), "QUIT\nquit\n");

        shell.start().unwrap();

        assert_eq!(out.contents(), " # Invalid command:  QUIT\n # See YA!\n");
    }

    #[test]
    fn test_first_registered_alias_wins() {
        let (mut shell, out) = scripted(Shell::new(), "go\nquit\n");
        shell.add_command(Command::new("go", "First", |session, _| {
            writeln!(session.output(), "first")?;
            Ok(())
        }));
        shell.add_command(
            Command::new("run", "Second", |session, _| {
                writeln!(session.output(), "second")?;
                Ok(())
            })
            .add_alias("go"),
        );

        shell.start().unwrap();

        assert_eq!(out.contents(), " # first\n # See YA!\n");
    }

    #[test]
    fn test_globals_injected_and_overridden() {
        let (mut shell, _) = scripted(Shell::new(), "show\nlocal\nquit\n");
        let seen: Rc<RefCell<Vec<Arguments>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        shell
            .set_global("user", "global")
            .set_global("limit", 10_i64)
            .add_command(
                Command::new("show", "Show", move |_, args| {
                    sink.borrow_mut().push(args);
                    Ok(())
                })
                .add_named_parameter("user", "User:"),
            );

        shell.start().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].get("user"), Some(&Value::from("local")));
        assert_eq!(seen[0].get("limit"), Some(&Value::Integer(10)));
        assert_eq!(shell.global("user"), Some(&Value::from("global")));
    }

    #[test]
    fn test_handler_can_update_globals() {
        let (mut shell, out) = scripted(Shell::new(), "login\nann\nwhoami\nquit\n");
        shell.add_command(
            Command::new("login", "Log in", |session, args| {
                let user = args.require("name")?.clone();
                session.set_global("user", user);
                Ok(())
            })
            .add_named_parameter("name", "Name: "),
        );
        shell.add_command(Command::new("whoami", "Current user", |session, args| {
            let user = args.get("user").map(Value::to_string).unwrap_or_default();
            writeln!(session.output(), "{user}")?;
            Ok(())
        }));

        shell.start().unwrap();

        assert_eq!(out.contents(), " # Name:  # ann\n # See YA!\n");
    }

    #[test]
    fn test_invalid_command_is_reported_and_loop_continues() {
        let (mut shell, out) = scripted(Shell::new(), "withdraw\n500\nquit\n");
        shell.add_command(
            Command::new("withdraw", "Withdraw", |_, args| {
                match args.positional(0).and_then(Value::as_i64) {
                    Some(amount) if amount > 100 => Err(CommandError::invalid("limit exceeded")),
                    _ => Ok(()),
                }
            })
            .add_converted_parameter("Amount: ", None, convert::integer),
        );

        shell.start().unwrap();

        assert_eq!(
            out.contents(),
            " # Amount: Invalid Command: limit exceeded\n # See YA!\n"
        );
    }

    #[test]
    fn test_conversion_rejection_keeps_looping() {
        let (mut shell, out) = scripted(Shell::new(), "acct\nbogus\nacct\nmain\nquit\n");
        shell.add_command(
            Command::new("acct", "Pick an account", |session, args| {
                let account = args.get("account").map(Value::to_string).unwrap_or_default();
                writeln!(session.output(), "using {account}")?;
                Ok(())
            })
            .add_converted_parameter("Account: ", Some("account".to_string()), |input: &str| {
                if input == "bogus" {
                    Err(InvalidCommand::with_message("no such account").into())
                } else {
                    convert::text(input)
                }
            }),
        );

        shell.start().unwrap();

        assert_eq!(
            out.contents(),
            " # Account: Invalid Command: no such account\n \
             # Account: using main\n \
             # See YA!\n"
        );
    }

    #[test]
    fn test_conversion_error_escapes_start() {
        let (mut shell, out) = scripted(Shell::new(), "when\nnot-a-date\nquit\n");
        shell.add_command(
            Command::new("when", "Pick a date", |_, _| Ok(())).add_prompt(Prompt::date()),
        );

        let err = shell.start().unwrap_err();

        let conversion = err.downcast_ref::<ConversionError>().unwrap();
        assert_eq!(conversion.input(), "not-a-date");
        assert_eq!(out.contents(), " # Date (yyyy-mm-dd):");
        assert!(!shell.session().is_running());
    }

    #[test]
    fn test_handler_failure_escapes_start() {
        let (mut shell, _) = scripted(Shell::new(), "boom\nquit\n");
        shell.add_command(Command::new("boom", "Fail", |_, _| {
            Err(anyhow::anyhow!("handler exploded").into())
        }));

        let err = shell.start().unwrap_err();

        assert_eq!(err.to_string(), "handler exploded");
    }

    #[test]
    fn test_end_of_input_stops_cleanly() {
        let (mut shell, out) = scripted(Shell::named("Quiet"), "");

        shell.start().unwrap();

        assert!(out.contents().ends_with(" # "));
        assert!(!shell.session().is_running());
    }

    #[test]
    fn test_restart_does_not_duplicate_builtins() {
        let out = SharedBuffer::new();
        let mut shell = Shell::new().with_io(
            ReaderSource::new(Cursor::new("quit\ncmds\nquit\n")),
            out.clone(),
        );

        shell.start().unwrap();
        shell.start().unwrap();

        assert_eq!(shell.commands().len(), 2);
        assert_eq!(shell.session().commands().len(), 2);
        assert_eq!(
            out.contents(),
            " # See YA!\n # commands: Show available commands\nquit: Quit\n # See YA!\n"
        );
    }
}
