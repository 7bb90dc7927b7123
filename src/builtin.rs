use crate::command::Command;
use std::io::Write;

/// Lists every registered command, built-ins included, in registration order.
pub(crate) fn show_commands() -> Command {
    Command::new("commands", "Show available commands", |session, _| {
        session.write_command_listing()?;
        Ok(())
    })
    .add_alias("cmds")
    .add_alias("show commands")
}

/// Prints a farewell and ends the session.
pub(crate) fn quit() -> Command {
    Command::new("quit", "Quit", |session, _| {
        let farewell = match session.name() {
            Some(name) => format!("Leaving the {name}"),
            None => "See YA!".to_string(),
        };
        writeln!(session.output(), "{farewell}")?;
        session.request_stop();
        Ok(())
    })
    .add_alias("exit")
}
