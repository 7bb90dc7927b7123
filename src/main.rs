use argh::FromArgs;
use chrono::{NaiveDate, TimeDelta};
use cmdline_ui::{
    Arguments, Command, CommandError, EditorSource, Prompt, PromptMessage, ReaderSource, Shell,
    Value,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::process::ExitCode;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Small time-tracking shell built with cmdline_ui.
struct Options {
    #[argh(option, default = "String::from(\"Time Tracker\")")]
    /// name shown in the welcome and farewell messages.
    name: String,

    #[argh(switch)]
    /// read commands from stdin line by line instead of the line editor.
    plain: bool,

    #[argh(switch, short = 'v')]
    /// log debug events to stderr.
    verbose: bool,
}

struct Entry {
    project: String,
    day: NaiveDate,
    spent: TimeDelta,
    note: String,
}

type Log = Rc<RefCell<Vec<Entry>>>;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cmdline_ui=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cmdline_ui=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn text(args: &Arguments, name: &str) -> String {
    args.get(name).map(Value::to_string).unwrap_or_default()
}

fn log_command(log: Log) -> Command {
    Command::new("log", "Record time spent on a project", move |session, args| {
        let project = args.positional(0).map(Value::to_string).unwrap_or_default();
        if project.trim().is_empty() {
            return Err(CommandError::invalid("project name is required"));
        }
        let day = args.require("day")?.as_date();
        let spent = args.require("spent")?.as_duration();
        let (Some(day), Some(spent)) = (day, spent) else {
            return Err(CommandError::invalid("unexpected parameter types"));
        };

        let entry = Entry {
            project,
            day,
            spent,
            note: text(&args, "note"),
        };
        writeln!(
            session.output(),
            "{} logged {} on {} for {}",
            text(&args, "user"),
            entry.spent,
            entry.day,
            entry.project
        )?;
        log.borrow_mut().push(entry);
        Ok(())
    })
    .add_alias("l")
    .add_parameter("Project:")
    .add_prompt(Prompt::date().named("day"))
    .add_prompt(Prompt::time_delta().named("spent"))
    .add_named_parameter(
        "note",
        PromptMessage::dynamic(|args| {
            let project = args.positional(0).map(Value::to_string).unwrap_or_default();
            format!("Note for {project}:")
        }),
    )
}

fn report_command(log: Log) -> Command {
    Command::new("report", "Show time spent per project", move |session, _| {
        let mut totals: BTreeMap<&str, TimeDelta> = BTreeMap::new();
        let entries = log.borrow();
        for entry in entries.iter() {
            let total = totals.entry(entry.project.as_str()).or_insert_with(TimeDelta::zero);
            *total = *total + entry.spent;
        }
        if totals.is_empty() {
            writeln!(session.output(), "Nothing logged yet")?;
        }
        for (project, total) in totals {
            writeln!(session.output(), "{project}: {total}")?;
        }
        Ok(())
    })
    .add_alias("r")
}

fn entries_command(log: Log) -> Command {
    Command::new("entries", "List logged entries", move |session, _| {
        for entry in log.borrow().iter() {
            writeln!(
                session.output(),
                "{} {} {} {}",
                entry.day, entry.project, entry.spent, entry.note
            )?;
        }
        Ok(())
    })
}

fn undo_command(log: Log) -> Command {
    Command::new("undo", "Remove the last entry", move |session, _| {
        let Some(entry) = log.borrow_mut().pop() else {
            return Err(CommandError::invalid("nothing to undo"));
        };
        writeln!(session.output(), "Removed {} on {}", entry.project, entry.day)?;
        Ok(())
    })
}

fn user_command() -> Command {
    Command::new("user", "Change the current user", |session, args| {
        let name = args.require("name")?.clone();
        writeln!(session.output(), "Now logging as {name}")?;
        session.set_global("user", name);
        Ok(())
    })
    .add_alias("whoami")
    .add_named_parameter(
        "name",
        PromptMessage::dynamic(|args| format!("User name (currently {}):", text(args, "user"))),
    )
}

fn run(options: Options) -> anyhow::Result<()> {
    let shell = Shell::named(options.name);
    let mut shell = if options.plain {
        shell.with_io(ReaderSource::new(io::stdin().lock()), io::stdout())
    } else {
        let editor = EditorSource::new()
            .map_err(|err| anyhow::anyhow!("cannot start the line editor: {err}"))?;
        shell.with_io(editor, io::stdout())
    };

    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let user = std::env::var("USER").unwrap_or_else(|_| "someone".to_string());

    shell
        .set_global("user", user)
        .add_command(log_command(log.clone()))
        .add_command(report_command(log.clone()))
        .add_command(entries_command(log.clone()))
        .add_command(undo_command(log))
        .add_command(user_command());

    shell.start()
}

fn main() -> ExitCode {
    let options: Options = argh::from_env();
    init_tracing(options.verbose);

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
