use crate::convert::{self, Conversion};
use crate::session::Session;
use crate::value::{Arguments, Value};
use std::fmt;
use std::io;

/// Text shown to the user before reading a parameter value.
pub enum PromptMessage {
    /// Displayed verbatim.
    Fixed(String),
    /// Computed on every use from the arguments collected so far in the
    /// current invocation, globals included.
    Dynamic(Box<dyn Fn(&Arguments) -> String>),
}

impl PromptMessage {
    pub fn dynamic(f: impl Fn(&Arguments) -> String + 'static) -> Self {
        PromptMessage::Dynamic(Box::new(f))
    }

    pub fn render(&self, args: &Arguments) -> String {
        match self {
            PromptMessage::Fixed(text) => text.clone(),
            PromptMessage::Dynamic(f) => f(args),
        }
    }
}

impl fmt::Debug for PromptMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptMessage::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            PromptMessage::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for PromptMessage {
    fn from(text: &str) -> Self {
        PromptMessage::Fixed(text.to_string())
    }
}

impl From<String> for PromptMessage {
    fn from(text: String) -> Self {
        PromptMessage::Fixed(text)
    }
}

/// A request for one parameter value: message, optional parameter name and
/// the conversion applied to the raw line.
pub struct Prompt {
    message: PromptMessage,
    name: Option<String>,
    convert: Conversion,
}

impl Prompt {
    /// Unnamed prompt returning the entered text unchanged.
    pub fn new(message: impl Into<PromptMessage>) -> Self {
        Self {
            message: message.into(),
            name: None,
            convert: Box::new(convert::text),
        }
    }

    /// Prompt for a calendar date entered as `yyyy-mm-dd`.
    pub fn date() -> Self {
        Self::new("Date (yyyy-mm-dd):").converted_with(convert::date)
    }

    /// Prompt for a time delta entered as `#w #d hh:mm:ss.micro`.
    pub fn time_delta() -> Self {
        Self::new("Time (#w #d hh:mm:ss.micro):").converted_with(convert::time_delta)
    }

    /// Bind the value to a named argument instead of a positional one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn converted_with(
        mut self,
        convert: impl Fn(&str) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        self.convert = Box::new(convert);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn message(&self) -> &PromptMessage {
        &self.message
    }

    /// Show the message, read one line and convert it.
    ///
    /// A failing conversion is returned as is; there is no retry. Running out
    /// of input while waiting is reported as [`io::ErrorKind::UnexpectedEof`].
    pub fn prompt(&self, session: &mut Session, collected: &Arguments) -> anyhow::Result<Value> {
        let text = self.message.render(collected);
        let line = session.read_line(&text)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input closed while waiting for '{}'", text.trim()),
            )
        })?;
        (self.convert)(&line)
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("message", &self.message)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionError;
    use crate::io_adapters::{ReaderSource, SharedBuffer};
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn session(input: &str) -> (Session, SharedBuffer) {
        let out = SharedBuffer::new();
        let session = Session::new(
            None,
            Box::new(ReaderSource::new(Cursor::new(input.to_string()))),
            Box::new(out.clone()),
        );
        (session, out)
    }

    #[test]
    fn test_fixed_message_is_shown_verbatim() {
        let (mut session, out) = session("Bob\n");
        let prompt = Prompt::new("Name: ");

        let value = prompt.prompt(&mut session, &Arguments::new()).unwrap();

        assert_eq!(value, Value::from("Bob"));
        assert_eq!(out.contents(), "Name: ");
    }

    #[test]
    fn test_dynamic_message_sees_collected_arguments() {
        let (mut session, out) = session("7\n7\n");
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let prompt = Prompt::new(PromptMessage::dynamic(move |args| {
            counter.set(counter.get() + 1);
            format!(
                "Amount for {} [{}]: ",
                args.positional(0).map(Value::to_string).unwrap_or_default(),
                args.get("currency").map(Value::to_string).unwrap_or_default()
            )
        }))
        .converted_with(convert::integer);

        let mut args = Arguments::new();
        args.push(Value::from("rent"));
        args.insert("currency", Value::from("EUR"));

        assert_eq!(prompt.prompt(&mut session, &args).unwrap(), Value::Integer(7));
        args.insert("currency", Value::from("USD"));
        assert_eq!(prompt.prompt(&mut session, &args).unwrap(), Value::Integer(7));

        assert_eq!(calls.get(), 2);
        assert_eq!(
            out.contents(),
            "Amount for rent [EUR]: Amount for rent [USD]: "
        );
    }

    #[test]
    fn test_conversion_failure_is_returned() {
        let (mut session, _) = session("not-a-date\n");
        let err = Prompt::date()
            .prompt(&mut session, &Arguments::new())
            .unwrap_err();
        assert!(err.downcast_ref::<ConversionError>().is_some());
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let (mut session, _) = session("");
        let err = Prompt::new("Name:")
            .prompt(&mut session, &Arguments::new())
            .unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_named_builder() {
        let prompt = Prompt::time_delta().named("spent");
        assert_eq!(prompt.name(), Some("spent"));
        assert!(matches!(
            prompt.message(),
            PromptMessage::Fixed(text) if text.starts_with("Time")
        ));
    }
}
