use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::io::{BufRead, Result as IoResult, Write};
use std::rc::Rc;

/// Source of input lines for a shell session.
///
/// Each call consumes exactly one line. `Ok(None)` signals that no more input
/// will arrive (end of file, or an interrupt at a terminal).
pub trait LineSource {
    /// Show `prompt` and read one line without its terminator.
    ///
    /// Implementations that render the prompt themselves may ignore `output`.
    fn read_line(&mut self, prompt: &str, output: &mut dyn Write) -> IoResult<Option<String>>;
}

/// Line source over any buffered reader, e.g. locked stdin or an in-memory
/// script.
///
/// The prompt is written to the session output before each read.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, prompt: &str, output: &mut dyn Write) -> IoResult<Option<String>> {
        output.write_all(prompt.as_bytes())?;
        output.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Terminal line source backed by rustyline.
///
/// rustyline draws the prompt itself, so the session output is not used for
/// it. Nothing is added to the editor history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str, _output: &mut dyn Write) -> IoResult<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(std::io::Error::other(err.to_string())),
        }
    }
}

/// Memory-backed writer whose clones share one buffer.
///
/// Hand one clone to a shell and keep another to read what was written.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
