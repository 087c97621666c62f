//! Where the player's text comes from and goes to.
//!
//! The parser and handlers only ever talk to a [`Console`]. The binary uses a
//! [`TerminalConsole`]; tests and embedders use a [`BufferConsole`], which
//! records output and answers prompts from a queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

use log::warn;
use textwrap::{fill, termwidth};

use crate::repl::input::{InputEvent, InputManager};
use crate::style::GameStyle;

pub trait Console {
    /// Append text to the current output line.
    fn write(&mut self, text: &str);

    fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// A message explaining why a command failed.
    fn error(&mut self, text: &str) {
        self.writeln(text);
    }

    /// Prompt for and read one line of input.
    fn read_line(&mut self, prompt: &str) -> InputEvent;
}

/// Console on stdin/stdout, wrapping output to the terminal width.
pub struct TerminalConsole {
    input: InputManager,
    pending: String,
}

impl TerminalConsole {
    /// `vocabulary` feeds tab completion.
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self {
            input: InputManager::new(vocabulary),
            pending: String::new(),
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        print!("{}", self.pending);
        self.pending.clear();
        if let Err(err) = io::stdout().flush() {
            warn!("failed to flush stdout: {err}");
        }
    }
}

impl Console for TerminalConsole {
    fn write(&mut self, text: &str) {
        let mut rest = text;
        while let Some(newline) = rest.find('\n') {
            self.pending.push_str(&rest[..newline]);
            println!("{}", fill(&self.pending, termwidth()));
            self.pending.clear();
            rest = &rest[newline + 1..];
        }
        self.pending.push_str(rest);
    }

    fn error(&mut self, text: &str) {
        self.flush_pending();
        println!("{}", fill(text, termwidth()).error_style());
    }

    fn read_line(&mut self, prompt: &str) -> InputEvent {
        self.flush_pending();
        match self.input.read_line(prompt) {
            Ok(event) => event,
            Err(err) => {
                warn!("failed to read input: {err}");
                InputEvent::Eof
            },
        }
    }
}

#[derive(Debug, Default)]
struct Buffer {
    output: String,
    replies: VecDeque<String>,
}

/// In-memory console. Clones share the same buffer, so a test can keep one
/// handle while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    inner: Rc<RefCell<Buffer>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for future prompts, in order.
    pub fn queue_input(&self, replies: &[&str]) {
        let mut inner = self.inner.borrow_mut();
        inner.replies.extend(replies.iter().map(|reply| (*reply).to_string()));
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.inner.borrow().output.clone()
    }

    /// Everything written so far, clearing the record.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.inner.borrow_mut().output)
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) {
        self.inner.borrow_mut().output.push_str(text);
    }

    /// Answers from the queue; an empty queue reads as end of input.
    fn read_line(&mut self, _prompt: &str) -> InputEvent {
        match self.inner.borrow_mut().replies.pop_front() {
            Some(reply) => InputEvent::Line(reply),
            None => InputEvent::Eof,
        }
    }
}
