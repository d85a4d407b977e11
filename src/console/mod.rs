//! # Console Adapter
//!
//! Line-oriented host for the engine. Reads one command per line from stdin,
//! hands selections to the engine, and prints what the engine asked for.
//!
//! This is the only module that talks to the terminal. Preview retrievals
//! finish in the background and print their result whenever they land.

mod event;
mod port;

pub use event::{ConsoleEvent, parse_line};
pub use port::ConsolePort;

use std::io::{self, Write};
use std::sync::Arc;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::action::Action;
use crate::core::engine::Dispatch;
use crate::core::port::PresentationPort;

/// Whether the input loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<W> {
    port: Arc<ConsolePort<W>>,
}

impl<W: Write + Send + 'static> Console<W> {
    /// `port` must already show a screen (see `Session::present`).
    pub fn new(port: Arc<ConsolePort<W>>) -> Self {
        Self { port }
    }

    pub fn handle(&self, event: ConsoleEvent) -> Flow {
        match event {
            ConsoleEvent::Quit => return Flow::Quit,
            ConsoleEvent::Redraw => self.port.render_current(),
            ConsoleEvent::Back => {
                if self.port.pop() {
                    self.port.render_current();
                } else {
                    self.port.say(format_args!("Already at the first screen"));
                }
            }
            ConsoleEvent::Select(index) => {
                let row = self.port.current().and_then(|s| s.row(index).cloned());
                match row {
                    Some(row) if row.is_inert() => {}
                    Some(row) => self.run_action(row.action.as_ref()),
                    None => self.port.say(format_args!("No row {}", index + 1)),
                }
            }
            ConsoleEvent::PrimaryAction => {
                let button = self.port.current().and_then(|s| s.primary_action.clone());
                match button {
                    Some(button) => self.run_action(button.action.as_ref()),
                    None => self.port.say(format_args!("This screen has no button")),
                }
            }
            ConsoleEvent::Unknown(input) => {
                self.port.say(format_args!("Unknown command: {input}"));
            }
        }
        Flow::Continue
    }

    fn run_action(&self, action: Option<&Action>) {
        let Some(engine) = self.port.engine() else {
            error!("Console has no engine; was a screen presented?");
            return;
        };
        let port: Arc<dyn PresentationPort> = self.port.clone();
        let depth = self.port.depth();

        match engine.execute(action, &port) {
            Ok(Dispatch::Retrieving(_)) => self.port.say(format_args!("Retrieving file...")),
            Ok(_) if self.port.depth() > depth => self.port.render_current(),
            Ok(_) => {}
            Err(e) => self.port.say(format_args!("Error: {e}")),
        }
    }
}

/// Drives the console until the user quits or stdin closes.
pub async fn run<W: Write + Send + 'static>(port: Arc<ConsolePort<W>>) -> io::Result<()> {
    let console = Console::new(port);
    console.port.render_current();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(event) = parse_line(&line) else {
            continue;
        };
        if console.handle(event) == Flow::Quit {
            break;
        }
    }

    info!("Console closed");
    Ok(())
}
