//! Console implementation of [`PresentationPort`].
//!
//! Keeps the stack of pushed screens and describes every effect as a line
//! of text. Effects the terminal can't perform (browser, player, share
//! sheet, dialer) are printed so the user can act on them.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use reqwest::Url;

use crate::core::engine::NavigationEngine;
use crate::core::port::{PresentationPort, ShareItem};
use crate::core::screen::Screen;

pub struct ConsolePort<W> {
    out: Mutex<W>,
    stack: Mutex<Vec<Arc<Screen>>>,
    engine: Mutex<Option<Arc<NavigationEngine>>>,
    allow_calls: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<W: Write + Send> ConsolePort<W> {
    pub fn new(out: W, allow_calls: bool) -> Self {
        Self {
            out: Mutex::new(out),
            stack: Mutex::new(Vec::new()),
            engine: Mutex::new(None),
            allow_calls,
        }
    }

    /// Screen on top of the stack.
    pub fn current(&self) -> Option<Arc<Screen>> {
        lock(&self.stack).last().cloned()
    }

    pub fn depth(&self) -> usize {
        lock(&self.stack).len()
    }

    /// Engine handed over with the most recent push.
    pub fn engine(&self) -> Option<Arc<NavigationEngine>> {
        lock(&self.engine).clone()
    }

    /// Pops the top screen. The first screen is never popped.
    pub fn pop(&self) -> bool {
        let mut stack = lock(&self.stack);
        if stack.len() > 1 {
            stack.pop();
            true
        } else {
            false
        }
    }

    pub fn say(&self, args: fmt::Arguments<'_>) {
        let mut out = lock(&self.out);
        if let Err(e) = out.write_fmt(args).and_then(|_| out.write_all(b"\n")) {
            warn!("Console write failed: {}", e);
        }
        let _ = out.flush();
    }

    /// Prints the current screen as a numbered list.
    ///
    /// `>` marks rows that lead somewhere, `-` marks rows that do nothing.
    pub fn render_current(&self) {
        let Some(screen) = self.current() else {
            self.say(format_args!("(no screen)"));
            return;
        };
        self.say(format_args!("\n== {} ==", screen.title));
        for (i, row) in screen.rows.iter().enumerate() {
            let marker = if row.is_inert() {
                '-'
            } else if row.presents_new_screen() {
                '>'
            } else {
                ' '
            };
            self.say(format_args!("{:>3}. {} {}", i + 1, marker, row.title));
        }
        if let Some(button) = &screen.primary_action {
            self.say(format_args!("  [a] {}", button.title));
        }
        self.say(format_args!("(number: select, a: button, b: back, r: redraw, q: quit)"));
    }
}

impl<W: Write + Send> PresentationPort for ConsolePort<W> {
    fn push_screen(&self, screen: Arc<Screen>, engine: Arc<NavigationEngine>) {
        debug!("Console push: {:?}", screen.id);
        lock(&self.stack).push(screen);
        *lock(&self.engine) = Some(engine);
    }

    fn present_alert(&self, title: &str, message: &str) {
        self.say(format_args!("[alert] {title}: {message}"));
    }

    fn present_external_browser(&self, url: &Url) {
        self.say(format_args!("[open] {url}"));
    }

    fn present_share_sheet(&self, items: &[ShareItem]) {
        let joined = items
            .iter()
            .map(ShareItem::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        self.say(format_args!("[share] {joined}"));
    }

    fn present_media_player(&self, url: &Url) {
        self.say(format_args!("[play] {url}"));
    }

    fn push_preview(&self, local_path: &Path, name: Option<&str>) {
        let name = name.unwrap_or("file");
        self.say(format_args!("[preview] {name}: {}", local_path.display()));
    }

    fn can_open_url(&self, url: &Url) -> bool {
        url.scheme() == "tel" && self.allow_calls
    }

    fn place_call(&self, phone: &str) {
        self.say(format_args!("[call] {phone}"));
    }

    fn report_preview_unavailable(&self, reason: &str) {
        self.say(format_args!("[preview unavailable] {reason}"));
    }
}

#[cfg(test)]
impl ConsolePort<Vec<u8>> {
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&lock(&self.out)).into_owned()
    }
}
