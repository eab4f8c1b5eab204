use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use quick_xml::escape::escape;

/// Receives an HTML snippet describing each webhook outcome.
pub trait DisplaySink: Send + Sync {
    fn show(&self, html: &str);
}

/// Wrap escaped text in a `<div>`.
pub fn div(text: &str) -> String {
    format!("<div>{}</div>", escape(text))
}

/// Logs every snippet; used when nothing renders the display.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisplaySink;

impl DisplaySink for TracingDisplaySink {
    fn show(&self, html: &str) {
        tracing::info!(html, "display");
    }
}

/// Keeps the most recent snippets for `GET /display`.
#[derive(Debug)]
pub struct DisplayLog {
    capacity: usize,
    entries: Mutex<VecDeque<String>>,
}

impl DisplayLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic mid-push can't leave the deque inconsistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snippets oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn render_page(&self) -> String {
        let mut page = String::from(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Usage readings</title></head><body>",
        );
        for entry in self.lock().iter() {
            page.push_str(entry);
        }
        page.push_str("</body></html>");
        page
    }
}

impl DisplaySink for DisplayLog {
    fn show(&self, html: &str) {
        tracing::info!(html, "display");
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(html.to_string());
    }
}
