//! Terminal implementations of the UI ports.

use crate::{
    pipeline::Surfaces,
    plugin::{MessageType, Plugin},
    ports::{
        CardElement, CounterSurface, DisplaySurface, ElementLookup, MessageDialog,
        ProgressIndicator, SearchSurface,
    },
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::Write as _,
    fs,
    io::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

const LOG_CAPACITY: usize = 200;
const MIN_NAME_WIDTH: usize = 4;
const MAX_NAME_WIDTH: usize = 48;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Error => "ERROR",
    }
}

/// What the user saw during this run: bounded in memory, mirrored to a file.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: RefCell<Vec<LogEntry>>,
    path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            path,
        }
    }

    pub fn info(&self, message: String) {
        self.push(LogLevel::Info, message);
    }

    pub fn error(&self, message: String) {
        self.push(LogLevel::Error, message);
    }

    fn push(&self, level: LogLevel, message: String) {
        if let Some(path) = &self.path {
            if let Err(err) = append_log_file(path, level, &message) {
                tracing::warn!(path = %path.display(), "session log write failed: {err}");
            }
        }

        let mut entries = self.entries.borrow_mut();
        entries.push(LogEntry { level, message });
        if entries.len() > LOG_CAPACITY {
            let overflow = entries.len() - LOG_CAPACITY;
            entries.drain(0..overflow);
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.entries
            .borrow()
            .iter()
            .map(|entry| format!("[{}] {}", log_level_label(entry.level), entry.message))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

fn append_log_file(path: &Path, level: LogLevel, message: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "[{label}] {message}")
}

pub struct TerminalProgress {
    open: Cell<bool>,
    log: Rc<SessionLog>,
}

impl TerminalProgress {
    pub fn new(log: Rc<SessionLog>) -> Self {
        Self {
            open: Cell::new(false),
            log,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}

impl ProgressIndicator for TerminalProgress {
    fn show(&self, message: &str) {
        self.open.set(true);
        eprintln!("{message}");
        self.log.info(message.to_string());
    }

    fn close(&self) {
        self.open.set(false);
    }
}

pub struct TerminalDialog {
    log: Rc<SessionLog>,
}

impl TerminalDialog {
    pub fn new(log: Rc<SessionLog>) -> Self {
        Self { log }
    }
}

impl MessageDialog for TerminalDialog {
    fn show(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
        self.log.error(format!("{title}: {message}"));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageBadge {
    pub notes: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl MessageBadge {
    fn for_plugin(plugin: &Plugin) -> Self {
        let mut badge = Self::default();
        for message in &plugin.messages {
            match message.kind {
                MessageType::Say => badge.notes += 1,
                MessageType::Warn => badge.warnings += 1,
                MessageType::Error => badge.errors += 1,
            }
        }
        badge
    }

    fn label(self) -> String {
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(format!("{}E", self.errors));
        }
        if self.warnings > 0 {
            parts.push(format!("{}W", self.warnings));
        }
        if self.notes > 0 {
            parts.push(format!("{}N", self.notes));
        }
        parts.join(" ")
    }
}

/// A plugin list printed as a table. Cards only show message badges once
/// their live element has been refreshed.
#[derive(Debug, Default)]
pub struct TerminalList {
    rows: RefCell<Vec<Plugin>>,
    badges: RefCell<HashMap<String, MessageBadge>>,
    name_width: Cell<usize>,
}

impl TerminalList {
    pub fn new() -> Self {
        Self {
            name_width: Cell::new(MIN_NAME_WIDTH),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.borrow().iter().map(|plugin| plugin.name.clone()).collect()
    }

    pub fn name_width(&self) -> usize {
        self.name_width.get()
    }

    pub fn badge(&self, name: &str) -> Option<MessageBadge> {
        self.badges.borrow().get(name).copied()
    }

    fn refresh_badge(&self, name: &str) {
        let badge = self
            .rows
            .borrow()
            .iter()
            .find(|plugin| plugin.name == name)
            .map(MessageBadge::for_plugin);
        let mut badges = self.badges.borrow_mut();
        match badge {
            Some(badge) => {
                badges.insert(name.to_string(), badge);
            }
            None => {
                badges.remove(name);
            }
        }
    }

    pub fn render(&self) -> String {
        let width = self.name_width();
        let mut out = String::new();
        for plugin in self.rows.borrow().iter() {
            let mut flags = String::new();
            flags.push(if plugin.is_active { '*' } else { ' ' });
            flags.push(if plugin.is_dirty { 'D' } else { ' ' });
            flags.push(if plugin.is_empty { 'E' } else { ' ' });
            let badge = self
                .badge(&plugin.name)
                .map(MessageBadge::label)
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{flags} {:<width$}  {:<10}  {:<8}  {badge}",
                truncate(&plugin.name, width),
                plugin.version.as_deref().unwrap_or("-"),
                plugin.crc_label().unwrap_or_else(|| "-".to_string()),
            );
        }
        out
    }
}

impl DisplaySurface for TerminalList {
    fn set_data(&self, plugins: &[Plugin]) {
        *self.rows.borrow_mut() = plugins.to_vec();
        self.badges
            .borrow_mut()
            .retain(|name, _| plugins.iter().any(|plugin| &plugin.name == name));
    }

    fn update_size(&self) {
        let longest = self
            .rows
            .borrow()
            .iter()
            .map(|plugin| plugin.name.chars().count())
            .max()
            .unwrap_or(0);
        self.name_width
            .set(longest.clamp(MIN_NAME_WIDTH, MAX_NAME_WIDTH));
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

/// Live cards exist only for the first `page_size` rows of the card list.
pub struct TerminalCards {
    list: Rc<TerminalList>,
    page_size: usize,
}

impl TerminalCards {
    pub fn new(list: Rc<TerminalList>, page_size: usize) -> Self {
        Self { list, page_size }
    }
}

impl ElementLookup for TerminalCards {
    fn find(&self, name: &str) -> Option<Rc<dyn CardElement>> {
        let live = self
            .list
            .rows
            .borrow()
            .iter()
            .take(self.page_size)
            .any(|plugin| plugin.name == name);
        if !live {
            return None;
        }
        Some(Rc::new(TerminalCard {
            name: name.to_string(),
            list: self.list.clone(),
        }))
    }
}

struct TerminalCard {
    name: String,
    list: Rc<TerminalList>,
}

impl CardElement for TerminalCard {
    fn on_messages_change(&self) {
        self.list.refresh_badge(&self.name);
    }
}

pub struct TerminalSearch {
    query: String,
    list: Rc<TerminalList>,
    matches: RefCell<Vec<String>>,
}

impl TerminalSearch {
    pub fn new(query: &str, list: Rc<TerminalList>) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            list,
            matches: RefCell::new(Vec::new()),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> Vec<String> {
        self.matches.borrow().clone()
    }
}

impl SearchSurface for TerminalSearch {
    fn search(&self) {
        if self.query.is_empty() {
            return;
        }
        let found = self
            .list
            .rows
            .borrow()
            .iter()
            .filter(|plugin| {
                plugin.name.to_lowercase().contains(&self.query)
                    || plugin
                        .messages
                        .iter()
                        .any(|message| message.text.to_lowercase().contains(&self.query))
            })
            .map(|plugin| plugin.name.clone())
            .collect();
        *self.matches.borrow_mut() = found;
    }
}

#[derive(Debug, Default)]
pub struct TerminalCounter {
    value: RefCell<String>,
}

impl TerminalCounter {
    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }
}

impl CounterSurface for TerminalCounter {
    fn set_text(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
    }
}

/// Every terminal widget one filter pass needs.
pub struct TerminalView {
    pub nav: Rc<TerminalList>,
    pub cards: Rc<TerminalList>,
    pub search: Rc<TerminalSearch>,
    pub hidden_plugins: Rc<TerminalCounter>,
    pub hidden_messages: Rc<TerminalCounter>,
    page_size: usize,
}

impl TerminalView {
    pub fn new(search: &str, page_size: usize) -> Self {
        let cards = Rc::new(TerminalList::new());
        Self {
            nav: Rc::new(TerminalList::new()),
            search: Rc::new(TerminalSearch::new(search, cards.clone())),
            cards,
            hidden_plugins: Rc::new(TerminalCounter::default()),
            hidden_messages: Rc::new(TerminalCounter::default()),
            page_size,
        }
    }

    pub fn surfaces(&self) -> Surfaces {
        Surfaces {
            nav: self.nav.clone(),
            cards: self.cards.clone(),
            elements: Rc::new(TerminalCards::new(self.cards.clone(), self.page_size)),
            search: self.search.clone(),
            hidden_plugins: self.hidden_plugins.clone(),
            hidden_messages: self.hidden_messages.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "{} plugin(s) shown | hidden plugins: {} | hidden messages: {}\n",
            self.nav.len(),
            self.hidden_plugins.value(),
            self.hidden_messages.value()
        );
        out.push_str(&self.cards.render());
        if !self.search.query().is_empty() {
            let matches = self.search.matches();
            let _ = writeln!(
                out,
                "search \"{}\": {} match(es) {}",
                self.search.query(),
                matches.len(),
                matches.join(", ")
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Message;
    use pretty_assertions::assert_eq;

    fn plugin(name: &str, kinds: &[MessageType]) -> Plugin {
        let mut plugin = Plugin::new(name);
        plugin.messages = kinds
            .iter()
            .map(|kind| Message::new(*kind, "text"))
            .collect();
        plugin
    }

    #[test]
    fn session_log_is_bounded_and_mirrored_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("pluginlens.log");
        let log = SessionLog::new(Some(path.clone()));

        for index in 0..(LOG_CAPACITY + 5) {
            log.info(format!("line {index}"));
        }
        log.error("Error: boom".to_string());

        let entries = log.entries();
        assert_eq!(entries.len(), LOG_CAPACITY);
        assert_eq!(entries[0].message, "line 6");
        assert_eq!(entries[LOG_CAPACITY - 1].level, LogLevel::Error);
        let raw = fs::read_to_string(&path).expect("read log");
        assert_eq!(raw.lines().count(), LOG_CAPACITY + 6);
        assert!(raw.ends_with("[ERROR] Error: boom\n"));
    }

    #[test]
    fn progress_close_without_show_is_fine() {
        let progress = TerminalProgress::new(Rc::new(SessionLog::default()));
        progress.close();
        assert!(!progress.is_open());
        progress.show("Checking");
        assert!(progress.is_open());
        progress.close();
        progress.close();
        assert!(!progress.is_open());
    }

    #[test]
    fn dialog_records_error_entries() {
        let log = Rc::new(SessionLog::default());
        TerminalDialog::new(log.clone()).show("Error", "backend offline");
        assert_eq!(log.text(), "[ERROR] Error: backend offline");
    }

    #[test]
    fn update_size_tracks_longest_name() {
        let list = TerminalList::new();
        list.set_data(&[Plugin::new("A.esp"), Plugin::new("Unofficial Skyrim Patch.esp")]);
        assert_eq!(list.name_width(), MIN_NAME_WIDTH);
        list.update_size();
        assert_eq!(list.name_width(), "Unofficial Skyrim Patch.esp".len());

        list.set_data(&[Plugin::new("x".repeat(80).as_str())]);
        list.update_size();
        assert_eq!(list.name_width(), MAX_NAME_WIDTH);
        assert!(list.render().contains('~'));
    }

    #[test]
    fn only_first_page_has_live_cards() {
        let list = Rc::new(TerminalList::new());
        list.set_data(&[
            plugin("A.esp", &[MessageType::Error, MessageType::Say]),
            plugin("B.esp", &[MessageType::Warn]),
        ]);
        let cards = TerminalCards::new(list.clone(), 1);

        let live = cards.find("A.esp").expect("live card");
        live.on_messages_change();
        assert!(cards.find("B.esp").is_none());
        assert!(cards.find("C.esp").is_none());
        assert_eq!(
            list.badge("A.esp"),
            Some(MessageBadge {
                notes: 1,
                warnings: 0,
                errors: 1,
            })
        );
        assert_eq!(list.badge("B.esp"), None);
    }

    #[test]
    fn search_is_noop_without_query() {
        let list = Rc::new(TerminalList::new());
        list.set_data(&[plugin("Alpha.esp", &[]), plugin("Beta.esp", &[])]);

        let idle = TerminalSearch::new("   ", list.clone());
        idle.search();
        assert!(idle.matches().is_empty());

        let active = TerminalSearch::new("ALPHA", list);
        active.search();
        assert_eq!(active.matches(), vec!["Alpha.esp".to_string()]);
    }

    #[test]
    fn view_renders_counters_and_rows() {
        let view = TerminalView::new("", 10);
        let surfaces = view.surfaces();
        let rows = [plugin("Alpha.esp", &[MessageType::Warn])];
        surfaces.nav.set_data(&rows);
        surfaces.cards.set_data(&rows);
        surfaces.nav.update_size();
        surfaces.cards.update_size();
        surfaces.hidden_plugins.set_text("3");
        surfaces.hidden_messages.set_text("1");

        let rendered = view.render();
        assert!(rendered.starts_with("1 plugin(s) shown | hidden plugins: 3 | hidden messages: 1\n"));
        assert!(rendered.contains("Alpha.esp"));
        assert!(!rendered.contains('~'));
    }
}
