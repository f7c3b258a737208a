//! Recording fakes for the UI ports and the query transport.

use crate::{
    plugin::Plugin,
    ports::{
        CardElement, CounterSurface, DisplaySurface, ElementLookup, MessageDialog,
        ProgressIndicator, SearchSurface, Translator,
    },
    query::ConflictQuery,
};
use anyhow::Result;
use async_trait::async_trait;
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProgressShow(String),
    ProgressClose,
    Dialog(String, String),
    SetData(String, Vec<String>),
    UpdateSize(String),
    Search,
    Counter(String, String),
    MessagesChange(String),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    progress_open: bool,
    translations: HashMap<String, String>,
}

/// Hands out port fakes that all append to one event log.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Rc<RefCell<State>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate_as(&self, key: &str, text: &str) {
        self.state
            .borrow_mut()
            .translations
            .insert(key.to_string(), text.to_string());
    }

    fn push(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn dialogs(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Dialog(title, message) => Some((title, message)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: impl Fn(&Event) -> bool) -> usize {
        self.state.borrow().events.iter().filter(|event| wanted(*event)).count()
    }

    pub fn progress_open(&self) -> bool {
        self.state.borrow().progress_open
    }

    pub fn progress(&self) -> Rc<dyn ProgressIndicator> {
        Rc::new(self.clone())
    }

    pub fn dialog(&self) -> Rc<dyn MessageDialog> {
        Rc::new(self.clone())
    }

    pub fn translator(&self) -> Rc<dyn Translator> {
        Rc::new(self.clone())
    }

    pub fn search(&self) -> Rc<dyn SearchSurface> {
        Rc::new(self.clone())
    }

    pub fn surface(&self, name: &str) -> Rc<dyn DisplaySurface> {
        Rc::new(FakeSurface {
            name: name.to_string(),
            recorder: self.clone(),
        })
    }

    pub fn counter(&self, name: &str) -> Rc<dyn CounterSurface> {
        Rc::new(FakeSurface {
            name: name.to_string(),
            recorder: self.clone(),
        })
    }

    /// Only the named plugins have a live card.
    pub fn elements(&self, live: &[&str]) -> Rc<dyn ElementLookup> {
        Rc::new(FakeElements {
            live: live.iter().map(|name| name.to_string()).collect(),
            recorder: self.clone(),
        })
    }
}

impl ProgressIndicator for Recorder {
    fn show(&self, message: &str) {
        self.state.borrow_mut().progress_open = true;
        self.push(Event::ProgressShow(message.to_string()));
    }

    fn close(&self) {
        self.state.borrow_mut().progress_open = false;
        self.push(Event::ProgressClose);
    }
}

impl MessageDialog for Recorder {
    fn show(&self, title: &str, message: &str) {
        self.push(Event::Dialog(title.to_string(), message.to_string()));
    }
}

impl Translator for Recorder {
    fn translate(&self, key: &str) -> String {
        self.state
            .borrow()
            .translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

impl SearchSurface for Recorder {
    fn search(&self) {
        self.push(Event::Search);
    }
}

struct FakeSurface {
    name: String,
    recorder: Recorder,
}

impl DisplaySurface for FakeSurface {
    fn set_data(&self, plugins: &[Plugin]) {
        let names = plugins.iter().map(|plugin| plugin.name.clone()).collect();
        self.recorder.push(Event::SetData(self.name.clone(), names));
    }

    fn update_size(&self) {
        self.recorder.push(Event::UpdateSize(self.name.clone()));
    }
}

impl CounterSurface for FakeSurface {
    fn set_text(&self, value: &str) {
        self.recorder
            .push(Event::Counter(self.name.clone(), value.to_string()));
    }
}

struct FakeElements {
    live: HashSet<String>,
    recorder: Recorder,
}

impl ElementLookup for FakeElements {
    fn find(&self, name: &str) -> Option<Rc<dyn CardElement>> {
        if !self.live.contains(name) {
            return None;
        }
        Some(Rc::new(FakeElement {
            name: name.to_string(),
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakeElement {
    name: String,
    recorder: Recorder,
}

impl CardElement for FakeElement {
    fn on_messages_change(&self) {
        self.recorder.push(Event::MessagesChange(self.name.clone()));
    }
}

/// Answers every query with the same canned result and records the calls.
#[derive(Clone)]
pub struct StubQuery {
    response: Result<Option<String>, String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubQuery {
    pub fn answering(raw: Option<&str>) -> Self {
        Self {
            response: Ok(raw.map(str::to_string)),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ConflictQuery for StubQuery {
    async fn query(&self, operation: &str, payload: &str) -> Result<Option<String>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((operation.to_string(), payload.to_string()));
        }
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}
