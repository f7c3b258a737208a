//! Seams between the filtering core and whatever renders it.
//!
//! Every widget the pipeline touches is passed in as one of these traits, so
//! the same core drives the terminal front end and the recording fakes used
//! in tests. Implementations are single-threaded and take `&self`; use
//! interior mutability for state.

use crate::plugin::Plugin;
use std::rc::Rc;

/// Single-instance busy indicator. `close` must be safe with nothing open.
pub trait ProgressIndicator {
    fn show(&self, message: &str);
    fn close(&self);
}

pub trait MessageDialog {
    fn show(&self, title: &str, message: &str);
}

pub trait Translator {
    fn translate(&self, key: &str) -> String;
}

/// A list view that renders the filtered plugins.
pub trait DisplaySurface {
    fn set_data(&self, plugins: &[Plugin]);
    fn update_size(&self);
}

pub trait SearchSurface {
    /// Re-applies the active search text. No-op when nothing is searched.
    fn search(&self);
}

pub trait CounterSurface {
    fn set_text(&self, value: &str);
}

/// A rendered plugin card.
pub trait CardElement {
    fn on_messages_change(&self);
}

/// Finds the live card for a plugin. Lists may be virtualized, so most
/// plugins have no live card at any given time.
pub trait ElementLookup {
    fn find(&self, name: &str) -> Option<Rc<dyn CardElement>>;
}
