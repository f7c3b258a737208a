//! Conflict-aware filtering of a plugin load order.
//!
//! [`pipeline::FilterPipeline`] asks a [`query::ConflictQuery`] backend which
//! plugins conflict with a target, folds the refreshed metadata back into the
//! [`plugin::PluginSet`], and publishes the filtered view through the widget
//! traits in [`ports`].

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod filters;
pub mod l10n;
pub mod pipeline;
pub mod plugin;
pub mod ports;
pub mod query;
pub mod reporter;
pub mod resolver;

#[cfg(test)]
mod testing;
