use crate::{
    filters::FilterConfig,
    plugin::{Plugin, PluginSet},
    ports::{CounterSurface, DisplaySurface, ElementLookup, SearchSurface},
    resolver::ConflictResolver,
};
use std::rc::Rc;
use tracing::debug;

/// The widgets a filter pass publishes to.
#[derive(Clone)]
pub struct Surfaces {
    pub nav: Rc<dyn DisplaySurface>,
    pub cards: Rc<dyn DisplaySurface>,
    pub elements: Rc<dyn ElementLookup>,
    pub search: Rc<dyn SearchSurface>,
    pub hidden_plugins: Rc<dyn CounterSurface>,
    pub hidden_messages: Rc<dyn CounterSurface>,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// The caller's config with the resolved conflict list folded in.
    pub filters: FilterConfig,
    pub visible: Vec<String>,
    pub hidden_plugins: usize,
    pub hidden_messages: usize,
}

pub struct FilterPipeline {
    resolver: ConflictResolver,
    surfaces: Surfaces,
}

impl FilterPipeline {
    pub fn new(resolver: ConflictResolver, surfaces: Surfaces) -> Self {
        Self { resolver, surfaces }
    }

    /// Resolves conflicts for `filters.target`, then filters `plugins` and
    /// publishes the result. Returns `None` when resolution failed; the
    /// failure has already been shown to the user and nothing is published.
    pub async fn run(
        &self,
        plugins: &mut PluginSet,
        filters: &FilterConfig,
    ) -> Option<FilterOutcome> {
        let conflicting = self
            .resolver
            .resolve(filters.target.as_deref(), plugins)
            .await?;
        let filters = filters.with_conflicting(conflicting);

        let filtered: Vec<Plugin> = plugins
            .iter()
            .filter(|plugin| filters.plugin_filter(plugin))
            .cloned()
            .collect();

        let surfaces = &self.surfaces;
        surfaces.nav.set_data(&filtered);
        surfaces.cards.set_data(&filtered);
        for plugin in &filtered {
            if let Some(element) = surfaces.elements.find(&plugin.name) {
                element.on_messages_change();
            }
        }
        surfaces.nav.update_size();
        surfaces.cards.update_size();
        surfaces.search.search();

        let hidden_plugins = plugins.len() - filtered.len();
        surfaces.hidden_plugins.set_text(&hidden_plugins.to_string());

        let hidden_messages = hidden_message_count(plugins, &filters);
        surfaces.hidden_messages.set_text(&hidden_messages.to_string());

        debug!(
            visible = filtered.len(),
            hidden_plugins, hidden_messages, "filter pass complete"
        );
        Some(FilterOutcome {
            filters,
            visible: filtered.into_iter().map(|plugin| plugin.name).collect(),
            hidden_plugins,
            hidden_messages,
        })
    }

}

fn hidden_message_count(plugins: &PluginSet, filters: &FilterConfig) -> usize {
    plugins
        .iter()
        .map(|plugin| {
            let shown = filters.card_content(plugin).messages.len();
            plugin.messages.len().saturating_sub(shown)
        })
        .sum()
}
