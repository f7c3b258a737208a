use crate::plugin::{Message, Plugin};
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};

/// Toggles exposed by the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub hide_version_numbers: bool,
    #[serde(default)]
    pub hide_crcs: bool,
    #[serde(default)]
    pub hide_bash_tags: bool,
    #[serde(default)]
    pub hide_notes: bool,
    #[serde(default)]
    pub hide_all_plugin_messages: bool,
    #[serde(default)]
    pub hide_inactive_plugins: bool,
    #[serde(default)]
    pub hide_messageless_plugins: bool,
    #[serde(default)]
    pub content_filter: String,
}

impl FilterSettings {
    fn content_filter_normalized(&self) -> Option<String> {
        let trimmed = self.content_filter.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

pub trait PluginPredicate {
    fn matches(&self, plugin: &Plugin, filters: &FilterConfig) -> bool;
}

/// What a plugin card renders once the filter settings are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub version: Option<String>,
    pub crc: Option<String>,
    pub tags: Vec<String>,
    pub messages: Vec<Message>,
}

pub trait CardContent {
    fn card_content(&self, plugin: &Plugin, filters: &FilterConfig) -> Card;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCardContent;

impl CardContent for StandardCardContent {
    fn card_content(&self, plugin: &Plugin, filters: &FilterConfig) -> Card {
        let settings = &filters.settings;
        let messages = if settings.hide_all_plugin_messages {
            Vec::new()
        } else {
            plugin
                .messages
                .iter()
                .filter(|message| !(settings.hide_notes && message.is_note()))
                .cloned()
                .collect()
        };
        Card {
            version: plugin
                .version
                .clone()
                .filter(|_| !settings.hide_version_numbers),
            crc: plugin.crc_label().filter(|_| !settings.hide_crcs),
            tags: if settings.hide_bash_tags {
                Vec::new()
            } else {
                plugin.tags.iter().cloned().collect()
            },
            messages,
        }
    }
}

/// The filter panel's default visibility rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPredicate;

impl PluginPredicate for StandardPredicate {
    fn matches(&self, plugin: &Plugin, filters: &FilterConfig) -> bool {
        let settings = &filters.settings;
        if settings.hide_inactive_plugins && !plugin.is_active {
            return false;
        }
        if !filters.conflicting.is_empty()
            && !filters.conflicting.iter().any(|name| *name == plugin.name)
        {
            return false;
        }

        let card = filters.card_content(plugin);
        if settings.hide_messageless_plugins && card.messages.is_empty() {
            return false;
        }

        match settings.content_filter_normalized() {
            Some(needle) => card_matches(plugin, &card, &needle),
            None => true,
        }
    }
}

fn card_matches(plugin: &Plugin, card: &Card, needle: &str) -> bool {
    let mut haystacks = vec![plugin.name.as_str()];
    haystacks.extend(card.version.as_deref());
    haystacks.extend(card.crc.as_deref());
    haystacks.extend(card.tags.iter().map(String::as_str));
    haystacks.extend(card.messages.iter().map(|message| message.text.as_str()));
    haystacks
        .into_iter()
        .any(|value| value.to_lowercase().contains(needle))
}

/// Parameters for one filter pass.
///
/// `conflicting` is written by conflict resolution; callers build a config
/// with an empty list and read the resolved list back from the outcome.
#[derive(Clone)]
pub struct FilterConfig {
    pub target: Option<String>,
    pub conflicting: Vec<String>,
    pub settings: FilterSettings,
    predicate: Rc<dyn PluginPredicate>,
    card_content: Rc<dyn CardContent>,
}

impl FilterConfig {
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            target: None,
            conflicting: Vec::new(),
            settings,
            predicate: Rc::new(StandardPredicate),
            card_content: Rc::new(StandardCardContent),
        }
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target.filter(|name| !name.is_empty());
        self
    }

    pub fn with_predicate(mut self, predicate: Rc<dyn PluginPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Replaces the card reduction used both for visibility and for the
    /// hidden-message count.
    pub fn with_card_content(mut self, card_content: Rc<dyn CardContent>) -> Self {
        self.card_content = card_content;
        self
    }

    pub fn with_conflicting(&self, conflicting: Vec<String>) -> Self {
        Self {
            conflicting,
            ..self.clone()
        }
    }

    pub fn plugin_filter(&self, plugin: &Plugin) -> bool {
        self.predicate.matches(plugin, self)
    }

    pub fn card_content(&self, plugin: &Plugin) -> Card {
        self.card_content.card_content(plugin, self)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(FilterSettings::default())
    }
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig")
            .field("target", &self.target)
            .field("conflicting", &self.conflicting)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
