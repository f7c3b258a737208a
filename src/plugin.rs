use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Say,
    Warn,
    Error,
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Say
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Message {
    pub fn new(kind: MessageType, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            language: None,
            condition: None,
        }
    }

    pub fn is_note(&self) -> bool {
        self.kind == MessageType::Say
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub crc: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub is_empty: bool,
    #[serde(default)]
    pub loads_archive: bool,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Plugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn crc_label(&self) -> Option<String> {
        self.crc.map(|crc| format!("{crc:08X}"))
    }
}

/// Plugins in load order, indexed by name.
///
/// Names are unique: when a name appears twice the later record replaces the
/// earlier one in place.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    plugins: Vec<Plugin>,
    index: HashMap<String, usize>,
}

impl PluginSet {
    pub fn new(plugins: Vec<Plugin>) -> Self {
        let mut set = Self::default();
        for plugin in plugins {
            set.insert(plugin);
        }
        set
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read plugin list {}", path.display()))?;
        let plugins: Vec<Plugin> = serde_json::from_str(&raw).context("parse plugin list")?;
        Ok(Self::new(plugins))
    }

    fn insert(&mut self, plugin: Plugin) {
        if let Some(&index) = self.index.get(&plugin.name) {
            self.plugins[index] = plugin;
            return;
        }
        self.index.insert(plugin.name.clone(), self.plugins.len());
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    pub fn as_slice(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.index.get(name).map(|&index| &self.plugins[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Plugin> {
        let index = *self.index.get(name)?;
        self.plugins.get_mut(index)
    }
}
