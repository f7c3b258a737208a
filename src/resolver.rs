use crate::{
    error::ResolveError,
    plugin::{Plugin, PluginSet},
    ports::{MessageDialog, ProgressIndicator, Translator},
    query::{ConflictEntry, ConflictQuery, ConflictQueryResult, GET_CONFLICTING_PLUGINS},
    reporter::ErrorReporter,
};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

pub const CHECKING_MESSAGE: &str = "Checking if plugins have been loaded...";

/// Looks up the plugins that conflict with a target and refreshes the
/// metadata the backend reports for them.
pub struct ConflictResolver {
    query: Arc<dyn ConflictQuery>,
    progress: Rc<dyn ProgressIndicator>,
    translator: Rc<dyn Translator>,
    reporter: ErrorReporter,
}

impl ConflictResolver {
    pub fn new(
        query: Arc<dyn ConflictQuery>,
        progress: Rc<dyn ProgressIndicator>,
        dialog: Rc<dyn MessageDialog>,
        translator: Rc<dyn Translator>,
    ) -> Self {
        let reporter = ErrorReporter::new(progress.clone(), dialog, translator.clone());
        Self {
            query,
            progress,
            translator,
            reporter,
        }
    }

    /// Returns the target followed by every plugin reported as conflicting
    /// with it, or an empty list when there is no target.
    ///
    /// Failures are reported to the user and yield `None`.
    pub async fn resolve(
        &self,
        target: Option<&str>,
        plugins: &mut PluginSet,
    ) -> Option<Vec<String>> {
        let Some(target) = target.filter(|name| !name.is_empty()) else {
            return Some(Vec::new());
        };

        self.progress
            .show(&self.translator.translate(CHECKING_MESSAGE));
        match self.lookup(target, plugins).await {
            Ok(conflicts) => {
                self.progress.close();
                Some(conflicts)
            }
            Err(err) => {
                self.reporter.report(&err);
                None
            }
        }
    }

    async fn lookup(
        &self,
        target: &str,
        plugins: &mut PluginSet,
    ) -> Result<Vec<String>, ResolveError> {
        info!(plugin = %target, "conflict query started");
        let raw = self
            .query
            .query(GET_CONFLICTING_PLUGINS, target)
            .await
            .map_err(ResolveError::query)?;

        let mut conflicts = vec![target.to_string()];
        let Some(result) = ConflictQueryResult::parse(raw.as_deref())? else {
            info!(plugin = %target, "conflict query returned no data");
            return Ok(conflicts);
        };

        let mut refreshed = 0usize;
        for (name, entry) in result.entries {
            if entry.conflicts && name != target {
                conflicts.push(name.clone());
            }
            if let Some(plugin) = plugins.get_mut(&name) {
                refresh_plugin(plugin, entry);
                refreshed += 1;
                debug!(plugin = %name, "refreshed plugin metadata");
            }
        }

        info!(
            plugin = %target,
            conflicts = conflicts.len() - 1,
            refreshed,
            "conflict query complete"
        );
        Ok(conflicts)
    }
}

// Full overwrite: the response is authoritative for these fields.
fn refresh_plugin(plugin: &mut Plugin, entry: ConflictEntry) {
    plugin.crc = entry.crc;
    plugin.is_empty = entry.is_empty;
    plugin.messages = entry.messages;
    plugin.tags = entry.tags;
    plugin.is_dirty = entry.is_dirty;
}
