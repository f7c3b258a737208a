use crate::{
    error::ResolveError,
    ports::{MessageDialog, ProgressIndicator, Translator},
};
use std::rc::Rc;
use tracing::error;

/// Last stop for conflict lookup failures.
#[derive(Clone)]
pub struct ErrorReporter {
    progress: Rc<dyn ProgressIndicator>,
    dialog: Rc<dyn MessageDialog>,
    translator: Rc<dyn Translator>,
}

impl ErrorReporter {
    pub fn new(
        progress: Rc<dyn ProgressIndicator>,
        dialog: Rc<dyn MessageDialog>,
        translator: Rc<dyn Translator>,
    ) -> Self {
        Self {
            progress,
            dialog,
            translator,
        }
    }

    pub fn report(&self, err: &ResolveError) {
        match err.diagnostic_trace() {
            Some(trace) => error!(%trace, "conflict lookup failed: {err}"),
            None => error!("conflict lookup failed: {err}"),
        }
        self.progress.close();
        self.dialog
            .show(&self.translator.translate("Error"), &err.to_string());
    }
}
