use thiserror::Error;

/// Why a conflict lookup produced no usable result.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{message}")]
    Query {
        message: String,
        trace: Option<String>,
    },
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

impl ResolveError {
    pub fn query(err: anyhow::Error) -> Self {
        let trace = if err.chain().count() > 1 {
            Some(format!("{err:?}"))
        } else {
            None
        };
        ResolveError::Query {
            message: format!("{err:#}"),
            trace,
        }
    }

    /// Extra detail for the log, beyond what the user is shown.
    pub fn diagnostic_trace(&self) -> Option<String> {
        match self {
            ResolveError::Query { trace, .. } => trace.clone(),
            ResolveError::Decode(err) => Some(format!(
                "invalid conflict response at line {} column {}: {err}",
                err.line(),
                err.column()
            )),
        }
    }
}
