//! Name-keyed lookup tables built once at startup: one for backend drivers,
//! one each for the two parser families. Kept separate from the `Backend`
//! trait itself because a driver's review/summary parser is a standalone
//! component the scheduler resolves by name, not a capability of the driver
//! object.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::backend::{Backend, ReviewParser, SummaryParser};

/// Read-only map from backend name to driver instance.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

type ReviewParserFactory =
    Arc<dyn Fn(tokio::process::ChildStdout, u32) -> Box<dyn ReviewParser> + Send + Sync>;
type SummaryParserFactory = Arc<dyn Fn() -> Box<dyn SummaryParser> + Send + Sync>;

/// Read-only map from backend name to a constructor for each parser family.
/// A fresh `ReviewParser` is built per reviewer (it carries per-stream
/// parse-error counters); a `SummaryParser` is stateless and can be shared,
/// but is still built fresh for symmetry and to keep callers from assuming
/// `Sync` reuse matters.
#[derive(Default, Clone)]
pub struct ParserRegistry {
    review: HashMap<String, ReviewParserFactory>,
    summary: HashMap<String, SummaryParserFactory>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_review<F>(&mut self, backend_name: impl Into<String>, factory: F)
    where
        F: Fn(tokio::process::ChildStdout, u32) -> Box<dyn ReviewParser> + Send + Sync + 'static,
    {
        self.review.insert(backend_name.into(), Arc::new(factory));
    }

    pub fn register_summary<F>(&mut self, backend_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn SummaryParser> + Send + Sync + 'static,
    {
        self.summary.insert(backend_name.into(), Arc::new(factory));
    }

    pub fn review_parser_for(
        &self,
        backend_name: &str,
        stdout: tokio::process::ChildStdout,
        reviewer_id: u32,
    ) -> Result<Box<dyn ReviewParser>> {
        let factory = self
            .review
            .get(backend_name)
            .ok_or_else(|| anyhow!("no review parser registered for backend '{backend_name}'"))?;
        Ok(factory(stdout, reviewer_id))
    }

    pub fn summary_parser_for(&self, backend_name: &str) -> Result<Box<dyn SummaryParser>> {
        let factory = self
            .summary
            .get(backend_name)
            .ok_or_else(|| anyhow!("no summary parser registered for backend '{backend_name}'"))?;
        Ok(factory())
    }
}
