//! Maps operation names to handler functions.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::BatchError;
use crate::model::{OperationOutcome, OperationParams};

/// The eleven operation names the engine recognizes out of the box.
///
/// The core never interprets anything beyond the name: parameter parsing is
/// entirely the handler's responsibility.
pub const KNOWN_OPERATIONS: &[&str] = &[
    "merge",
    "split",
    "rotate",
    "extract_pages",
    "extract_text",
    "extract_images",
    "ocr",
    "convert_to_images",
    "add_password",
    "compress",
    "optimize_web",
];

/// A handler applies one operation to a single file and must be total: it
/// never panics, and on internal failure returns an [`OperationOutcome`]
/// with `success = false` and a populated `errors` list. Handlers are
/// invoked from multiple worker threads concurrently and must not retain
/// references to job state.
pub type OperationHandler = Arc<dyn Fn(&Path, &OperationParams) -> OperationOutcome + Send + Sync>;

/// Registry of operation name -> handler. Immutable after construction is
/// complete; safe to consult concurrently from many jobs at once.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: BTreeMap<String, OperationHandler>,
}

impl OperationRegistry {
    /// An empty registry with no handlers registered.
    pub fn new_empty() -> Self {
        OperationRegistry::default()
    }

    /// Registers a handler under `name`, overwriting any prior registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&Path, &OperationParams) -> OperationOutcome + Send + Sync + 'static,
    ) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Looks up a handler by name.
    pub fn lookup(&self, name: &str) -> Result<OperationHandler, BatchError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| BatchError::NotFound(format!("unknown operation '{name}'")))
    }

    /// True if `name` has a registered handler.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Lists every registered operation name, in registration order is not
    /// guaranteed; callers should not rely on ordering beyond it being
    /// stable and deduplicated.
    pub fn enumerate(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Builds a registry with trivial stub handlers for all
    /// [`KNOWN_OPERATIONS`], used only by tests that need to exercise the
    /// full engine without real PDF processing.
    pub fn populated_with_stubs() -> Self {
        let mut registry = OperationRegistry::new_empty();
        for name in KNOWN_OPERATIONS {
            registry.register(*name, |path, _params| OperationOutcome {
                success: true,
                message: format!("processed {}", path.display()),
                output_files: vec![path.to_path_buf()],
                execution_time_seconds: 0.0,
                warnings: Vec::new(),
                errors: Vec::new(),
            });
        }
        registry
    }
}
