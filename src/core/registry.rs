//! Named logger registry
//!
//! Loggers form a dotted hierarchy (`svc.access` is a child of `svc`, which
//! is a child of the root logger). A logger without its own level inherits
//! the nearest ancestor's, and records propagate to ancestor handlers unless
//! propagation is switched off.

use super::handler::{same_handler, Handler};
use super::log_level::LogLevel;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const ROOT_LOGGER_NAME: &str = "root";

/// Threshold of an unconfigured root logger
pub const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Warning;

/// Per-name logging state: an optional threshold and attached handlers
pub struct LoggerNode {
    name: String,
    level: RwLock<Option<LogLevel>>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    propagate: AtomicBool,
}

impl LoggerNode {
    fn new(name: impl Into<String>, level: Option<LogLevel>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(level),
            handlers: RwLock::new(Vec::new()),
            propagate: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own threshold; `None` means inherited
    pub fn level(&self) -> Option<LogLevel> {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = Some(level);
    }

    pub fn clear_level(&self) {
        *self.level.write() = None;
    }

    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().clone()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Attach a handler; attaching the same handler twice is a no-op.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        let mut handlers = self.handlers.write();
        if !handlers.iter().any(|h| same_handler(h, &handler)) {
            handlers.push(handler);
        }
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    /// Swap in a new handler list in one step; duplicates are dropped.
    pub fn replace_handlers(&self, replacement: Vec<Arc<dyn Handler>>) {
        let mut deduped: Vec<Arc<dyn Handler>> = Vec::with_capacity(replacement.len());
        for handler in replacement {
            if !deduped.iter().any(|h| same_handler(h, &handler)) {
                deduped.push(handler);
            }
        }
        *self.handlers.write() = deduped;
    }

    pub fn has_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        self.handlers.read().iter().any(|h| same_handler(h, handler))
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }
}

impl fmt::Debug for LoggerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerNode")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .field("propagate", &self.propagate())
            .finish()
    }
}

/// All loggers of one [`LoggingContext`](crate::LoggingContext)
pub struct LoggerRegistry {
    root: Arc<LoggerNode>,
    loggers: RwLock<HashMap<String, Arc<LoggerNode>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self {
            root: Arc::new(LoggerNode::new(ROOT_LOGGER_NAME, Some(DEFAULT_ROOT_LEVEL))),
            loggers: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> Arc<LoggerNode> {
        Arc::clone(&self.root)
    }

    fn is_root(name: &str) -> bool {
        name.is_empty() || name == ROOT_LOGGER_NAME
    }

    /// Get a logger, creating it on first use.
    pub fn get(&self, name: &str) -> Arc<LoggerNode> {
        if Self::is_root(name) {
            return self.root();
        }
        if let Some(node) = self.loggers.read().get(name) {
            return Arc::clone(node);
        }
        let mut loggers = self.loggers.write();
        Arc::clone(
            loggers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(LoggerNode::new(name, None))),
        )
    }

    /// Get a logger only if it was created before.
    pub fn existing(&self, name: &str) -> Option<Arc<LoggerNode>> {
        if Self::is_root(name) {
            return Some(self.root());
        }
        self.loggers.read().get(name).cloned()
    }

    /// Existing loggers from `name` up to and including the root.
    pub fn lineage(&self, name: &str) -> Vec<Arc<LoggerNode>> {
        let mut nodes = Vec::new();
        if !Self::is_root(name) {
            let loggers = self.loggers.read();
            let mut current = name;
            loop {
                if let Some(node) = loggers.get(current) {
                    nodes.push(Arc::clone(node));
                }
                match current.rfind('.') {
                    Some(idx) => current = &current[..idx],
                    None => break,
                }
            }
        }
        nodes.push(self.root());
        nodes
    }

    /// Own level of the logger or of its nearest ancestor that has one.
    pub fn effective_level(&self, name: &str) -> LogLevel {
        self.lineage(name)
            .iter()
            .find_map(|node| node.level())
            .unwrap_or(DEFAULT_ROOT_LEVEL)
    }

    /// Handlers a record from `name` is offered to, in order.
    ///
    /// Walks up the hierarchy while `propagate` holds. A handler attached at
    /// several levels appears once.
    pub fn handlers_for(&self, name: &str) -> Vec<Arc<dyn Handler>> {
        let mut handlers: Vec<Arc<dyn Handler>> = Vec::new();
        for node in self.lineage(name) {
            for handler in node.handlers() {
                if !handlers.iter().any(|h| same_handler(h, &handler)) {
                    handlers.push(handler);
                }
            }
            if !node.propagate() {
                break;
            }
        }
        handlers
    }

    /// Names of all non-root loggers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("root", &self.root)
            .field("loggers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventDict, LogRecord, Result};

    struct NullHandler;

    impl Handler for NullHandler {
        fn handle(&self, _record: &LogRecord, _event: Option<&EventDict>) -> Result<()> {
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "null"
        }

        fn level(&self) -> LogLevel {
            LogLevel::Debug
        }

        fn set_level(&self, _level: LogLevel) {}
    }

    #[test]
    fn test_root_aliases() {
        let registry = LoggerRegistry::new();
        assert!(Arc::ptr_eq(&registry.get(""), &registry.get("root")));
        assert_eq!(registry.root().level(), Some(LogLevel::Warning));
    }

    #[test]
    fn test_get_returns_same_node() {
        let registry = LoggerRegistry::new();
        let a = registry.get("svc.access");
        let b = registry.get("svc.access");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.existing("svc").is_none());
    }

    #[test]
    fn test_effective_level_inherits() {
        let registry = LoggerRegistry::new();
        registry.root().set_level(LogLevel::Info);
        registry.get("svc").set_level(LogLevel::Error);
        registry.get("svc.access");

        assert_eq!(registry.effective_level("svc.access"), LogLevel::Error);
        assert_eq!(registry.effective_level("other"), LogLevel::Info);

        registry.get("svc.access").set_level(LogLevel::Debug);
        assert_eq!(registry.effective_level("svc.access"), LogLevel::Debug);
    }

    #[test]
    fn test_lineage_order() {
        let registry = LoggerRegistry::new();
        registry.get("a");
        registry.get("a.b.c");

        let names: Vec<String> = registry
            .lineage("a.b.c")
            .iter()
            .map(|node| node.name().to_string())
            .collect();
        assert_eq!(names, vec!["a.b.c", "a", "root"]);
    }

    #[test]
    fn test_handlers_for_deduplicates() {
        let registry = LoggerRegistry::new();
        let shared: Arc<dyn Handler> = Arc::new(NullHandler);
        let other: Arc<dyn Handler> = Arc::new(NullHandler);

        registry.root().add_handler(Arc::clone(&shared));
        registry.get("svc.access").add_handler(Arc::clone(&shared));
        registry.get("svc.access").add_handler(Arc::clone(&other));

        let handlers = registry.handlers_for("svc.access");
        assert_eq!(handlers.len(), 2);
        assert!(same_handler(&handlers[0], &shared));
        assert!(same_handler(&handlers[1], &other));
    }

    #[test]
    fn test_propagation_stops() {
        let registry = LoggerRegistry::new();
        registry.root().add_handler(Arc::new(NullHandler));
        let access = registry.get("svc.access");
        access.set_propagate(false);

        assert!(registry.handlers_for("svc.access").is_empty());
        assert_eq!(registry.handlers_for("svc").len(), 1);
    }

    #[test]
    fn test_add_handler_is_idempotent() {
        let node = LoggerRegistry::new().get("svc");
        let handler: Arc<dyn Handler> = Arc::new(NullHandler);
        node.add_handler(Arc::clone(&handler));
        node.add_handler(Arc::clone(&handler));
        assert_eq!(node.handler_count(), 1);
        assert!(node.has_handler(&handler));
    }

    #[test]
    fn test_replace_handlers_swaps_list() {
        let node = LoggerRegistry::new().get("svc");
        let old: Arc<dyn Handler> = Arc::new(NullHandler);
        let new: Arc<dyn Handler> = Arc::new(NullHandler);
        node.add_handler(Arc::clone(&old));

        node.replace_handlers(vec![Arc::clone(&new), Arc::clone(&new)]);

        assert_eq!(node.handler_count(), 1);
        assert!(node.has_handler(&new));
        assert!(!node.has_handler(&old));
    }

    #[test]
    fn test_clear_level_restores_inheritance() {
        let registry = LoggerRegistry::new();
        registry.root().set_level(LogLevel::Info);
        let node = registry.get("svc");
        node.set_level(LogLevel::Error);

        node.clear_level();

        assert_eq!(node.level(), None);
        assert_eq!(registry.effective_level("svc"), LogLevel::Info);
    }
}
