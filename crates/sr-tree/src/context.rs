//! The bundle of collaborators every schedule operation runs against.

use std::sync::Arc;

use sr_core::{Clock, IdAllocator, SystemClock};

use crate::{
    AccessController, AllowAll, NotificationHub, StructuralLock, TransactionManager, TreeConfig,
    TreeResult,
};

/// Shared, explicitly passed tree context.  There is no global instance.
pub struct TreeContext {
    pub config:        TreeConfig,
    pub structure:     StructuralLock,
    pub transactions:  TransactionManager,
    pub access:        Arc<dyn AccessController>,
    pub clock:         Arc<dyn Clock>,
    pub notifications: NotificationHub,
    pub ids:           IdAllocator,
}

impl TreeContext {
    /// A context with default configuration, [`AllowAll`] and [`SystemClock`].
    pub fn with_defaults() -> Self {
        Self::from_parts(TreeConfig::default(), Arc::new(AllowAll), Arc::new(SystemClock))
    }

    fn from_parts(
        config: TreeConfig,
        access: Arc<dyn AccessController>,
        clock:  Arc<dyn Clock>,
    ) -> Self {
        Self {
            structure:     StructuralLock::new(config.lock_timeout_ms),
            transactions:  TransactionManager::new(config.transaction_timeout_ms),
            access,
            clock,
            notifications: NotificationHub::new(),
            ids:           IdAllocator::new(),
            config,
        }
    }

    /// Deliver pending notifications if the configuration asks for it.
    pub fn deliver(&self) {
        if self.config.deliver_immediately {
            self.notifications.flush();
        }
    }
}

/// Fluent builder for [`TreeContext`].
///
/// # Optional inputs (have defaults)
///
/// | Method        | Default                  |
/// |---------------|--------------------------|
/// | `.config(c)`  | `TreeConfig::default()`  |
/// | `.access(a)`  | `AllowAll`               |
/// | `.clock(c)`   | `SystemClock`            |
///
/// # Example
///
/// ```rust,ignore
/// let clock = Arc::new(ManualClock::new(Timestamp(0)));
/// let ctx = TreeContextBuilder::new()
///     .clock(clock.clone())
///     .access(Arc::new(AccessPolicy::new()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct TreeContextBuilder {
    config: Option<TreeConfig>,
    access: Option<Arc<dyn AccessController>>,
    clock:  Option<Arc<dyn Clock>>,
}

impl TreeContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: TreeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn access(mut self, access: Arc<dyn AccessController>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and return the context.
    pub fn build(self) -> TreeResult<TreeContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let access = self.access.unwrap_or_else(|| Arc::new(AllowAll));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        tracing::debug!(
            lock_timeout_ms = config.lock_timeout_ms,
            transaction_timeout_ms = config.transaction_timeout_ms,
            "tree context built"
        );
        Ok(TreeContext::from_parts(config, access, clock))
    }
}
