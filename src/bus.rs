use parking_lot::Mutex;
use serde_json::Value;
use std::{any::Any, fmt, sync::Arc, sync::OnceLock};

use crate::{
    config::BusConfig,
    error::{BusError, Result},
    registry::{Handler, Registry},
};

#[derive(Clone, Copy)]
enum Kind {
    Persistent,
    Once,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::Persistent => "on",
            Kind::Once => "once",
        }
    }
}

// 两张独立注册表：持久处理器与一次性处理器
#[derive(Default)]
struct Registries {
    persistent: Registry,
    once: Registry,
}

struct BusInner {
    regs: Mutex<Registries>,
    cfg: BusConfig,
}

/// 总线句柄：可廉价克隆，所有克隆共享同一组注册表。
#[derive(Clone)]
pub struct BusHandle {
    inner: Arc<BusInner>,
}

impl fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusHandle")
            .field("name", &self.inner.cfg.name)
            .finish()
    }
}

pub struct Bus {
    handle: BusHandle,
}

impl Bus {
    pub fn new(cfg: BusConfig) -> Self {
        let inner = BusInner {
            regs: Mutex::new(Registries::default()),
            cfg,
        };
        Self {
            handle: BusHandle {
                inner: Arc::new(inner),
            },
        }
    }
    pub fn handle(&self) -> BusHandle {
        self.handle.clone()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

static GLOBAL: OnceLock<BusHandle> = OnceLock::new();

/// The process-wide bus. Created on first use and never torn down; call
/// [`BusHandle::reset`] to clear it between test cases.
pub fn global() -> &'static BusHandle {
    GLOBAL.get_or_init(|| Bus::default().handle())
}

impl BusHandle {
    pub fn name(&self) -> &str {
        &self.inner.cfg.name
    }

    pub fn subscribe(&self, event: &str, handler: Handler) {
        self.register(Kind::Persistent, event, handler);
    }

    pub fn subscribe_once(&self, event: &str, handler: Handler) {
        self.register(Kind::Once, event, handler);
    }

    /// 动态注册入口：值必须是 [`Handler`]，否则记录 warn 并忽略。
    /// 返回被接受的处理器，便于之后 `unsubscribe`。
    pub fn subscribe_dyn(
        &self,
        event: &str,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Option<Handler> {
        self.register_dyn(Kind::Persistent, event, candidate)
    }

    pub fn subscribe_once_dyn(
        &self,
        event: &str,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Option<Handler> {
        self.register_dyn(Kind::Once, event, candidate)
    }

    /// Remove every registration of `handler` for `event` from both the
    /// persistent and the one-shot registry. Unknown events or handlers are a no-op.
    pub fn unsubscribe(&self, event: &str, handler: &Handler) {
        let (p, o) = {
            let mut regs = self.inner.regs.lock();
            (
                regs.persistent.remove_all(event, handler),
                regs.once.remove_all(event, handler),
            )
        };
        if p + o > 0 {
            tracing::debug!(bus = %self.name(), event, persistent = p, once = o, "handler unsubscribed");
        }
    }

    /// Invoke the persistent handlers of `event`, then its one-shot handlers,
    /// each in registration order and on the calling thread.
    ///
    /// Both sequences are snapshotted when the call starts: handlers registered
    /// during dispatch wait for the next publish. A snapshotted one-shot that is
    /// unsubscribed, or consumed by a nested publish of the same event, before
    /// its turn does not run here.
    ///
    /// The first handler error aborts the rest of this call and is returned as
    /// [`BusError::Handler`]; handlers that need isolation must catch their own
    /// failures. One-shot handlers are removed from the registry before any of
    /// them runs, so each fires at most once even if a sibling fails. If a
    /// persistent handler fails, the one-shot handlers stay registered.
    pub fn publish(&self, event: &str, args: &[Value]) -> Result<()> {
        // 先拍快照再释放锁：处理器内可重入地 subscribe/unsubscribe/publish
        let (persistent, once) = {
            let regs = self.inner.regs.lock();
            (regs.persistent.snapshot(event), regs.once.snapshot(event))
        };
        tracing::trace!(bus = %self.name(), event, handlers = persistent.len(), once = once.len(), "publish");
        for h in &persistent {
            self.invoke(Kind::Persistent, event, h, args)?;
        }
        if once.is_empty() {
            return Ok(());
        }
        let once = self.inner.regs.lock().once.take_snapshotted(event, &once);
        for h in &once {
            self.invoke(Kind::Once, event, h, args)?;
        }
        Ok(())
    }

    /// Number of handlers (persistent + one-shot) currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        let regs = self.inner.regs.lock();
        regs.persistent.len(event) + regs.once.len(event)
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Sorted names of all events with at least one handler.
    pub fn event_names(&self) -> Vec<String> {
        let regs = self.inner.regs.lock();
        let mut names: Vec<String> = regs
            .persistent
            .event_names()
            .chain(regs.once.event_names())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn reset(&self) {
        let mut regs = self.inner.regs.lock();
        regs.persistent.clear();
        regs.once.clear();
        tracing::debug!(bus = %self.name(), "registries reset");
    }

    fn register(&self, kind: Kind, event: &str, handler: Handler) {
        {
            let mut regs = self.inner.regs.lock();
            match kind {
                Kind::Persistent => regs.persistent.push(event, handler),
                Kind::Once => regs.once.push(event, handler),
            }
        }
        tracing::debug!(bus = %self.name(), event, kind = kind.label(), "handler subscribed");
    }

    fn register_dyn(
        &self,
        kind: Kind,
        event: &str,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Option<Handler> {
        match candidate.downcast::<Handler>() {
            Ok(h) => {
                let h = *h;
                self.register(kind, event, h.clone());
                Some(h)
            }
            Err(_) => {
                tracing::warn!(bus = %self.name(), event, kind = kind.label(), "attempt to register non-handler value; ignoring");
                None
            }
        }
    }

    fn invoke(&self, kind: Kind, event: &str, h: &Handler, args: &[Value]) -> Result<()> {
        if self.inner.cfg.trace_dispatch {
            tracing::trace!(bus = %self.name(), event, kind = kind.label(), handler = ?h, "dispatch");
        }
        h.call(args).map_err(|source| BusError::Handler {
            event: event.to_string(),
            source,
        })
    }
}

/// Publish with variadic arguments, each converted through `serde_json::json!`.
///
/// ```
/// use mmg_eventbus::prelude::*;
/// let bus = Bus::default().handle();
/// emit!(bus, "ping", 42, "x").unwrap();
/// ```
#[macro_export]
macro_rules! emit {
    ($bus:expr, $event:expr $(, $arg:expr)* $(,)?) => {
        $crate::bus::Emit::emit_args(&$bus, $event, &[$($crate::__serde_json::json!($arg)),*])
    };
}

/// Receiver side of [`emit!`]; implemented by both the core handle and the
/// component-scoped adapter.
pub trait Emit {
    fn emit_args(&self, event: &str, args: &[Value]) -> Result<()>;
}

impl Emit for BusHandle {
    fn emit_args(&self, event: &str, args: &[Value]) -> Result<()> {
        self.publish(event, args)
    }
}

impl<T: Emit + ?Sized> Emit for &T {
    fn emit_args(&self, event: &str, args: &[Value]) -> Result<()> {
        (**self).emit_args(event, args)
    }
}
