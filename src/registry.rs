use smallvec::SmallVec;
use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

type HandlerFn = dyn Fn(&[Value]) -> anyhow::Result<()> + Send + Sync;

/// 处理器引用：克隆共享同一身份，按指针判等（不携带 id/优先级等元数据）。
#[derive(Clone)]
pub struct Handler {
    f: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Wrap a closure that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self::new(move |args| {
            f(args);
            Ok(())
        })
    }

    pub fn same(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    pub fn call(&self, args: &[Value]) -> anyhow::Result<()> {
        (self.f)(args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}
impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.f) as *const ())
    }
}

pub(crate) type Handlers = SmallVec<[Handler; 4]>;

// 事件名 -> 有序处理器序列；空序列即删除键，“缺失”与“空”等价
#[derive(Default)]
pub(crate) struct Registry {
    by_event: HashMap<String, Handlers>,
}

impl Registry {
    pub(crate) fn push(&mut self, event: &str, handler: Handler) {
        self.by_event
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    /// Remove every entry identical to `handler`; returns how many were removed.
    pub(crate) fn remove_all(&mut self, event: &str, handler: &Handler) -> usize {
        let Some(list) = self.by_event.get_mut(event) else {
            return 0;
        };
        let before = list.len();
        list.retain(|h| !h.same(handler));
        let removed = before - list.len();
        if list.is_empty() {
            self.by_event.remove(event);
        }
        removed
    }

    pub(crate) fn snapshot(&self, event: &str) -> Handlers {
        self.by_event.get(event).cloned().unwrap_or_default()
    }

    /// Remove the entries of `snapshot` that are still registered, one entry
    /// per snapshot occurrence, and return them in snapshot order.
    pub(crate) fn take_snapshotted(&mut self, event: &str, snapshot: &[Handler]) -> Handlers {
        let mut taken = Handlers::new();
        let Some(list) = self.by_event.get_mut(event) else {
            return taken;
        };
        for h in snapshot {
            if let Some(pos) = list.iter().position(|cur| cur.same(h)) {
                taken.push(list.remove(pos));
            }
        }
        if list.is_empty() {
            self.by_event.remove(event);
        }
        taken
    }

    pub(crate) fn len(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, |l| l.len())
    }

    pub(crate) fn event_names(&self) -> impl Iterator<Item = &str> {
        self.by_event.keys().map(String::as_str)
    }

    pub(crate) fn clear(&mut self) {
        self.by_event.clear();
    }
}
