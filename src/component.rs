use serde_json::Value;
use std::{any::Any, fmt, mem};
use uuid::Uuid;

use crate::{
    bus::{BusHandle, Emit},
    error::Result,
    registry::Handler,
};

/// 组件实例标识：名称供日志阅读，uuid 区分同名实例
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ComponentId {
    pub name: String,
    pub uuid: Uuid,
}

impl ComponentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, &self.uuid.simple().to_string()[..8])
    }
}

/// Component-scoped view of a bus.
///
/// Every registration made through it is remembered; [`ComponentBus::teardown`]
/// unsubscribes all of them. The owning component holds this value as a field,
/// so dropping the component tears its registrations down as well.
pub struct ComponentBus {
    id: ComponentId,
    bus: BusHandle,
    on: Vec<(String, Handler)>,
    once: Vec<(String, Handler)>,
}

impl fmt::Debug for ComponentBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBus")
            .field("id", &self.id)
            .field("bus", &self.bus)
            .field("on", &self.on.len())
            .field("once", &self.once.len())
            .finish()
    }
}

impl ComponentBus {
    pub fn new(name: impl Into<String>, bus: BusHandle) -> Self {
        Self {
            id: ComponentId::new(name),
            bus,
            on: Vec::new(),
            once: Vec::new(),
        }
    }

    /// Attach to the process-wide bus.
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, crate::bus::global().clone())
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn bus(&self) -> &BusHandle {
        &self.bus
    }

    pub fn on(&mut self, event: &str, handler: Handler) -> Handler {
        self.bus.subscribe(event, handler.clone());
        self.on.push((event.to_string(), handler.clone()));
        handler
    }

    pub fn once(&mut self, event: &str, handler: Handler) -> Handler {
        self.bus.subscribe_once(event, handler.clone());
        self.once.push((event.to_string(), handler.clone()));
        handler
    }

    // 被拒绝的值不进入记录
    pub fn on_dyn(
        &mut self,
        event: &str,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Option<Handler> {
        let h = self.bus.subscribe_dyn(event, candidate)?;
        self.on.push((event.to_string(), h.clone()));
        Some(h)
    }

    pub fn once_dyn(
        &mut self,
        event: &str,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Option<Handler> {
        let h = self.bus.subscribe_once_dyn(event, candidate)?;
        self.once.push((event.to_string(), h.clone()));
        Some(h)
    }

    /// 直接转发给总线；记录中的条目保留，teardown 时重复退订为空操作
    pub fn off(&self, event: &str, handler: &Handler) {
        self.bus.unsubscribe(event, handler);
    }

    pub fn emit(&self, event: &str, args: &[Value]) -> Result<()> {
        self.bus.publish(event, args)
    }

    /// Lengths of the (persistent, one-shot) registration records.
    pub fn registrations(&self) -> (usize, usize) {
        (self.on.len(), self.once.len())
    }

    /// Unsubscribe everything registered through this component. Safe to call
    /// more than once; later calls find empty records.
    pub fn teardown(&mut self) {
        let on = mem::take(&mut self.on);
        let once = mem::take(&mut self.once);
        if on.is_empty() && once.is_empty() {
            return;
        }
        tracing::debug!(component = %self.id, bus = %self.bus.name(), on = on.len(), once = once.len(), "tearing down registrations");
        for (event, h) in on.iter().chain(once.iter()) {
            self.bus.unsubscribe(event, h);
        }
    }
}

impl Emit for ComponentBus {
    fn emit_args(&self, event: &str, args: &[Value]) -> Result<()> {
        self.emit(event, args)
    }
}

impl Drop for ComponentBus {
    fn drop(&mut self) {
        self.teardown();
    }
}
