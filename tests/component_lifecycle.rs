use mmg_eventbus::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

type Seen = Arc<Mutex<Vec<&'static str>>>;

fn tag(seen: &Seen, name: &'static str) -> Handler {
    let seen = seen.clone();
    Handler::infallible(move |_| seen.lock().push(name))
}

#[test]
fn teardown_of_one_owner_leaves_the_other() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    let mut a = ComponentBus::new("a", bus.clone());
    let mut b = ComponentBus::new("b", bus.clone());
    a.on("tick", tag(&seen, "a"));
    b.on("tick", tag(&seen, "b"));
    a.teardown();
    bus.publish("tick", &[]).expect("publish");
    assert_eq!(*seen.lock(), vec!["b"]);
}

#[test]
fn dropping_the_owner_unsubscribes() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    {
        let mut c = ComponentBus::new("scoped", bus.clone());
        c.on("e", tag(&seen, "on"));
        c.once("e", tag(&seen, "once"));
        assert_eq!(bus.listener_count("e"), 2);
    }
    assert_eq!(bus.listener_count("e"), 0);
    bus.publish("e", &[]).expect("publish");
    assert!(seen.lock().is_empty());
}

// 组件以字段形式持有 ComponentBus，组件析构即完成清理
struct Widget {
    bus: ComponentBus,
    clicks: Seen,
}

impl Widget {
    fn mount(bus: BusHandle) -> Self {
        let clicks: Seen = Default::default();
        let mut cb = ComponentBus::new("widget", bus);
        cb.on("click", tag(&clicks, "click"));
        Self { bus: cb, clicks }
    }
}

#[test]
fn component_struct_cleans_up_on_drop() {
    let bus = Bus::default().handle();
    let w = Widget::mount(bus.clone());
    emit!(w.bus, "click").expect("publish");
    let clicks = w.clicks.clone();
    drop(w);
    bus.publish("click", &[]).expect("publish");
    assert_eq!(*clicks.lock(), vec!["click"]);
    assert!(!bus.has_listeners("click"));
}

#[test]
fn teardown_is_idempotent() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    let mut c = ComponentBus::new("c", bus.clone());
    c.on("e", tag(&seen, "c"));
    c.teardown();
    c.teardown();
    assert_eq!(c.registrations(), (0, 0));
    bus.publish("e", &[]).expect("publish");
    assert!(seen.lock().is_empty());
}

#[test]
fn off_leaves_record_and_teardown_stays_harmless() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    let mut c = ComponentBus::new("c", bus.clone());
    let h = c.on("e", tag(&seen, "c"));
    c.off("e", &h);
    assert_eq!(c.registrations(), (1, 0));
    assert!(!bus.has_listeners("e"));
    c.teardown();
    assert_eq!(c.registrations(), (0, 0));
}

#[test]
fn teardown_does_not_touch_foreign_registrations_of_same_handler_elsewhere() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    let mut c = ComponentBus::new("c", bus.clone());
    c.on("mine", tag(&seen, "mine"));
    bus.subscribe("other", tag(&seen, "other"));
    c.teardown();
    bus.publish("other", &[]).expect("publish");
    assert_eq!(*seen.lock(), vec!["other"]);
}

#[test]
fn once_through_owner_fires_once_then_teardown_is_noop() {
    let bus = Bus::default().handle();
    let seen: Seen = Default::default();
    let mut c = ComponentBus::new("c", bus.clone());
    c.once("ready", tag(&seen, "ready"));
    c.emit("ready", &[]).expect("publish");
    c.emit("ready", &[]).expect("publish");
    assert_eq!(c.registrations(), (0, 1));
    c.teardown();
    assert_eq!(*seen.lock(), vec!["ready"]);
}

#[test]
fn component_ids_are_unique_per_instance() {
    let bus = Bus::default().handle();
    let a = ComponentBus::new("same", bus.clone());
    let b = ComponentBus::new("same", bus);
    assert_eq!(a.id().name, b.id().name);
    assert_ne!(a.id(), b.id());
    assert!(a.id().to_string().starts_with("same#"));
}
