//! 组件生命周期示例：两个组件订阅同一事件，销毁其中一个后只剩另一个响应

use mmg_eventbus::prelude::*;

struct Panel {
    bus: ComponentBus,
}

impl Panel {
    fn mount(name: &'static str) -> Self {
        let mut bus = ComponentBus::global(name);
        bus.on(
            "theme.changed",
            Handler::infallible(move |args| {
                tracing::info!(target = "demo.panel", panel = name, theme = ?args.first(), "theme applied");
            }),
        );
        bus.once(
            "app.ready",
            Handler::infallible(move |_| tracing::info!(target = "demo.panel", panel = name, "ready")),
        );
        Self { bus }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let sidebar = Panel::mount("sidebar");
    let editor = Panel::mount("editor");

    emit!(editor.bus, "app.ready")?;
    emit!(global(), "app.ready")?; // 一次性处理器已消费
    emit!(global(), "theme.changed", "dark")?;

    drop(sidebar);
    emit!(global(), "theme.changed", "light")?;

    tracing::info!(events = ?global().event_names(), "remaining registrations");
    Ok(())
}
