pub mod bus;
pub mod component;
pub mod config;
pub mod error;
pub mod registry;

pub use bus::global;

// emit! 宏展开时通过 $crate 引用，调用方无需直接依赖 serde_json
#[doc(hidden)]
pub use serde_json as __serde_json;

pub mod prelude {
    pub use crate::bus::{global, Bus, BusHandle, Emit};
    pub use crate::component::{ComponentBus, ComponentId};
    pub use crate::config::BusConfig;
    pub use crate::emit;
    pub use crate::error::{BusError, Result};
    pub use crate::registry::Handler;
    pub use serde_json::{json, Value};
}
