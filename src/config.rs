use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// 写入每条日志的 `bus` 字段，用于区分多个总线实例
    pub name: String,
    /// 开启后 publish 对每个处理器调用输出一条 trace 日志
    pub trace_dispatch: bool,
}

pub const BUS_DEFAULT_NAME: &str = "global";

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: BUS_DEFAULT_NAME.to_string(),
            trace_dispatch: false,
        }
    }
}

impl BusConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a config from JSON; missing fields fall back to their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
