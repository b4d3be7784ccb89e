//! 事件总线统一错误类型：手写枚举，不引入额外的错误派生依赖。
use std::{error::Error as StdError, fmt};

#[derive(Debug)]
pub enum BusError {
    /// 处理器在 publish 期间返回错误；同一次 publish 中后续处理器不再执行
    Handler {
        event: String,
        source: anyhow::Error,
    },
    Config(serde_json::Error), // BusConfig 解析失败
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Handler { event, source } => {
                write!(f, "handler for event '{event}' failed: {source}")
            }
            BusError::Config(e) => write!(f, "invalid bus config: {e}"),
        }
    }
}

impl StdError for BusError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BusError::Handler { source, .. } => Some(&**source),
            BusError::Config(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for BusError {
    fn from(e: serde_json::Error) -> Self {
        BusError::Config(e)
    }
}

pub type Result<T = ()> = std::result::Result<T, BusError>;
