//! 数据模型模块

pub mod host;

pub use host::{Credential, HostIdentity, HostRecord, OsClass};
