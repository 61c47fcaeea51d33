//! 数据访问层

pub mod host_repo;

pub use host_repo::{HostFile, HostRepository};
