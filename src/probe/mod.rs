//! 系统信息探针：采集与展示

pub mod collector;
pub mod presenter;

pub use collector::{collect, probe_table, Probe};
pub use presenter::{display_fields, heading, present, InfoLine};

use std::collections::BTreeMap;

/// 探针结果：探针键 -> 去除首尾空白后的值或 "Error: ..." 标记
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    values: BTreeMap<String, String>,
}

impl ProbeResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProbeResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut result = ProbeResult::new();
        for (key, value) in iter {
            result.insert(key, value);
        }
        result
    }
}
