//! 系统信息展示
//!
//! 按 OS 固定顺序输出字段；结果中缺失或为空的字段直接跳过

use std::fmt;

use crate::models::host::OsClass;
use crate::probe::ProbeResult;

const LINUX_FIELDS: &[(&str, &str)] = &[
    ("hostname", "Hostname"),
    ("os", "Operating System"),
    ("kernel", "Kernel Version"),
    ("uptime", "Uptime"),
    ("cpu", "CPU"),
    ("memory", "Total Memory"),
    ("disk", "Root Disk"),
    ("load", "Load Average"),
];

const WINDOWS_FIELDS: &[(&str, &str)] = &[
    ("hostname", "Computer Name"),
    ("os", "Operating System"),
    ("version", "OS Version"),
    ("architecture", "Architecture"),
    ("uptime", "Uptime"),
    ("cpu", "CPU"),
    ("memory", "Total Memory"),
    ("disk", "C: Drive"),
];

/// 展示字段顺序：(探针键, 标签)
pub fn display_fields(os: OsClass) -> &'static [(&'static str, &'static str)] {
    match os {
        OsClass::Linux => LINUX_FIELDS,
        OsClass::Windows => WINDOWS_FIELDS,
    }
}

/// 一行展示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub label: &'static str,
    pub value: String,
}

impl fmt::Display for InfoLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16}: {}", self.label, self.value)
    }
}

pub fn present(result: &ProbeResult, os: OsClass) -> Vec<InfoLine> {
    display_fields(os)
        .iter()
        .filter_map(|&(key, label)| {
            let value = result.get(key)?.trim();
            (!value.is_empty()).then(|| InfoLine {
                label,
                value: value.to_string(),
            })
        })
        .collect()
}

/// 标题及等长下划线
pub fn heading(os: OsClass) -> [String; 2] {
    let title = match os {
        OsClass::Linux => "Linux System Information:",
        OsClass::Windows => "Windows System Information:",
    };
    [title.to_string(), "=".repeat(title.len())]
}
