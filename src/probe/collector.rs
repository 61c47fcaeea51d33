//! 系统信息采集
//!
//! 每个 OS 类别有一张固定探针表，每个探针是一条远程命令。
//! 单个探针失败写入错误标记，不影响其余探针。

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::host::OsClass;
use crate::probe::ProbeResult;
use crate::ssh::executor::capture_output;
use crate::ssh::transport::RemoteConnection;

/// 单个探针：结果键 + 远程命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub key: &'static str,
    pub command: &'static str,
}

const fn probe(key: &'static str, command: &'static str) -> Probe {
    Probe { key, command }
}

const LINUX_PROBES: &[Probe] = &[
    probe("hostname", "hostname"),
    probe(
        "os",
        "cat /etc/os-release | grep PRETTY_NAME | cut -d'=' -f2 | tr -d '\"'",
    ),
    probe("kernel", "uname -r"),
    probe("uptime", "uptime -p"),
    probe(
        "cpu",
        "cat /proc/cpuinfo | grep 'model name' | head -1 | cut -d':' -f2 | sed 's/^ *//'",
    ),
    probe("memory", "free -h | grep Mem | awk '{print $2}'"),
    probe("disk", "df -h / | tail -1 | awk '{print $2 \" (\" $5 \" used)\"}'"),
    probe("load", "cat /proc/loadavg | awk '{print $1, $2, $3}'"),
];

const WINDOWS_PROBES: &[Probe] = &[
    probe("hostname", "hostname"),
    probe(
        "os",
        "powershell \"(Get-WmiObject -Class Win32_OperatingSystem).Caption\"",
    ),
    probe(
        "version",
        "powershell \"(Get-WmiObject -Class Win32_OperatingSystem).Version\"",
    ),
    probe(
        "uptime",
        "powershell \"((Get-Date) - (Get-WmiObject Win32_OperatingSystem).ConvertToDateTime((Get-WmiObject Win32_OperatingSystem).LastBootUpTime)).Days.ToString() + ' days'\"",
    ),
    probe(
        "cpu",
        "powershell \"(Get-WmiObject -Class Win32_Processor | Select-Object -First 1).Name\"",
    ),
    probe(
        "memory",
        "powershell \"[math]::Round((Get-WmiObject -Class Win32_ComputerSystem).TotalPhysicalMemory/1GB, 2).ToString() + ' GB'\"",
    ),
    probe(
        "disk",
        "powershell \"$disk = Get-WmiObject -Class Win32_LogicalDisk -Filter 'DriveType=3' | Where-Object {$_.DeviceID -eq 'C:'}; [math]::Round($disk.Size/1GB, 2).ToString() + ' GB (Free: ' + [math]::Round($disk.FreeSpace/1GB, 2).ToString() + ' GB)'\"",
    ),
    probe("architecture", "powershell \"$env:PROCESSOR_ARCHITECTURE\""),
];

/// 按 OS 类别返回探针表
pub fn probe_table(os: OsClass) -> &'static [Probe] {
    match os {
        OsClass::Linux => LINUX_PROBES,
        OsClass::Windows => WINDOWS_PROBES,
    }
}

/// 依次执行全部探针，每个探针一个会话
pub async fn collect<C: RemoteConnection>(
    connection: &mut C,
    os: OsClass,
    command_timeout: Option<Duration>,
) -> ProbeResult {
    let table = probe_table(os);
    let mut result = ProbeResult::new();

    info!(remote = %connection.target(), os = %os, probes = table.len(), "Gathering system information");

    for probe in table {
        match capture_output(connection, probe.command, command_timeout).await {
            Ok(output) => {
                debug!(probe = probe.key, "Probe succeeded");
                result.insert(probe.key, output.trim());
            }
            Err(e) => {
                warn!(probe = probe.key, error = %e, "Probe failed");
                result.insert(probe.key, format!("Error: {}", e));
            }
        }
    }

    result
}
