//! 命令行构建与参数转义

use std::borrow::Cow;

use crate::models::host::OsClass;

/// 需要转义的 shell 元字符
const SHELL_METACHARACTERS: &[char] = &[
    ' ', '\t', '\n', '\r', ';', '|', '&', '<', '>', '(', ')', '{', '}', '[', ']', '$', '`', '"',
    '\'', '\\', '*', '?',
];

/// 参数拼接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeStyle {
    /// POSIX shell 单引号转义
    Posix,
    /// 原样拼接（Windows 远端不做转义）
    Verbatim,
}

impl EscapeStyle {
    pub fn for_os(os: OsClass) -> Self {
        match os {
            OsClass::Linux => EscapeStyle::Posix,
            OsClass::Windows => EscapeStyle::Verbatim,
        }
    }
}

/// 转义单个参数，防止 shell 注入
///
/// 含元字符的参数整体用单引号包围，内部的 `'` 替换为 `'"'"'`；
/// 其余参数原样返回。
pub fn escape(arg: &str) -> Cow<'_, str> {
    if arg.contains(SHELL_METACHARACTERS) {
        Cow::Owned(format!("'{}'", arg.replace('\'', "'\"'\"'")))
    } else {
        Cow::Borrowed(arg)
    }
}

/// 构建完整的远程命令行
pub fn build_command(command: &str, args: &[String], style: EscapeStyle) -> String {
    let mut line = String::from(command);
    for arg in args {
        line.push(' ');
        match style {
            EscapeStyle::Posix => line.push_str(&escape(arg)),
            EscapeStyle::Verbatim => line.push_str(arg),
        }
    }
    line
}
