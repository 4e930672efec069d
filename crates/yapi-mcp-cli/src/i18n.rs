// yapi-mcp-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Keep every user-facing CLI string in one place.
// Dependencies: Standard library collections
// ============================================================================

//! ## Overview
//! User-facing CLI strings live in a small catalog with English and Chinese
//! entries. Runtime output is routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The locale is set once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Simplified Chinese.
    Zh,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let lang = normalized.split(['-', '_', '.']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }
}

/// Supported locales in presentation order.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Zh];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces (for example, `path`).
    pub key: &'static str,
    /// Preformatted value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "yapi-mcp {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("input.read_failed", "Failed to read {path}: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {path} because it is {size} bytes (limit {limit}).",
    ),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config OK (source: {source})"),
    ("config.source.default", "built-in defaults"),
    ("serve.summary.header", "Starting YApi MCP server with:"),
    ("serve.init_failed", "Failed to initialize MCP server: {error}"),
    ("serve.failed", "MCP server failed: {error}"),
    ("interface.init_failed", "Failed to build YApi clients: {error}"),
    ("interface.task_failed", "Background task failed: {error}"),
    ("interface.json_invalid", "{flag} must be a JSON object: {error}"),
    ("schema.parse_failed", "Failed to parse schema in {path}: {error}"),
    ("schema.serialize_failed", "Failed to serialize payload: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'zh'."),
];

/// Chinese catalog.
const CATALOG_ZH: &[(&str, &str)] = &[
    ("main.version", "yapi-mcp {version}"),
    ("output.stream.stdout", "标准输出"),
    ("output.stream.stderr", "标准错误"),
    ("output.stream.unknown", "输出"),
    ("output.write_failed", "写入{stream}失败：{error}"),
    ("input.read_failed", "读取 {path} 失败：{error}"),
    ("input.read_too_large", "拒绝读取 {path}：文件大小 {size} 字节，超过上限 {limit}。"),
    ("config.load_failed", "加载配置失败：{error}"),
    ("config.validate.ok", "配置有效（来源：{source}）"),
    ("config.source.default", "内置默认值"),
    ("serve.summary.header", "正在启动 YApi MCP 服务，配置如下："),
    ("serve.init_failed", "MCP 服务初始化失败：{error}"),
    ("serve.failed", "MCP 服务运行失败：{error}"),
    ("interface.init_failed", "创建 YApi 客户端失败：{error}"),
    ("interface.task_failed", "后台任务失败：{error}"),
    ("interface.json_invalid", "{flag} 必须是 JSON 对象：{error}"),
    ("schema.parse_failed", "解析 {path} 中的 schema 失败：{error}"),
    ("schema.serialize_failed", "序列化请求体失败：{error}"),
    ("i18n.lang.invalid_env", "{env} 的值无效：{value}。可选值为 'en' 或 'zh'。"),
];

/// Returns the message catalog for `locale`.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ZH_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Zh => CATALOG_ZH_MAP.get_or_init(|| CATALOG_ZH.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in the current locale, substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` in `locale`, substituting `args`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        result = result.replace(&format!("{{{}}}", arg.key), &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================
