// yapi-mcp-cli/src/main.rs
// ============================================================================
// Module: YApi MCP CLI Entry Point
// Description: Command dispatcher for the YApi MCP server and offline helpers.
// Purpose: Run the server, fetch or debug one interface, and inspect schemas.
// Dependencies: clap, dotenvy, tokio, yapi-mcp, yapi-mcp-config, yapi-schema
// ============================================================================

//! ## Overview
//! `yapi-mcp serve` starts the MCP server on stdio, HTTP, or SSE. The
//! `interface` commands run the same tools once from the shell, and the
//! `schema` commands render or synthesize from a schema file without any
//! network access. A `.env` file in the working directory is loaded before
//! configuration. All user-facing strings go through the i18n catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use yapi_mcp::DocumentComposer;
use yapi_mcp::McpServer;
use yapi_mcp::McpServerError;
use yapi_mcp::ToolCallResult;
use yapi_mcp::ToolName;
use yapi_mcp::ToolRouter;
use yapi_mcp::build_log_sink;
use yapi_mcp_cli::i18n::Locale;
use yapi_mcp_cli::i18n::set_locale;
use yapi_mcp_cli::t;
use yapi_mcp_config::ServerTransport;
use yapi_mcp_config::YapiMcpConfig;
use yapi_schema::MAX_SCHEMA_DEPTH;
use yapi_schema::PayloadSynthesizer;
use yapi_schema::SchemaNode;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a schema file read by the `schema` commands.
const MAX_SCHEMA_FILE_BYTES: usize = 4 * 1024 * 1024;
/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "YAPI_MCP_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "yapi-mcp", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `YAPI_MCP_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the MCP server.
    Serve(ServeCommand),
    /// Fetch or debug a single interface.
    Interface {
        /// Selected interface subcommand.
        #[command(subcommand)]
        command: InterfaceCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Offline schema utilities.
    Schema {
        /// Selected schema subcommand.
        #[command(subcommand)]
        command: SchemaCommand,
    },
}

/// Arguments for `serve`.
#[derive(Args, Debug, Default)]
struct ServeCommand {
    /// Optional config file path (defaults to yapi-mcp.toml or `YAPI_MCP_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Serve over stdin/stdout (shorthand for `--transport stdio`).
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "transport")]
    stdio: bool,
    /// Transport override.
    #[arg(long, value_enum, value_name = "TRANSPORT")]
    transport: Option<TransportArg>,
    /// Bind address override for HTTP and SSE.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Transport selections for `serve`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum TransportArg {
    /// stdin/stdout.
    Stdio,
    /// HTTP JSON-RPC.
    Http,
    /// HTTP with SSE responses.
    Sse,
}

impl From<TransportArg> for ServerTransport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Self::Stdio,
            TransportArg::Http => Self::Http,
            TransportArg::Sse => Self::Sse,
        }
    }
}

/// Interface subcommands.
#[derive(Subcommand, Debug)]
enum InterfaceCommand {
    /// Print the interface document.
    Show(InterfaceShowCommand),
    /// Replay the interface against the debug host and print the result.
    Debug(InterfaceDebugCommand),
}

/// Interface selection shared by the interface subcommands.
#[derive(Args, Debug)]
struct InterfaceTarget {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// YApi project id.
    #[arg(long, value_name = "ID")]
    project_id: String,
    /// YApi interface id.
    #[arg(long, value_name = "ID")]
    interface_id: String,
}

/// Arguments for `interface show`.
#[derive(Args, Debug)]
struct InterfaceShowCommand {
    /// Interface selection.
    #[command(flatten)]
    target: InterfaceTarget,
}

/// Arguments for `interface debug`.
#[derive(Args, Debug)]
struct InterfaceDebugCommand {
    /// Interface selection.
    #[command(flatten)]
    target: InterfaceTarget,
    /// Query parameter overrides as a JSON object.
    #[arg(long, value_name = "JSON")]
    query: Option<String>,
    /// Request body override as a JSON object.
    #[arg(long, value_name = "JSON")]
    body: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, then print a redacted summary.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Schema subcommands.
#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Render the field table for a schema file.
    Table(SchemaFileCommand),
    /// Synthesize a request body from a schema file.
    Mock(SchemaFileCommand),
}

/// Arguments for the schema subcommands.
#[derive(Args, Debug)]
struct SchemaFileCommand {
    /// Path to a JSON schema document.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Maximum nesting depth to expand.
    #[arg(long, value_name = "N", default_value_t = MAX_SCHEMA_DEPTH)]
    max_depth: usize,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Simplified Chinese.
    Zh,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Zh => Self::Zh,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let _ = dotenvy::dotenv_override();
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    set_locale(resolve_locale(cli.lang, env_lang.as_deref())?);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Interface {
            command,
        } => command_interface(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Schema {
            command,
        } => command_schema(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    apply_serve_overrides(&mut config, &command);
    if config.server.transport != ServerTransport::Stdio {
        let mut banner = t!("serve.summary.header");
        banner.push('\n');
        banner.push_str(config.redacted_summary().trim_end());
        write_stderr_line(&banner).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    server
        .serve()
        .await
        .map_err(|err: McpServerError| CliError::new(t!("serve.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Applies `--stdio`, `--transport`, and `--bind` onto the loaded config.
fn apply_serve_overrides(config: &mut YapiMcpConfig, command: &ServeCommand) {
    if command.stdio {
        config.server.transport = ServerTransport::Stdio;
    } else if let Some(transport) = command.transport {
        config.server.transport = transport.into();
    }
    if let Some(bind) = &command.bind {
        config.server.bind = Some(bind.clone());
    }
}

// ============================================================================
// SECTION: Interface Commands
// ============================================================================

/// Executes the `interface` subcommands through the tool router.
async fn command_interface(command: InterfaceCommand) -> CliResult<ExitCode> {
    let (target, tool, arguments) = match command {
        InterfaceCommand::Show(command) => {
            let arguments = tool_arguments(&command.target);
            (command.target, ToolName::GetInterface, arguments)
        }
        InterfaceCommand::Debug(command) => {
            let mut arguments = tool_arguments(&command.target);
            if let Some(query) = command.query.as_deref() {
                arguments.insert(
                    "debugQueryParams".to_string(),
                    Value::Object(parse_json_object("--query", query)?),
                );
            }
            if let Some(body) = command.body.as_deref() {
                arguments.insert(
                    "debugBodyParams".to_string(),
                    Value::Object(parse_json_object("--body", body)?),
                );
            }
            (command.target, ToolName::DebugApi, arguments)
        }
    };
    let config = load_config(target.config.as_deref())?;
    let result =
        tokio::task::spawn_blocking(move || run_tool(&config, tool, Value::Object(arguments)))
            .await
            .map_err(|err| CliError::new(t!("interface.task_failed", error = err)))??;
    if result.is_error == Some(true) {
        return Err(CliError::new(result.first_text().to_string()));
    }
    write_stdout_bytes(result.first_text().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Tool arguments identifying one interface.
fn tool_arguments(target: &InterfaceTarget) -> Map<String, Value> {
    let mut arguments = Map::new();
    arguments.insert("projectId".to_string(), Value::String(target.project_id.clone()));
    arguments.insert("interfaceId".to_string(), Value::String(target.interface_id.clone()));
    arguments
}

/// Builds the router and runs one tool call on the current thread.
fn run_tool(config: &YapiMcpConfig, tool: ToolName, arguments: Value) -> CliResult<ToolCallResult> {
    let log = build_log_sink(&config.logging)
        .map_err(|err| CliError::new(t!("interface.init_failed", error = err)))?;
    let router = ToolRouter::from_config(config, log)
        .map_err(|err| CliError::new(t!("interface.init_failed", error = err)))?;
    router.handle_tool_call(tool.as_str(), arguments).map_err(|err| CliError::new(err.to_string()))
}

/// Parses a flag value that must be a JSON object.
fn parse_json_object(flag: &str, text: &str) -> CliResult<Map<String, Value>> {
    let invalid = |error: String| CliError::new(t!("interface.json_invalid", flag = flag, error = error));
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid(format!("found {}", json_kind(&other)))),
        Err(err) => Err(invalid(err.to_string())),
    }
}

/// Short name of a JSON value kind.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config` subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            let config = load_config(command.config.as_deref())?;
            let source = config.source.as_ref().map_or_else(
                || t!("config.source.default"),
                |path| path.display().to_string(),
            );
            let mut output = t!("config.validate.ok", source = source);
            output.push('\n');
            output.push_str(&config.redacted_summary());
            write_stdout_bytes(output.as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration from `path`, the environment, and defaults.
fn load_config(path: Option<&Path>) -> CliResult<YapiMcpConfig> {
    YapiMcpConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Schema Commands
// ============================================================================

/// Executes the `schema` subcommands.
fn command_schema(command: SchemaCommand) -> CliResult<ExitCode> {
    match command {
        SchemaCommand::Table(command) => {
            let schema = read_schema(&command.file)?;
            let table = DocumentComposer::new(command.max_depth).field_table(&schema);
            write_stdout_bytes(table.as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        SchemaCommand::Mock(command) => {
            let schema = read_schema(&command.file)?;
            let payload = PayloadSynthesizer::new(command.max_depth).synthesize(&schema).into_json();
            let text = serde_json::to_string_pretty(&payload)
                .map_err(|err| CliError::new(t!("schema.serialize_failed", error = err)))?;
            write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads and parses a schema file.
fn read_schema(path: &Path) -> CliResult<SchemaNode> {
    let bytes = read_bytes_with_limit(path, MAX_SCHEMA_FILE_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(t!("input.read_failed", path = path.display(), error = err))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            path = path.display(),
            size = size,
            limit = limit
        )),
    })?;
    let text = String::from_utf8(bytes).map_err(|err| {
        CliError::new(t!("schema.parse_failed", path = path.display(), error = err))
    })?;
    SchemaNode::parse(&text)
        .map_err(|err| CliError::new(t!("schema.parse_failed", path = path.display(), error = err)))
}

// ============================================================================
// SECTION: File Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Resolves the CLI locale from the flag, then the environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang.filter(|value| !value.trim().is_empty()) {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
