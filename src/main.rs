//! Binary entry point for the docreflect CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Effective doc comment of a function
//! docreflect --source facts/source.json --native facts/native.json \
//!     --stub-dir stubs function 'App\helper'
//!
//! # A method as seen from inside another class
//! docreflect method 'App\Child' run --from 'App\Child'
//!
//! # Ancestor chain of a class
//! docreflect hierarchy 'App\Child'
//! ```
//!
//! Every result and every error is a single JSON document on stdout.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use docreflect::config::{CliOverrides, ResolvedConfig};
use docreflect::error::{DocReflectError, OutputErrorCode};
use docreflect::loader::load_registry;
use docreflect::output::{
    emit_response, ClassInfo, ClassResponse, ErrorResponse, FunctionResponse, HierarchyResponse,
    MethodResponse,
};
use docreflect::{AccessScope, CallerScope, ReflectionProvider, SymbolKey};

// ============================================================================
// CLI Structure
// ============================================================================

/// Resolve effective declarations and doc comments.
///
/// Facts come from JSON fact files loaded as source, native or stub
/// producers. All output is JSON.
#[derive(Parser, Debug)]
#[command(
    name = "docreflect",
    version,
    about = "Resolve effective declarations and doc comments"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Project config file (default: docreflect.json in the current directory).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fact file produced from user source. Repeatable.
    #[arg(long = "source", global = true, value_name = "FILE")]
    source_facts: Vec<PathBuf>,

    /// Fact file produced by runtime introspection. Repeatable.
    #[arg(long = "native", global = true, value_name = "FILE")]
    native_facts: Vec<PathBuf>,

    /// Stub overlay fact file. Repeatable.
    #[arg(long = "stubs", global = true, value_name = "FILE")]
    stub_files: Vec<PathBuf>,

    /// Directory scanned recursively for stub fact files. Repeatable.
    #[arg(long = "stub-dir", global = true, value_name = "DIR")]
    stub_dirs: Vec<PathBuf>,

    /// Disable the resolution cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Skip class hierarchy cycle validation when building the registry.
    #[arg(long, global = true)]
    no_validate_hierarchy: bool,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

impl GlobalArgs {
    fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            config_file: self.config.clone(),
            source_facts: self.source_facts.clone(),
            native_facts: self.native_facts.clone(),
            stub_files: self.stub_files.clone(),
            stub_dirs: self.stub_dirs.clone(),
            cache: self.no_cache.then_some(false),
            validate_hierarchy: self.no_validate_hierarchy.then_some(false),
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a function.
    Function {
        /// Function name, optionally with a leading `\`.
        name: String,
    },
    /// Resolve a class.
    Class {
        /// Class name, optionally with a leading `\`.
        name: String,
    },
    /// Resolve a method as seen from a caller scope.
    Method {
        /// Class the lookup starts at.
        class: String,
        /// Method name.
        method: String,
        /// Caller's class (default: global scope).
        #[arg(long, value_name = "CLASS")]
        from: Option<String>,
    },
    /// Print a class's ancestor chain.
    Hierarchy {
        /// Class name.
        class: String,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like results.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), DocReflectError> {
    validate_names(&cli.command)?;

    let working_dir = std::env::current_dir().map_err(|e| {
        DocReflectError::internal(format!("cannot determine working directory: {}", e))
    })?;
    let config = ResolvedConfig::resolve(&working_dir, &cli.global.to_overrides())?;
    if config.source_facts.is_empty()
        && config.native_facts.is_empty()
        && config.stub_files.is_empty()
        && config.stub_dirs.is_empty()
    {
        return Err(DocReflectError::invalid_args(concat!(
            "no fact files configured ",
            "(use --source, --native, --stubs, --stub-dir or docreflect.json)"
        )));
    }

    let registry = load_registry(&config)?;
    let provider = ReflectionProvider::with_options(Arc::new(registry), config.provider_options());
    info!(
        cache = config.cache.value,
        validate_hierarchy = config.validate_hierarchy.value,
        "reflection provider ready"
    );

    let mut stdout = io::stdout();
    let emitted = match cli.command {
        Command::Function { name } => {
            let function = provider.get_function(&name)?;
            emit_response(&FunctionResponse::new(function), &mut stdout)
        }
        Command::Class { name } => {
            let class = provider.get_class(&name)?;
            emit_response(
                &ClassResponse::new(ClassInfo::from_reflection(&class)),
                &mut stdout,
            )
        }
        Command::Method {
            class,
            method,
            from,
        } => {
            let scope = match from {
                Some(caller) => CallerScope::in_class(caller),
                None => CallerScope::global(),
            };
            let reflection = provider.get_class(&class)?;
            let resolved = reflection.get_method(&method, &scope)?;
            emit_response(
                &MethodResponse::new(reflection.name(), scope.describe(), resolved),
                &mut stdout,
            )
        }
        Command::Hierarchy { class } => {
            let ancestors = provider.registry().class_hierarchy_of(&class)?;
            let name = provider.get_class(&class)?.name().to_string();
            emit_response(&HierarchyResponse::new(name, ancestors), &mut stdout)
        }
    };

    emitted.map_err(|e| DocReflectError::internal(format!("failed to write output: {}", e)))
}

/// Reject blank symbol names before touching the filesystem.
fn validate_names(command: &Command) -> Result<(), DocReflectError> {
    let names: Vec<(&str, &str)> = match command {
        Command::Function { name } => vec![("function", name.as_str())],
        Command::Class { name } => vec![("class", name.as_str())],
        Command::Method {
            class,
            method,
            from,
        } => {
            let mut names = vec![("class", class.as_str()), ("method", method.as_str())];
            if let Some(from) = from {
                names.push(("--from", from.as_str()));
            }
            names
        }
        Command::Hierarchy { class } => vec![("class", class.as_str())],
    };

    for (what, name) in names {
        if SymbolKey::new(name).is_empty() {
            return Err(DocReflectError::invalid_args(format!(
                "{} name must not be empty",
                what
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
