//! Schema Factory CLI
//!
//! Command-line interface for resolving model types into OpenAPI schemas and
//! validating instances against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_factory::{
    load_json, load_model, load_overrides_str, resolve_all, resolve_type, validate,
    FactoryOptions, OverrideMap, TypeIndex, ValidateError,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-factory")]
#[command(about = "Resolve model types into OpenAPI schemas")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    wrappers: WrapperArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct WrapperArgs {
    /// Extra generic type treated as an async wrapper (unwrapped to its argument)
    #[arg(long = "async-wrapper", global = true)]
    async_wrappers: Vec<String>,

    /// Extra generic type treated as a collection (resolved as an array)
    #[arg(long = "collection-wrapper", global = true)]
    collection_wrappers: Vec<String>,

    /// Extra type that never produces a schema
    #[arg(long = "opaque", global = true)]
    opaque_types: Vec<String>,
}

impl WrapperArgs {
    fn options(&self) -> FactoryOptions {
        let mut options = FactoryOptions::default();
        for base in &self.async_wrappers {
            options = options.async_wrapper(base.clone());
        }
        for base in &self.collection_wrappers {
            options = options.collection_wrapper(base.clone());
        }
        for name in &self.opaque_types {
            options = options.opaque_type(name.clone());
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one type (with optional position overrides) to a schema document
    Resolve {
        /// Model file describing the types
        model: PathBuf,

        /// Type expression to resolve (e.g. Pet, Pet[], Page<Pet>)
        #[arg(long = "type", short = 't')]
        type_expr: String,

        /// Position overrides as a JSON object
        #[arg(long)]
        overrides: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve every type of a model into a components section
    Components {
        /// Model file describing the types
        model: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a JSON instance against a resolved type
    Validate {
        /// Model file describing the types
        model: PathBuf,

        /// Type expression to validate against
        #[arg(long = "type", short = 't')]
        type_expr: String,

        /// Instance file to validate
        instance: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.wrappers.options();

    let result = match cli.command {
        Commands::Resolve {
            model,
            type_expr,
            overrides,
            output,
            pretty,
        } => run_resolve(
            &model,
            &type_expr,
            overrides.as_deref(),
            &options,
            output,
            pretty,
        ),

        Commands::Components {
            model,
            output,
            pretty,
        } => run_components(&model, &options, output, pretty),

        Commands::Validate {
            model,
            type_expr,
            instance,
            json,
        } => run_validate(&model, &type_expr, &instance, &options, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_resolve(
    model: &Path,
    type_expr: &str,
    overrides: Option<&str>,
    options: &FactoryOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let index = load_index(model)?;
    let ty = index.parse_type(type_expr).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let overrides = parse_overrides(overrides, &index)?;

    let document = resolve_type(&index, &ty, overrides.as_ref(), options).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    write_output(&document, output, pretty)
}

fn run_components(
    model: &Path,
    options: &FactoryOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let index = load_index(model)?;
    let components = resolve_all(&index, options).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    write_output(&components, output, pretty)
}

fn run_validate(
    model: &Path,
    type_expr: &str,
    instance_path: &Path,
    options: &FactoryOptions,
    json_output: bool,
) -> Result<(), u8> {
    let index = load_model(model).map_err(|e| {
        report_error(json_output, &format!("loading model: {}", e));
        e.exit_code() as u8
    })?;
    let ty = index.parse_type(type_expr).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;
    let instance = load_json(instance_path).map_err(|e| {
        report_error(json_output, &format!("loading instance: {}", e));
        e.exit_code() as u8
    })?;

    let document = resolve_type(&index, &ty, None, options).map_err(|e| {
        report_error(json_output, &e.to_string());
        2u8
    })?;

    match validate(&document, &instance) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn load_index(model: &Path) -> Result<TypeIndex, u8> {
    load_model(model).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn parse_overrides(overrides: Option<&str>, index: &TypeIndex) -> Result<Option<OverrideMap>, u8> {
    let Some(content) = overrides else {
        return Ok(None);
    };
    load_overrides_str(content, index).map(Some).map_err(|e| {
        eprintln!("Error: invalid overrides: {}", e);
        e.exit_code() as u8
    })
}

fn write_output<T: Serialize>(value: &T, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
