use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde_json::json;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::builder::BuilderError;
use crate::config::{self, Config};
use crate::events::{Event, EventBus};
use crate::registry::FieldRegistry;
use crate::tree::Tree;
use crate::validate;
use crate::wire::{self, legacy};

use super::completions;
use super::edit;
use super::exit_codes;
use super::output::{self, ErrorData, FieldData, FilterData, IssueData, OutputMode};

#[derive(Parser)]
#[command(name = "qtree")]
#[command(about = "Build, validate and normalize nested AND/OR filter payloads")]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides QTREE_CONFIG env var and default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the fields of the configured catalog
    Fields,

    /// List the operator catalog, or the operators of one field
    Operators {
        /// Only list operators valid for this field
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Check a filter payload against the field catalog
    Validate {
        /// Payload: inline JSON, a file path, or - for stdin
        payload: String,

        /// Payload is in the legacy base64 format
        #[arg(long)]
        legacy: bool,
    },

    /// Print the canonical form of a filter payload
    Normalize {
        /// Payload: inline JSON, a file path, or - for stdin
        payload: String,

        /// Payload is in the legacy base64 format
        #[arg(long)]
        legacy: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Replay an edit script against a payload, printing one event per change
    Edit {
        /// Starting payload: inline JSON, a file path, or - for stdin
        payload: String,

        /// Edit script: a JSON array of intents (inline, file path, or -)
        #[arg(short, long)]
        script: String,

        /// Only print events matching these patterns (e.g. "filter.*", "filter.applied")
        #[arg(short, long, action = clap::ArgAction::Append)]
        events: Vec<String>,
    },

    /// Convert from and to the legacy base64 filter format
    Legacy {
        #[command(subcommand)]
        command: LegacyCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum LegacyCommands {
    /// Decode a legacy filter into the canonical payload
    Decode {
        /// Encoded filter, or - for stdin
        encoded: String,
    },
    /// Encode a flat payload in the legacy format
    Encode {
        /// Payload: inline JSON, a file path, or - for stdin
        payload: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Verify configuration file for errors
    Verify,
    /// Print the JSON schema of the config file
    Schema {
        /// Write the schema to this file instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match cli.command {
        Commands::Fields => {
            let registry = load_registry(config_path, output_mode);

            if output_mode.is_json() {
                let data: Vec<FieldData> = registry
                    .fields()
                    .iter()
                    .map(|field| FieldData {
                        field,
                        display_label: field.display_label(),
                    })
                    .collect();
                output::print_json(&data);
            } else if !output_mode.is_quiet() {
                if registry.fields().is_empty() {
                    println!("No fields configured");
                }
                for field in registry.fields() {
                    let operators: Vec<&str> =
                        field.operators.iter().map(|op| op.as_str()).collect();
                    println!(
                        "{:<20} {:<10} {}",
                        field.name,
                        field.field_type,
                        operators.join(", ")
                    );
                }
            }
            Ok(())
        }

        Commands::Operators { field } => {
            let registry = load_registry(config_path, output_mode);

            let operators = match &field {
                Some(name) => {
                    if registry.describe(name).is_none() {
                        fail(
                            output_mode,
                            exit_codes::ERROR,
                            &format!("unknown field '{}'", name),
                            ErrorData {
                                suggestions: Some(registry.suggest(name)),
                                ..Default::default()
                            },
                        );
                    }
                    registry.operators_for(name)
                }
                None => registry.all_operators().iter().collect(),
            };

            if output_mode.is_json() {
                output::print_json(&operators);
            } else if !output_mode.is_quiet() {
                for op in operators {
                    println!(
                        "{:<18} {} {:<7} {}",
                        op.id.as_str(),
                        op.arity,
                        format!("{:?}", op.shape).to_lowercase(),
                        op.label
                    );
                }
            }
            Ok(())
        }

        Commands::Validate { payload, legacy } => {
            let registry = load_registry(config_path, output_mode);
            let tree = read_tree(&payload, legacy, &registry, output_mode)?;

            let result = validate::validate(&tree, &registry);
            let data = FilterData {
                valid: result.ok,
                complete: tree.is_complete(&registry),
                issues: IssueData::collect(&result, &tree),
                wire_tree: wire::serialize(&tree),
            };

            if !data.valid {
                fail(
                    output_mode,
                    exit_codes::INVALID_FILTER,
                    &format!("filter has {} issue(s)", data.issues.len()),
                    ErrorData {
                        issues: Some(data.issues),
                        ..Default::default()
                    },
                );
            }

            match output_mode {
                OutputMode::Json => output::print_json(&data),
                OutputMode::Text => println!(
                    "✓ Filter is valid ({} conditions)",
                    count_conditions(&tree)
                ),
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Normalize {
            payload,
            legacy,
            pretty,
        } => {
            // the catalog is only needed to coerce legacy values
            let registry = if legacy {
                load_registry(config_path, output_mode)
            } else {
                FieldRegistry::new(Vec::new())?
            };
            let tree = read_tree(&payload, legacy, &registry, output_mode)?;
            let wire_tree = wire::serialize(&tree);

            match output_mode {
                OutputMode::Json => output::print_json(&json!({ "wireTree": wire_tree })),
                OutputMode::Text if pretty => {
                    println!("{}", serde_json::to_string_pretty(&wire_tree.to_json())?)
                }
                OutputMode::Text => println!("{}", wire_tree.to_json_string()),
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Edit {
            payload,
            script,
            events,
        } => run_edit(config_path, output_mode, &payload, &script, events),

        Commands::Legacy { command } => match command {
            LegacyCommands::Decode { encoded } => {
                let registry = load_registry(config_path, output_mode);
                let tree = read_tree(&encoded, true, &registry, output_mode)?;
                let wire_tree = wire::serialize(&tree);

                match output_mode {
                    OutputMode::Json => output::print_json(&json!({ "wireTree": wire_tree })),
                    OutputMode::Text => println!("{}", wire_tree.to_json_string()),
                    OutputMode::Quiet => {}
                }
                Ok(())
            }
            LegacyCommands::Encode { payload } => {
                let registry = FieldRegistry::new(Vec::new())?;
                let tree = read_tree(&payload, false, &registry, output_mode)?;
                let encoded = match legacy::encode(&tree) {
                    Ok(encoded) => encoded,
                    Err(e) => fail(output_mode, exit_codes::ERROR, &e.to_string(), ErrorData::default()),
                };

                match output_mode {
                    OutputMode::Json => output::print_json(&json!({ "legacy": encoded })),
                    OutputMode::Text => println!("{}", encoded),
                    OutputMode::Quiet => {}
                }
                Ok(())
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = load_config(config_path, output_mode);
                let json =
                    serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("{}", json);
                Ok(())
            }
            ConfigCommands::Path => {
                let location = config::get_config_path(config_path);
                if output_mode.is_json() {
                    output::print_json(&json!({
                        "path": location.path,
                        "exists": location.path.exists(),
                    }));
                } else {
                    println!("{}", location.path.display());
                }
                Ok(())
            }
            ConfigCommands::Verify => {
                let path = config::get_config_path(config_path).path;
                let errors = match config::verify(&path) {
                    Ok(errors) => errors,
                    Err(e) => fail(output_mode, exit_codes::CONFIG_ERROR, &e.to_string(), ErrorData::default()),
                };

                if errors.is_empty() {
                    if output_mode.is_json() {
                        output::print_json(&json!({ "valid": true, "path": path }));
                    } else if !output_mode.is_quiet() {
                        println!("✓ Configuration is valid: {}", path.display());
                    }
                    Ok(())
                } else if output_mode.is_json() {
                    fail(
                        output_mode,
                        exit_codes::CONFIG_ERROR,
                        "configuration validation failed",
                        ErrorData {
                            details: Some(errors.join("; ")),
                            ..Default::default()
                        },
                    )
                } else {
                    println!(
                        "✗ Configuration has {} error(s): {}",
                        errors.len(),
                        path.display()
                    );
                    println!();
                    for error in &errors {
                        println!("  - {}", error);
                    }
                    std::process::exit(exit_codes::CONFIG_ERROR);
                }
            }
            ConfigCommands::Schema { write } => match write {
                Some(path) => {
                    config::write_schema_file(&path)?;
                    if !output_mode.is_quiet() {
                        eprintln!("Wrote schema to {}", path.display());
                    }
                    Ok(())
                }
                None => {
                    println!("{}", config::JSON_SCHEMA);
                    Ok(())
                }
            },
        },

        Commands::Completions { shell } => {
            let script = completions::generate_completion(shell);
            io::stdout()
                .write_all(&script)
                .context("Failed to write completions")?;
            Ok(())
        }
    }
}

fn run_edit(
    config_path: Option<&Path>,
    output_mode: OutputMode,
    payload: &str,
    script: &str,
    event_filters: Vec<String>,
) -> Result<()> {
    if payload == "-" && script == "-" {
        fail(
            output_mode,
            exit_codes::INVALID_ARGS,
            "payload and script cannot both be read from stdin",
            ErrorData::default(),
        );
    }
    if !event_filters.is_empty() && EventBus::expand_filters(&event_filters).is_empty() {
        fail(
            output_mode,
            exit_codes::INVALID_ARGS,
            &format!("no event types match: {}", event_filters.join(", ")),
            ErrorData {
                suggestions: Some(EventBus::expand_filters(&[])),
                ..Default::default()
            },
        );
    }

    let config = load_config(config_path, output_mode);
    let mut qb = match config.builder() {
        Ok(qb) => qb,
        Err(e) => fail(output_mode, exit_codes::CONFIG_ERROR, &e.to_string(), ErrorData::default()),
    };
    let (_, mut rx) = qb.subscribe(event_filters);

    let text = read_input(payload)?;
    let loaded = serde_json::from_str::<serde_json::Value>(&text)
        .map_err(|e| e.to_string())
        .and_then(|json| qb.load(&json).map_err(|e| e.to_string()));
    if let Err(message) = loaded {
        fail(output_mode, exit_codes::MALFORMED_PAYLOAD, &message, ErrorData::default());
    }
    print_events(&mut rx, output_mode);

    let script_text = read_input(script)?;
    let intents = match edit::parse_script(&script_text) {
        Ok(intents) => intents,
        Err(e) => fail(
            output_mode,
            exit_codes::INVALID_ARGS,
            &format!("invalid edit script: {}", e),
            ErrorData::default(),
        ),
    };

    for (i, intent) in intents.into_iter().enumerate() {
        let name = intent.name();
        let outcome = edit::apply_intent(&mut qb, intent);
        print_events(&mut rx, output_mode);

        if let Err(e) = outcome {
            let data = match &e {
                BuilderError::Tree(err) => ErrorData {
                    suggestions: Some(err.suggestions().to_vec()).filter(|s| !s.is_empty()),
                    details: Some(err.kind().to_string()),
                    ..Default::default()
                },
                BuilderError::NotSubmittable { .. } => ErrorData {
                    issues: Some(IssueData::collect(&qb.validation(), qb.tree())),
                    ..Default::default()
                },
            };
            fail(
                output_mode,
                exit_codes::EDIT_REJECTED,
                &format!("intent {} ({}) rejected: {}", i, name, e),
                data,
            );
        }
    }

    let result = qb.validation();
    let data = FilterData {
        valid: result.ok,
        complete: qb.is_complete(),
        issues: IssueData::collect(&result, qb.tree()),
        wire_tree: qb.wire(),
    };
    match output_mode {
        OutputMode::Json => output::print_json(&data),
        OutputMode::Text => println!("{}", data.wire_tree.to_json_string()),
        OutputMode::Quiet => {}
    }
    Ok(())
}

fn print_events(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Event>, output_mode: OutputMode) {
    while let Ok(event) = rx.try_recv() {
        match output_mode {
            OutputMode::Json => println!("{}", event.to_jsonrpc_notification()),
            OutputMode::Text => {
                let state = if event.data.is_valid {
                    "valid".to_string()
                } else {
                    format!("{} issue(s)", event.data.issues.len())
                };
                println!(
                    "[{}] {} {} ({})",
                    event.seq, event.event_type, event.data.action, state
                );
            }
            OutputMode::Quiet => {}
        }
    }
}

/// print an error in the requested mode and exit with `code`
fn fail(output_mode: OutputMode, code: i32, message: &str, data: ErrorData) -> ! {
    if output_mode.is_json() {
        output::print_json_error_with_data(code, message, data);
    } else {
        eprintln!("Error: {}", message);
        if let Some(suggestions) = data.suggestions.filter(|s| !s.is_empty()) {
            eprintln!("  did you mean: {}", suggestions.join(", "));
        }
        if let Some(details) = data.details {
            eprintln!("  {}", details);
        }
        for issue in data.issues.unwrap_or_default() {
            match issue.node {
                Some(node) => eprintln!("  - {} {}: {} ({})", issue.node_id, issue.kind, issue.message, node),
                None => eprintln!("  - {} {}: {}", issue.node_id, issue.kind, issue.message),
            }
        }
    }
    std::process::exit(code)
}

fn load_config(config_path: Option<&Path>, output_mode: OutputMode) -> Config {
    match config::load(config_path) {
        Ok(config) => config,
        Err(e) => fail(output_mode, exit_codes::CONFIG_ERROR, &format!("{:#}", e), ErrorData::default()),
    }
}

fn load_registry(config_path: Option<&Path>, output_mode: OutputMode) -> FieldRegistry {
    let config = load_config(config_path, output_mode);
    match config.registry() {
        Ok(registry) => registry,
        Err(e) => fail(
            output_mode,
            exit_codes::CONFIG_ERROR,
            &format!("invalid field catalog: {}", e),
            ErrorData::default(),
        ),
    }
}

/// read a payload argument: `-` is stdin, an existing file is read, anything
/// else is taken literally
fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }

    let path = Path::new(arg);
    if path.is_file() {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    if arg.trim().is_empty() {
        return Err(anyhow!("empty payload"));
    }
    Ok(arg.to_string())
}

/// read and hydrate a payload, exiting with MALFORMED_PAYLOAD on failure
fn read_tree(
    arg: &str,
    legacy: bool,
    registry: &FieldRegistry,
    output_mode: OutputMode,
) -> Result<Tree> {
    let text = read_input(arg)?;
    let parsed = if legacy {
        legacy::decode(&text, registry).map_err(|e| e.to_string())
    } else {
        wire::from_str(&text).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(tree) => Ok(tree),
        Err(message) => fail(
            output_mode,
            exit_codes::MALFORMED_PAYLOAD,
            &message,
            ErrorData::default(),
        ),
    }
}

fn count_conditions(tree: &Tree) -> usize {
    tree.walk()
        .into_iter()
        .filter(|id| tree.condition(*id).is_some())
        .count()
}
