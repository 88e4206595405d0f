#![forbid(unsafe_code)]

//! textgraph CLI - parse graphs drawn as monospaced text.
//!
//! # Commands
//!
//! - `parse`: Output node/edge records (or a summary) as JSON or YAML
//! - `positions`: List where each node sits in the drawing
//! - `cut`: Insert a helper node that cuts an edge
//! - `validate`: Check input and report diagnostics
//! - `skeleton`: Redraw the node/edge structure without attributes
//! - `params`: Read parameter lists such as `Resistor(r=10, pins=(1, 2))`

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tg_core::{ParamError, ParamSchema, ParseOptions, ParseWarning, Side, WarningCode};
use tg_parser::{
    ParseResult, cut, node_positions, parse_params, parse_with_options, read_params,
    render_skeleton, summary_json,
};
use tracing::{debug, info, warn};

/// textgraph CLI - parse graphs drawn as monospaced text.
#[derive(Debug, Parser)]
#[command(
    name = "tg",
    version,
    about = "textgraph CLI - parse graphs drawn as monospaced text",
    long_about = "Turns ASCII drawings like\n\n    node1 ------ node2\n          color=red\n\n\
        into node and edge records with attributes."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with parse options (`keep_comments`, `strict`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a drawing and output its records.
    Parse {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output all records (default is summary)
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Include comment lines as records
        #[arg(long)]
        comments: bool,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List node positions (row and column of each identifier).
    Positions {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cut an edge of a node by inserting a terminating helper node.
    Cut {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Identifier of the node whose edge is cut
        #[arg(short, long)]
        node: String,

        /// Side of the node to cut; tries left, then right when omitted
        #[arg(short, long, value_enum)]
        side: Option<SideArg>,

        /// Identifier of the inserted helper node
        #[arg(long, default_value = tg_core::CutSpec::DEFAULT_HELPER_ID)]
        helper: String,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a drawing and report diagnostics.
    Validate {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,

        /// Treat node lines without a blank line between them as an error
        #[arg(long)]
        strict: bool,
    },

    /// Redraw the node/edge structure without attributes.
    Skeleton {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Read parameter lists such as `Resistor(r=10, pins=(1, 2))`.
    Params {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// TOML file describing known elements; values are typed when given
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Self::Left,
            SideArg::Right => Self::Right,
        }
    }
}

#[derive(Debug, Serialize)]
struct PositionRow<'a> {
    id: &'a str,
    row: usize,
    column: usize,
    x: f64,
    y: f64,
}

/// Result of validating a drawing.
#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    node_count: usize,
    edge_count: usize,
    warnings: Vec<ValidationWarning>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
struct ValidationWarning {
    code: String,
    message: String,
    line: usize,
    suggestion: &'static str,
}

/// Parameter elements with the errors met while reading them.
#[derive(Debug, Serialize)]
struct ParamsResult<T> {
    elements: Vec<T>,
    errors: Vec<ParamDiagnostic>,
}

#[derive(Debug, Serialize)]
struct ParamDiagnostic {
    code: &'static str,
    message: String,
    line: usize,
    column: usize,
}

#[derive(Debug, Serialize)]
struct RawElement {
    name: String,
    attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ValidationError {
    code: String,
    message: String,
    line: usize,
    column: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Command::Parse {
            input,
            full,
            pretty,
            format,
            comments,
            output,
        } => {
            let options = if comments {
                options.merged(ParseOptions::with_comments())
            } else {
                options
            };
            cmd_parse(&input, &options, full, pretty, format, output.as_deref())
        }

        Command::Positions { input, json } => cmd_positions(&input, json),

        Command::Cut {
            input,
            node,
            side,
            helper,
            output,
        } => cmd_cut(&input, &node, side.map(Side::from), &helper, output.as_deref()),

        Command::Validate {
            input,
            json,
            strict,
        } => {
            let options = if strict {
                options.merged(ParseOptions::strict())
            } else {
                options
            };
            cmd_validate(&input, &options, json)
        }

        Command::Skeleton { input, output } => cmd_skeleton(&input, &options, output.as_deref()),

        Command::Params {
            input,
            schema,
            pretty,
        } => cmd_params(&input, schema.as_deref(), pretty),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_options(path: Option<&Path>) -> Result<ParseOptions> {
    let Some(path) = path else {
        return Ok(ParseOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let options: ParseOptions = toml::from_str(&text)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    debug!(?options, config = %path.display(), "loaded parse options");
    Ok(options)
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline drawing
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Lenient parse; strictness is applied by the caller so counts and
/// warnings are always available.
fn parse_lenient(source: &str, options: &ParseOptions) -> Result<ParseResult> {
    let lenient = ParseOptions {
        strict: false,
        ..*options
    };
    let parsed = parse_with_options(source, &lenient)?;
    for warning in &parsed.warnings {
        warn!(code = warning.code.as_str(), "Parse warning: {}", warning.message);
    }
    Ok(parsed)
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(
    input: &str,
    options: &ParseOptions,
    full: bool,
    pretty: bool,
    format: OutputFormat,
    output: Option<&str>,
) -> Result<()> {
    let source = load_input(input)?;
    let parsed = parse_with_options(&source, options)?;
    for warning in &parsed.warnings {
        warn!(code = warning.code.as_str(), "Parse warning: {}", warning.message);
    }

    let value = if full {
        serde_json::to_value(&parsed.records)?
    } else {
        serde_json::from_str(&summary_json(&parsed))?
    };

    let mut rendered = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(&value)?,
        OutputFormat::Json => serde_json::to_string(&value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&value)?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    write_output(output, &rendered)
}

// =============================================================================
// Command: positions
// =============================================================================

fn cmd_positions(input: &str, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let positions = node_positions(&source);

    if json_output {
        let rows: Vec<PositionRow<'_>> = positions
            .iter()
            .map(|position| {
                let (x, y) = position.xy();
                PositionRow {
                    id: &position.id,
                    row: position.row,
                    column: position.column,
                    x,
                    y,
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for position in &positions {
            println!(
                "{}\t{}:{}",
                position.id,
                position.row + 1,
                position.column + 1
            );
        }
    }

    Ok(())
}

// =============================================================================
// Command: cut
// =============================================================================

fn cmd_cut(
    input: &str,
    node: &str,
    side: Option<Side>,
    helper: &str,
    output: Option<&str>,
) -> Result<()> {
    let source = load_input(input)?;
    let Some(edited) = cut(&source, node, side, helper) else {
        let side = side.map_or("either side", Side::as_str);
        bail!("Cannot cut {side} of node '{node}': no such node, no neighbor, or not enough room for helper '{helper}'");
    };
    debug!(node, helper, "inserted helper node");
    write_output(output, &edited)
}

// =============================================================================
// Command: validate
// =============================================================================

fn cmd_validate(input: &str, options: &ParseOptions, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let parsed = parse_lenient(&source, options)?;

    let errors: Vec<ValidationError> = options
        .strict
        .then(|| parsed.warnings.iter().find_map(ParseWarning::escalate))
        .flatten()
        .map(|error| ValidationError {
            code: error.code().as_str().to_string(),
            message: error.to_string(),
            line: error.span().line_number(),
            column: error.span().start.col + 1,
        })
        .into_iter()
        .collect();

    let warnings: Vec<ValidationWarning> = parsed
        .warnings
        .iter()
        .map(|warning| ValidationWarning {
            code: warning.code.as_str().to_string(),
            message: warning.message.clone(),
            line: warning.span.line_number(),
            suggestion: suggest_fix(warning.code),
        })
        .collect();

    let result = ValidateResult {
        valid: errors.is_empty(),
        node_count: parsed.node_count(),
        edge_count: parsed.edge_count(),
        warnings,
        errors,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ Valid text graph");
        } else {
            println!("✗ Invalid text graph");
        }

        println!("  Nodes: {}", result.node_count);
        println!("  Edges: {}", result.edge_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!(
                    "  [{}] {} (line {}, col {})",
                    err.code, err.message, err.line, err.column
                );
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warn in &result.warnings {
                println!("  [{}] {}", warn.code, warn.message);
                println!("       → {}", warn.suggestion);
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

const fn suggest_fix(code: WarningCode) -> &'static str {
    match code {
        WarningCode::MissingBlankLine => "Insert a blank line between the two node lines",
        WarningCode::UnattachedAttributes => {
            "Start the attributes in the column of a node or of a connected gap"
        }
        WarningCode::OrphanAttributes => "Put a node line directly above or below the attributes",
        WarningCode::EmptyNodeId => "Name the node; underscores at its ends only cut edges",
    }
}

// =============================================================================
// Command: skeleton
// =============================================================================

fn cmd_skeleton(input: &str, options: &ParseOptions, output: Option<&str>) -> Result<()> {
    let source = load_input(input)?;
    let parsed = parse_lenient(&source, options)?;
    write_output(output, &render_skeleton(&parsed.records))
}

// =============================================================================
// Command: params
// =============================================================================

fn cmd_params(input: &str, schema: Option<&Path>, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let (rendered, valid) = match schema {
        Some(path) => {
            let schema = load_schema(path)?;
            render_params(read_params(&source, &schema), pretty)?
        }
        None => {
            let raw = parse_params(&source).into_iter().map(|result| {
                result.map(|element| RawElement {
                    attributes: element.to_map(),
                    name: element.name,
                })
            });
            render_params(raw, pretty)?
        }
    };
    println!("{rendered}");

    if !valid {
        std::process::exit(1);
    }

    Ok(())
}

fn load_schema(path: &Path) -> Result<ParamSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema: {}", path.display()))?;
    let schema: ParamSchema =
        toml::from_str(&text).with_context(|| format!("Invalid schema: {}", path.display()))?;
    debug!(elements = schema.elements.len(), schema = %path.display(), "loaded parameter schema");
    Ok(schema)
}

fn render_params<T: Serialize>(
    results: impl IntoIterator<Item = std::result::Result<T, ParamError>>,
    pretty: bool,
) -> Result<(String, bool)> {
    let mut output = ParamsResult {
        elements: Vec::new(),
        errors: Vec::new(),
    };
    for result in results {
        match result {
            Ok(element) => output.elements.push(element),
            Err(error) => {
                warn!(code = error.code(), "Parameter error: {error}");
                output.errors.push(ParamDiagnostic {
                    code: error.code(),
                    message: error.to_string(),
                    line: error.span().line_number(),
                    column: error.span().start.col + 1,
                });
            }
        }
    }

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok((rendered, output.errors.is_empty()))
}
