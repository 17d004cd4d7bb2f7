//! Command-line interface for mkly
//! This binary compiles mkly documents to HTML and CSS and inspects their intermediate forms.
//!
//! Usage:
//!   mkly compile `<path>` [--css] [--json] [--theme-file `<yaml>`] [--var key=value] [--config `<toml>`]
//!   mkly parse `<path>` [--format json|yaml]                  - Dump the document AST
//!   mkly style fmt `<path>`                                   - Print canonical style text
//!   mkly style css `<path>` [--inline]                        - Compile style text to CSS
//!
//! Diagnostics go to stderr. The exit code is 1 when a compile is fatal or a file can't be read.

use clap::{Arg, ArgAction, ArgMatches, Command};
use mkly::mkly::ast::Diagnostic;
use mkly::mkly::config::Loader;
use mkly::mkly::error::{parse_variable, MklyError, MklyResult};
use mkly::mkly::kit::Suppliers;
use mkly::mkly::style::compiler::{compile_graph, CssOptions};
use mkly::mkly::style::variables::{VariableMap, VariableMode};
use mkly::{compile_source, parse_document, CompileOptions, ParseOptions, StyleGraph};
use std::sync::Once;

static LOGGING: Once = Once::new();

fn init_logging(verbose: bool) {
    LOGGING.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if verbose {
            builder.filter_level(log::LevelFilter::Debug);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }
        builder.init();
        log::debug!("logging initialized");
    });
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the file")
        .required(true)
        .index(1)
}

fn main() {
    let matches = Command::new("mkly")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile mkly documents to HTML with layered CSS")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log pipeline stages to stderr"),
        )
        .subcommand(
            Command::new("compile")
                .about("Compile a document")
                .arg(path_arg())
                .arg(
                    Arg::new("css")
                        .long("css")
                        .action(ArgAction::SetTrue)
                        .help("Print only the compiled CSS"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("css")
                        .help("Print the full compile result as JSON"),
                )
                .arg(
                    Arg::new("theme-file")
                        .long("theme-file")
                        .action(ArgAction::Append)
                        .help("YAML file with additional themes and presets"),
                )
                .arg(
                    Arg::new("var")
                        .long("var")
                        .action(ArgAction::Append)
                        .help("Variable override as key=value"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("TOML configuration layered over the defaults"),
                ),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a document and print its AST")
                .arg(path_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('json' or 'yaml')")
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("style")
                .about("Work with style text")
                .subcommand_required(true)
                .subcommand(
                    Command::new("fmt")
                        .about("Print the canonical form of a style file")
                        .arg(path_arg()),
                )
                .subcommand(
                    Command::new("css")
                        .about("Compile a style file to CSS")
                        .arg(path_arg())
                        .arg(
                            Arg::new("inline")
                                .long("inline")
                                .action(ArgAction::SetTrue)
                                .help("Substitute variable values instead of var() references"),
                        ),
                ),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let outcome = match matches.subcommand() {
        Some(("compile", compile_matches)) => handle_compile_command(compile_matches),
        Some(("parse", parse_matches)) => handle_parse_command(parse_matches),
        Some(("style", style_matches)) => match style_matches.subcommand() {
            Some(("fmt", fmt_matches)) => handle_style_fmt_command(fmt_matches),
            Some(("css", css_matches)) => handle_style_css_command(css_matches),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn path(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or_default()
}

fn values<'a>(matches: &'a ArgMatches, name: &str) -> impl Iterator<Item = &'a String> {
    matches.get_many::<String>(name).into_iter().flatten()
}

fn report(path: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {}", path, diagnostic);
    }
}

/// Handle the compile command. Returns false when the compile was fatal.
fn handle_compile_command(matches: &ArgMatches) -> MklyResult<bool> {
    let path = path(matches);
    let source = std::fs::read_to_string(path)?;

    let mut loader = Loader::new();
    if let Some(config) = matches.get_one::<String>("config") {
        loader = loader.with_file(config);
    }
    let config = loader.build()?;
    let mut options = CompileOptions::from_config(&config);

    for file in values(matches, "theme-file") {
        let suppliers = Suppliers::from_yaml(&std::fs::read_to_string(file)?)?;
        log::debug!(
            "{}: {} themes, {} presets",
            file,
            suppliers.themes.len(),
            suppliers.presets.len()
        );
        options.themes.extend(suppliers.themes);
        options.presets.extend(suppliers.presets);
    }
    for assignment in values(matches, "var") {
        let (name, value) = parse_variable(assignment)?;
        options.variables.insert(name, value);
    }

    let result = compile_source(&source, &options);
    report(path, &result.diagnostics);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if matches.get_flag("css") {
        print!("{}", result.css);
    } else {
        println!("{}", result.html);
    }
    Ok(!result.is_fatal())
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches) -> MklyResult<bool> {
    let path = path(matches);
    let source = std::fs::read_to_string(path)?;
    let doc = parse_document(&source, &ParseOptions::default());
    report(path, &doc.diagnostics);

    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("json");
    let output = match format {
        "json" => serde_json::to_string_pretty(&doc)?,
        "yaml" => serde_yaml::to_string(&doc)?,
        other => return Err(MklyError::UnknownFormat(other.to_string())),
    };
    println!("{}", output);
    Ok(!doc.is_fatal())
}

fn read_style(matches: &ArgMatches) -> MklyResult<StyleGraph> {
    let path = path(matches);
    let graph = StyleGraph::parse(&std::fs::read_to_string(path)?);
    for warning in &graph.warnings {
        eprintln!("{}: warning (line {}): {}", path, warning.line, warning.message);
    }
    Ok(graph)
}

/// Handle the style fmt command
fn handle_style_fmt_command(matches: &ArgMatches) -> MklyResult<bool> {
    let graph = read_style(matches)?;
    print!("{}", graph.serialize());
    Ok(true)
}

/// Handle the style css command
fn handle_style_css_command(matches: &ArgMatches) -> MklyResult<bool> {
    let graph = read_style(matches)?;
    let variables: VariableMap = graph.variables.iter().cloned().collect();
    let variable_mode = if matches.get_flag("inline") {
        VariableMode::Inline
    } else {
        VariableMode::CustomProperties
    };
    let css = compile_graph(
        &graph,
        &CssOptions {
            variable_mode,
            variables: &variables,
        },
    );
    println!("{}", css);
    Ok(true)
}
