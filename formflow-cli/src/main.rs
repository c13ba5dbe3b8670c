use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use log::{debug, warn};
use serde_json::{Map, Value};

use formflow::{
    FieldOption, FormConfig, FormEngine, FunctionRegistry, StepTransition,
    form::convert::value_to_string, presentation::OutlineRenderer,
};

/// Key matched when no entry exists for the exact dependency values.
const WILDCARD: &str = "*";

#[derive(Debug, Parser)]
#[command(
    name = "formflow",
    version,
    about = "Inspect, validate and preview declarative form configurations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the values a freshly mounted form starts with
    Defaults {
        /// Form spec: file path, inline payload, or "-" for stdin
        #[arg(short = 'c', long = "config", value_name = "SPEC")]
        config: String,
    },
    /// Validate data against a form and print the error map
    Validate {
        #[arg(short = 'c', long = "config", value_name = "SPEC")]
        config: String,
        /// Data spec: file path, inline payload, or "-" for stdin
        #[arg(short = 'd', long = "data", value_name = "SPEC")]
        data: String,
        /// Static option table: {"function": {"dep|dep" | "*": [options]}}
        #[arg(long = "options", value_name = "SPEC")]
        options: Option<String>,
    },
    /// Render a plain-text outline of the form
    Preview {
        #[arg(short = 'c', long = "config", value_name = "SPEC")]
        config: String,
        #[arg(short = 'd', long = "data", value_name = "SPEC")]
        data: Option<String>,
        #[arg(long = "options", value_name = "SPEC")]
        options: Option<String>,
        /// Wizard step to show, starting at 1
        #[arg(long = "step", value_name = "N", default_value_t = 1)]
        step: usize,
        #[arg(long = "width", value_name = "COLUMNS", default_value_t = 80)]
        width: usize,
    },
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let stdin_specs = specs(&cli.command)
        .into_iter()
        .filter(|spec| *spec == "-")
        .count();
    if stdin_specs > 1 {
        return Err(eyre!("only one input can be read from stdin"));
    }

    match cli.command {
        Command::Defaults { config } => {
            let engine = FormEngine::builder(load_config(&config)?).mount();
            print_json(engine.values())
        }
        Command::Validate {
            config,
            data,
            options,
        } => {
            let mut engine = mount(&config, Some(&data), options.as_deref())?;
            engine.settle().await;
            let errors = engine.validate_all();
            let report: Map<String, Value> = errors
                .iter()
                .map(|(path, message)| (path.clone(), Value::String(message.clone())))
                .collect();
            let invalid = !report.is_empty();
            print_json(&Value::Object(report))?;
            if invalid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Preview {
            config,
            data,
            options,
            step,
            width,
        } => {
            let mut engine = mount(&config, data.as_deref(), options.as_deref())?;
            engine.settle().await;
            advance_to(&mut engine, step);
            engine.settle().await;
            println!("{}", OutlineRenderer::new(width).render(&engine));
            Ok(())
        }
    }
}

fn specs(command: &Command) -> Vec<&str> {
    let (config, rest): (&str, [Option<&str>; 2]) = match command {
        Command::Defaults { config } => (config.as_str(), [None, None]),
        Command::Validate {
            config,
            data,
            options,
        } => (config.as_str(), [Some(data.as_str()), options.as_deref()]),
        Command::Preview {
            config,
            data,
            options,
            ..
        } => (config.as_str(), [data.as_deref(), options.as_deref()]),
    };
    std::iter::once(config).chain(rest.into_iter().flatten()).collect()
}

fn mount(config: &str, data: Option<&str>, options: Option<&str>) -> Result<FormEngine> {
    let config = load_config(config)?;
    let mut builder = FormEngine::builder(config);
    if let Some(spec) = data {
        builder = builder.with_initial_data(load_value(spec, "data")?);
    }
    if let Some(spec) = options {
        builder = builder.with_functions(option_table(&load_value(spec, "options")?)?);
    }
    Ok(builder.mount())
}

/// Step forward through the wizard; a step that fails validation stops the walk.
fn advance_to(engine: &mut FormEngine, step: usize) {
    let target = step.clamp(1, engine.total_steps()) - 1;
    while engine.current_step() < target {
        match engine.next_step() {
            StepTransition::Moved { to, .. } => debug!("advanced to step {}", to + 1),
            StepTransition::Blocked { errors } => {
                warn!(
                    "step {} has {errors} error(s); showing it instead of step {step}",
                    engine.current_step() + 1
                );
                break;
            }
            StepTransition::AtBoundary => break,
        }
    }
}

/// Register one lookup function per table entry. Rows are keyed by the
/// call's arguments joined with `|`.
fn option_table(table: &Value) -> Result<FunctionRegistry> {
    let Value::Object(functions) = table else {
        return Err(eyre!("option table must be an object of function names"));
    };
    let mut registry = FunctionRegistry::new();
    for (name, rows) in functions {
        let Value::Object(rows) = rows else {
            return Err(eyre!("option table entry '{name}' must be an object"));
        };
        let mut parsed: Vec<(String, Vec<FieldOption>)> = Vec::with_capacity(rows.len());
        for (key, options) in rows {
            let options = serde_json::from_value(options.clone())
                .wrap_err_with(|| format!("invalid options for '{name}' row '{key}'"))?;
            parsed.push((key.clone(), options));
        }
        registry.register(name.clone(), move |args: &[Value]| {
            let key = args.iter().map(value_to_string).collect::<Vec<_>>().join("|");
            Ok(lookup_row(&parsed, &key))
        });
    }
    Ok(registry)
}

fn lookup_row(rows: &[(String, Vec<FieldOption>)], key: &str) -> Vec<FieldOption> {
    rows.iter()
        .find(|(row, _)| row == key)
        .or_else(|| rows.iter().find(|(row, _)| row == WILDCARD))
        .map(|(_, options)| options.clone())
        .unwrap_or_default()
}

fn load_config(spec: &str) -> Result<FormConfig> {
    let value = load_value(spec, "config")?;
    formflow::parse_form_config(&value).map_err(|err| eyre!("{err:#}"))
}

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).wrap_err("failed to serialize output")?
    );
    Ok(())
}

fn load_value(spec: &str, label: &str) -> Result<Value> {
    if spec == "-" {
        let contents = read_from_source(&InputSource::Stdin)?;
        return parse_contents(&contents, label);
    }
    if looks_inline(spec) {
        return parse_contents(spec, &format!("inline {label}"));
    }

    let path = PathBuf::from(spec);
    match read_from_source(&InputSource::File(path.clone())) {
        Ok(contents) => parse_contents(&contents, label),
        Err(err) => {
            if is_not_found(&err) {
                let inline_label = format!("inline {label}");
                return parse_contents(spec, &inline_label);
            }
            Err(err.wrap_err(format!("failed to load {label} from {}", path.display())))
        }
    }
}

// Long inline payloads fail as file names before they can be "not found".
fn looks_inline(spec: &str) -> bool {
    matches!(spec.trim_start().chars().next(), Some('{' | '['))
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read file {}", path.display())),
    }
}

fn is_not_found(err: &Report) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}

fn parse_contents(contents: &str, label: &str) -> Result<Value> {
    serde_json::from_str(contents).wrap_err_with(|| format!("failed to parse {label} as JSON"))
}
