mod cli;

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use gti::{ComponentTable, Document};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },
    #[error(transparent)]
    Load(#[from] gti::LoadError),
    #[error(transparent)]
    Write(#[from] gti::write::WriteError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gti=info,gti_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = cli::Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &cli::Cli) -> Result<(), CliError> {
    let source = read_input(&cli.input)?;

    let options = gti::LoadOptions {
        allow_dtd: cli.allow_dtd,
        duplicate_parameters: match cli.duplicate_parameters {
            cli::DuplicateParameterAction::Deny => gti::DuplicateParameterAction::Deny,
            cli::DuplicateParameterAction::Warn => gti::DuplicateParameterAction::Warn,
            cli::DuplicateParameterAction::Allow => gti::DuplicateParameterAction::Allow,
        },
    };
    let document = gti::load_with_options(&source, &options)?;
    tracing::info!(
        tasks = document.tasks().len(),
        applications = document.applications().len(),
        "document is valid"
    );

    let stdout = io::stdout().lock();
    match cli.format {
        cli::OutputFormat::Summary => print_summary(&document, stdout)?,
        cli::OutputFormat::Xml => {
            let mut stdout = gti::write::write_document(&document, stdout)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input.starts_with("http://") || input.starts_with("https://") {
        tracing::debug!(url = input, "fetching document");
        reqwest::blocking::get(input)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|source| CliError::Fetch {
                url: input.to_string(),
                source,
            })
    } else {
        std::fs::read_to_string(input).map_err(|source| CliError::Read {
            path: input.to_string(),
            source,
        })
    }
}

fn print_summary(document: &Document, mut out: impl Write) -> io::Result<()> {
    for &task_ref in document.tasks() {
        let task = document.get(task_ref);
        writeln!(out, "Task {}", task.name)?;
        if let Some(description) = &task.description {
            writeln!(out, "  {}", description.trim())?;
        }

        for parameter in &task.parameters {
            let label = document.parameter_label(parameter);
            match document.enum_definition_of(parameter) {
                Some(definition) => {
                    let values = definition.value_names().collect::<Vec<_>>().join(", ");
                    write!(out, "  parameter {label}: Enum:{} [{values}]", definition.name)?;
                }
                None => {
                    let type_ = parameter.type_.fixed_name().unwrap_or_default();
                    write!(out, "  parameter {label}: {type_}")?;
                }
            }
            if parameter.optional {
                write!(out, " optional")?;
            }
            if parameter.multiple {
                write!(out, " multiple")?;
            }
            writeln!(out)?;
        }
        for flag in &task.flags {
            writeln!(out, "  flag {}", flag.name)?;
        }

        let mut implemented = false;
        for (application, implementation) in document.implementations_of(task_ref) {
            implemented = true;
            let arguments = implementation
                .custom_arguments
                .as_ref()
                .map_or(0, |custom| custom.arguments.len());
            writeln!(
                out,
                "  implemented by {} ({arguments} custom arguments)",
                document.get(application).name
            )?;
        }
        if !implemented {
            writeln!(out, "  No app to run this task")?;
        }
    }
    Ok(())
}
