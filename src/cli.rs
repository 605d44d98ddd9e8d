use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DuplicateParameterAction {
    Deny,
    Warn,
    Allow,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Tasks with their parameters, flags and implementing applications
    Summary,
    /// The canonical XML form of the document
    Xml,
}

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(value_parser, help = "The source file or URL")]
    pub input: String,

    #[clap(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[clap(long, default_value = "allow", value_enum)]
    pub duplicate_parameters: DuplicateParameterAction,

    #[clap(long, default_value = "summary", value_enum)]
    pub format: OutputFormat,
}
