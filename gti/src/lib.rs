//! Model and strict loader for Generic Task Interface (GTI) documents.
//!
//! A GTI document declares abstract tasks (with parameters and flags), the enums their parameters
//! may use, and the console applications that implement those tasks. Loading maps the XML into
//! typed entities while rejecting anything unrecognised, then links all forward references:
//!
//! ```
//! let document = gti::load(r#"<Gti>
//!     <Enum Name="Color"><Value Name="Red"/><Value Name="Blue"/></Enum>
//!     <Task Name="Paint"><Parameter Name="c" Type="Enum:Color"/></Task>
//!     <ConsoleApplication Name="Tool"><TaskImplementation TaskName="Paint"/></ConsoleApplication>
//! </Gti>"#).unwrap();
//!
//! let paint = document.task_by_name("Paint").unwrap();
//! let color = document.enum_definition_of(paint.get(&document).parameter("c").unwrap());
//! assert_eq!(color.unwrap().value_names().collect::<Vec<_>>(), ["Red", "Blue"]);
//! ```

pub mod application;
pub mod components;
pub mod document;
pub mod enum_def;
pub mod error;
pub mod interner;
pub mod task;
pub mod write;
pub mod xstypes;

mod linker;
mod mapping_context;
mod strict;
mod values;

pub use application::{Application, CustomArgument, CustomArguments, TaskImplementation};
pub use components::{ComponentTable, Ref};
pub use document::Document;
pub use enum_def::{EnumDefinition, EnumValue};
pub use error::{FormatError, LoadError, ReferenceError, StructuralError};
pub use interner::{EnumType, EnumTypeReference};
pub use task::{Flag, Parameter, ParameterType, Task};

use mapping_context::MappingContext;

/// What to do when a task declares two parameters with the same non-empty name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DuplicateParameterAction {
    Deny,
    Warn,
    /// The later declaration replaces the earlier one in the parameter index.
    #[default]
    Allow,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Allow a XML Document Type Definition (DTD) to occur
    pub allow_dtd: bool,
    pub duplicate_parameters: DuplicateParameterAction,
}

/// Loads a document with the default [`LoadOptions`].
pub fn load(source: &str) -> Result<Document, LoadError> {
    load_with_options(source, &LoadOptions::default())
}

pub fn load_with_options(source: &str, options: &LoadOptions) -> Result<Document, LoadError> {
    let parsing_options = roxmltree::ParsingOptions {
        allow_dtd: options.allow_dtd,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(source, parsing_options)?;
    read_document(&xml, options)
}

/// Maps and links an already parsed XML document.
pub fn read_document(
    xml: &roxmltree::Document,
    options: &LoadOptions,
) -> Result<Document, LoadError> {
    let _span = tracing::debug_span!("load").entered();

    let mut context = MappingContext::new(options);
    let mapped = Document::map_from_xml(&mut context, xml.root_element())?;
    let document = linker::link(context, mapped)?;

    tracing::debug!(
        enums = document.enums().len(),
        tasks = document.tasks().len(),
        applications = document.applications().len(),
        "loaded document"
    );
    Ok(document)
}
