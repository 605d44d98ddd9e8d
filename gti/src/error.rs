use thiserror::Error;

/// Any failure while loading a document. The first error aborts the load; no partially linked
/// [`Document`](crate::Document) is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// A malformed literal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Expected 'true', or 'false', but got '{value}' (attribute '{attribute}')")]
    InvalidBoolean {
        attribute: &'static str,
        value: String,
    },
    #[error("Invalid parameter type '{value}'")]
    InvalidType { value: String },
    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Missing required attribute 'Name' on <{element}>")]
    EmptyName { element: &'static str },
    #[error("Missing required attribute 'Name' on <Value> in Enum '{enum_name}' (value #{index})")]
    UnnamedEnumValue { enum_name: String, index: usize },
}

/// Content that does not belong where it was found.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Expected root element <Gti>, found <{name}>")]
    UnexpectedRoot { name: String },
    #[error("Unknown XML Attribute {name}=\"{value}\" on <{element}> at {path}")]
    UnknownAttribute {
        element: String,
        name: String,
        value: String,
        path: String,
    },
    #[error("Unknown XML Element '{name}' in <{parent}> at {path}")]
    UnknownElement {
        parent: String,
        name: String,
        path: String,
    },
    #[error("Unknown XML node {text:?} in <{parent}>")]
    UnknownNode { parent: String, text: String },
    #[error("Element '{name}' may appear at most once in <{parent}>")]
    RepeatedElement { parent: String, name: &'static str },
    #[error("Unreferenced XML Object ({kind} #{index})")]
    UnreferencedObject { kind: &'static str, index: usize },
    #[error("{kind} '{name}' is defined more than once")]
    DuplicateName { kind: &'static str, name: String },
    #[error("Task '{task}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { task: String, parameter: String },
}

/// A name that does not resolve to a declared entity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Enum Type '{name}' was not defined")]
    UndefinedEnum { name: String },
    #[error("ConsoleApplication '{application}' implements non-existent task '{task}'")]
    UndefinedTask { application: String, task: String },
}
