//! Canonical XML serialization of a linked [`Document`].
//!
//! Booleans are written as `true`, and `false` values as well as empty parameter names are
//! omitted, so loading the output yields a document equal to the one written.

use std::{borrow::Cow, io::Write};

use quick_xml::{
    escape::escape,
    events::{attributes::Attribute, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    name::QName,
    Writer,
};
use thiserror::Error;

use super::{
    interner::ENUM_TYPE_PREFIX, Application, ComponentTable, CustomArgument, Document,
    EnumDefinition, Parameter, Task,
};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write XML: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Writes `document` to `inner` and returns the writer.
pub fn write_document<W: Write>(document: &Document, inner: W) -> Result<W, WriteError> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(Document::TAG_NAME)))?;

    for &definition in document.enums() {
        write_enum(&mut writer, definition.get(document))?;
    }
    for &task in document.tasks() {
        write_task(&mut writer, document, task.get(document))?;
    }
    for &application in document.applications() {
        write_application(&mut writer, application.get(document))?;
    }

    writer.write_event(Event::End(BytesEnd::new(Document::TAG_NAME)))?;
    Ok(writer.into_inner())
}

pub fn to_string(document: &Document) -> Result<String, WriteError> {
    let bytes = write_document(document, Vec::new())?;
    // The writer only ever receives UTF-8 text.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Escapes markup characters, plus the characters a reader would otherwise normalize:
/// whitespace other than spaces in attribute values, and carriage returns everywhere.
fn escape_value(value: &str, in_attribute: bool) -> Cow<str> {
    let normalized = |c: char| c == '\r' || (in_attribute && matches!(c, '\n' | '\t'));
    let escaped = escape(value);
    if !escaped.contains(normalized) {
        return escaped;
    }

    let mut result = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '\r' => result.push_str("&#13;"),
            '\n' if in_attribute => result.push_str("&#10;"),
            '\t' if in_attribute => result.push_str("&#9;"),
            c => result.push(c),
        }
    }
    Cow::Owned(result)
}

fn attribute<'a>(key: &'a str, value: &'a str) -> Attribute<'a> {
    let value = match escape_value(value, true) {
        Cow::Borrowed(value) => Cow::Borrowed(value.as_bytes()),
        Cow::Owned(value) => Cow::Owned(value.into_bytes()),
    };
    Attribute {
        key: QName(key.as_bytes()),
        value,
    }
}

fn named<'a>(tag: &'a str, name: &'a str) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    if !name.is_empty() {
        start.push_attribute(attribute("Name", name));
    }
    start
}

/// Writes `start` as an empty element or as a start tag, followed by `children` and an end tag.
fn element<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart,
    has_children: bool,
    children: impl FnOnce(&mut Writer<W>) -> Result<(), WriteError>,
) -> Result<(), WriteError> {
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    children(writer)?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn text_element<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart,
    text: &str,
) -> Result<(), WriteError> {
    element(writer, start, !text.is_empty(), |writer| {
        writer.write_event(Event::Text(BytesText::from_escaped(escape_value(text, false))))?;
        Ok(())
    })
}

fn write_enum<W: Write>(
    writer: &mut Writer<W>,
    definition: &EnumDefinition,
) -> Result<(), WriteError> {
    let start = named(EnumDefinition::TAG_NAME, &definition.name);
    element(writer, start, !definition.values.is_empty(), |writer| {
        for value in &definition.values {
            writer.write_event(Event::Empty(named("Value", &value.name)))?;
        }
        Ok(())
    })
}

fn write_task<W: Write>(
    writer: &mut Writer<W>,
    document: &Document,
    task: &Task,
) -> Result<(), WriteError> {
    let start = named(Task::TAG_NAME, &task.name);
    let has_children =
        task.description.is_some() || !task.parameters.is_empty() || !task.flags.is_empty();
    element(writer, start, has_children, |writer| {
        if let Some(description) = &task.description {
            text_element(writer, BytesStart::new("Description"), description)?;
        }
        for parameter in &task.parameters {
            write_parameter(writer, document, parameter)?;
        }
        for flag in &task.flags {
            writer.write_event(Event::Empty(named("Flag", &flag.name)))?;
        }
        Ok(())
    })
}

fn write_parameter<W: Write>(
    writer: &mut Writer<W>,
    document: &Document,
    parameter: &Parameter,
) -> Result<(), WriteError> {
    let type_ = match parameter.type_.fixed_name() {
        Some(name) => name.to_string(),
        None => {
            let definition = document
                .enum_definition_of(parameter)
                .map(|definition| definition.name.as_str())
                .unwrap_or_default();
            format!("{ENUM_TYPE_PREFIX}{definition}")
        }
    };

    let mut start = named(Parameter::TAG_NAME, &parameter.name);
    start.push_attribute(attribute("Type", &type_));
    if parameter.optional {
        start.push_attribute(("Optional", "true"));
    }
    if parameter.multiple {
        start.push_attribute(("Multiple", "true"));
    }
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_application<W: Write>(
    writer: &mut Writer<W>,
    application: &Application,
) -> Result<(), WriteError> {
    let start = named(Application::TAG_NAME, &application.name);
    let has_children = !application.task_implementations.is_empty();
    element(writer, start, has_children, |writer| {
        for implementation in &application.task_implementations {
            let mut start = BytesStart::new("TaskImplementation");
            start.push_attribute(attribute("TaskName", &implementation.task_name));
            let custom_arguments = implementation.custom_arguments.as_ref();
            element(writer, start, custom_arguments.is_some(), |writer| {
                let arguments = custom_arguments.map_or(&[][..], |c| c.arguments.as_slice());
                let start = BytesStart::new("CustomArguments");
                element(writer, start, !arguments.is_empty(), |writer| {
                    arguments
                        .iter()
                        .try_for_each(|argument| write_argument(writer, argument))
                })
            })?;
        }
        Ok(())
    })
}

fn write_argument<W: Write>(
    writer: &mut Writer<W>,
    argument: &CustomArgument,
) -> Result<(), WriteError> {
    let mut start = BytesStart::new("Argument");
    if let Some(condition) = &argument.condition {
        start.push_attribute(attribute("Condition", condition));
    }
    text_element(writer, start, &argument.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load;

    const FULL: &str = r#"<Gti>
        <Enum Name="Level"><Value Name="Low"/><Value Name="High &amp; Dry"/></Enum>
        <Enum Name="Empty"/>
        <Task Name="Compile">
            <Description>Compiles "sources" &lt;fast&gt;</Description>
            <Parameter Name="in" Type="InputFile" Multiple="true"/>
            <Parameter Type="Enum:Level" Optional="true"/>
            <Parameter Name="out" Type="OutputDirectory" Optional="false"/>
            <Flag Name="verbose"/>
        </Task>
        <Task Name="Clean"/>
        <ConsoleApplication Name="cc">
            <TaskImplementation TaskName="Compile">
                <CustomArguments>
                    <Argument Condition="verbose">-v</Argument>
                    <Argument>-o $(out)</Argument>
                    <Argument Condition="a&#10;b&#9;c&#13;d">x&#13;y&#10;z&#9;w</Argument>
                </CustomArguments>
            </TaskImplementation>
            <TaskImplementation TaskName="Clean">
                <CustomArguments/>
            </TaskImplementation>
        </ConsoleApplication>
        <ConsoleApplication Name="idle"/>
    </Gti>"#;

    #[test]
    fn written_document_loads_back_equal() {
        let document = load(FULL).unwrap();
        let written = to_string(&document).unwrap();
        let reloaded = load(&written).unwrap();
        assert_eq!(document, reloaded);
    }

    #[test]
    fn writes_canonical_attributes() {
        let document = load(FULL).unwrap();
        let written = to_string(&document).unwrap();

        assert!(written.contains(r#"<Parameter Type="Enum:Level" Optional="true"/>"#));
        assert!(written.contains(r#"<Parameter Name="in" Type="InputFile" Multiple="true"/>"#));
        // false is the default and is left out
        assert!(written.contains(r#"<Parameter Name="out" Type="OutputDirectory"/>"#));
        assert!(written.contains(r#"<Argument Condition="verbose">-v</Argument>"#));
        assert!(written.contains(r#"<ConsoleApplication Name="idle"/>"#));
    }

    #[test]
    fn normalized_whitespace_is_written_as_character_references() {
        let document = load(FULL).unwrap();
        let cc = document.applications()[0].get(&document);
        let argument = &cc.task_implementations[0]
            .custom_arguments
            .as_ref()
            .unwrap()
            .arguments[2];
        assert_eq!(argument.condition.as_deref(), Some("a\nb\tc\rd"));
        assert_eq!(argument.text, "x\ry\nz\tw");

        let written = to_string(&document).unwrap();
        assert!(written.contains(r#"Condition="a&#10;b&#9;c&#13;d">x&#13;y"#));

        let reloaded = load(&written).unwrap();
        let cc = reloaded.applications()[0].get(&reloaded);
        let reloaded_argument = &cc.task_implementations[0]
            .custom_arguments
            .as_ref()
            .unwrap()
            .arguments[2];
        assert_eq!(reloaded_argument, argument);
    }

    #[test]
    fn escape_value_leaves_plain_text_borrowed() {
        assert!(matches!(escape_value("plain text", true), Cow::Borrowed("plain text")));
        assert_eq!(escape_value("a\tb", false), "a\tb");
        assert_eq!(escape_value("a\tb", true), "a&#9;b");
        assert_eq!(escape_value("<&>", true), "&lt;&amp;&gt;");
    }

    #[test]
    fn empty_document() {
        let document = load("<Gti/>").unwrap();
        let written = to_string(&document).unwrap();
        assert!(written.contains("<Gti>"));
        assert_eq!(load(&written).unwrap(), document);
    }
}
