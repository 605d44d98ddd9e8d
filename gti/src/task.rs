use std::collections::HashMap;

use roxmltree::Node;

use super::{
    components::{Component, Named},
    error::{FormatError, LoadError, StructuralError},
    interner::EnumType,
    strict::map_strict,
    values::type_value,
    xstypes::Sequence,
    DuplicateParameterAction, MappingContext, Ref,
};

/// The value domain of a [`Parameter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// One of the values of a document-declared enum, see
    /// [`Document::resolve_enum`](crate::Document::resolve_enum).
    Enum(EnumType),
    File,
    InputFile,
    Directory,
    OutputDirectory,
}

impl ParameterType {
    pub fn enum_type(self) -> Option<EnumType> {
        match self {
            Self::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    /// The `Type` attribute text of the non-enum variants.
    pub fn fixed_name(self) -> Option<&'static str> {
        match self {
            Self::Enum(_) => None,
            Self::File => Some("File"),
            Self::InputFile => Some("InputFile"),
            Self::Directory => Some("Directory"),
            Self::OutputDirectory => Some("OutputDirectory"),
        }
    }

    /// Label used for a parameter that has no name. Enum parameters use the enum's name instead.
    pub fn default_label(self) -> Option<&'static str> {
        match self {
            Self::Enum(_) => None,
            Self::File | Self::InputFile => Some("Input File"),
            Self::Directory | Self::OutputDirectory => Some("Output Directory"),
        }
    }
}

/// `<Parameter Name? Type Optional? Multiple?/>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    /// May be empty, in which case the parameter is labelled after its type.
    pub name: String,
    pub type_: ParameterType,
    pub optional: bool,
    pub multiple: bool,
}

impl Parameter {
    pub const TAG_NAME: &'static str = "Parameter";

    fn map_from_xml(context: &mut MappingContext, node: Node) -> Result<Self, LoadError> {
        map_strict(node, &["Name", "Type", "Optional", "Multiple"], |parameter| {
            let name = parameter.attribute_value("Name")?.unwrap_or_default();
            let type_ = parameter.required_attribute(Self::TAG_NAME, "Type")?;
            let type_ = type_value(type_, context.interner_mut())?;
            let optional = parameter.attribute_value("Optional")?.unwrap_or(false);
            let multiple = parameter.attribute_value("Multiple")?.unwrap_or(false);
            Ok(Self {
                name,
                type_,
                optional,
                multiple,
            })
        })
    }
}

/// `<Flag Name="..."/>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
}

impl Flag {
    pub const TAG_NAME: &'static str = "Flag";

    fn map_from_xml(node: Node) -> Result<Self, LoadError> {
        map_strict(node, &["Name"], |flag| {
            let name = flag.attribute_value("Name")?.unwrap_or_default();
            Ok(Self { name })
        })
    }
}

/// `<Task Name="...">`: an abstract operation, independent of any tool implementing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Sequence<Parameter>,
    pub flags: Sequence<Flag>,

    /// Position in `parameters` by parameter name; built during linking.
    pub(crate) parameter_index: HashMap<String, usize>,
}

impl Task {
    pub const TAG_NAME: &'static str = "Task";
    const DESCRIPTION_TAG_NAME: &'static str = "Description";

    /// Looks up a parameter by its (non-empty) name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameter_index
            .get(name)
            .and_then(|&position| self.parameters.get(position))
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parameter_index.keys().map(String::as_str)
    }

    pub(crate) fn map_from_xml(
        context: &mut MappingContext,
        node: Node,
    ) -> Result<Ref<Self>, LoadError> {
        assert_eq!(node.tag_name().name(), Self::TAG_NAME);

        let task = map_strict(node, &["Name"], |task| {
            let name = task.attribute_value("Name")?.unwrap_or_default();

            let description = task
                .element(Self::DESCRIPTION_TAG_NAME)?
                .map(|description| map_strict(description, &[], |description| Ok(description.text())))
                .transpose()?;

            let parameters = task
                .elements(Parameter::TAG_NAME)
                .into_iter()
                .map(|parameter| Parameter::map_from_xml(context, parameter))
                .collect::<Result<_, _>>()?;

            let flags = task
                .elements(Flag::TAG_NAME)
                .into_iter()
                .map(Flag::map_from_xml)
                .collect::<Result<_, _>>()?;

            Ok(Self {
                name,
                description,
                parameters,
                flags,
                parameter_index: HashMap::new(),
            })
        })?;

        Ok(context.create(task))
    }

    /// Builds the parameter-name index. Unnamed parameters are not indexed; for a repeated name
    /// `action` decides between last-write-wins and an error.
    pub(crate) fn build_parameter_index(
        &mut self,
        action: DuplicateParameterAction,
    ) -> Result<(), StructuralError> {
        let mut index = HashMap::with_capacity(self.parameters.len());
        for (position, parameter) in self.parameters.iter().enumerate() {
            if parameter.name.is_empty() {
                continue;
            }
            if index.insert(parameter.name.clone(), position).is_some() {
                match action {
                    DuplicateParameterAction::Deny => {
                        return Err(StructuralError::DuplicateParameter {
                            task: self.name.clone(),
                            parameter: parameter.name.clone(),
                        });
                    }
                    DuplicateParameterAction::Warn => {
                        tracing::warn!(
                            task = %self.name,
                            parameter = %parameter.name,
                            "parameter declared more than once, the last declaration wins"
                        );
                    }
                    DuplicateParameterAction::Allow => {}
                }
            }
        }
        self.parameter_index = index;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), FormatError> {
        self.validate_name()
    }
}

impl Component for Task {
    const DISPLAY_NAME: &'static str = "Task";
}

impl Named for Task {
    fn name(&self) -> &str {
        &self.name
    }
}
