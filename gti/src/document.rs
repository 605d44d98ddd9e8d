use std::collections::HashMap;

use roxmltree::Node;

use super::{
    application::PendingApplication,
    components::{
        Component, ComponentTable, ComponentTraits, DocumentComponentTable, HasArenaContainer,
    },
    error::{LoadError, StructuralError},
    interner::EnumType,
    strict::map_strict,
    xstypes::Sequence,
    Application, EnumDefinition, MappingContext, Parameter, Ref, Task, TaskImplementation,
};

/// A fully linked `<Gti>` document.
///
/// Every reference in the document is resolved and the document never changes after loading, so
/// it may be shared freely between threads. Entities are reached through [`Ref`]s:
/// `document.tasks()[0].get(&document)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub(crate) enums: Sequence<Ref<EnumDefinition>>,
    pub(crate) tasks: Sequence<Ref<Task>>,
    pub(crate) applications: Sequence<Ref<Application>>,

    pub(crate) enums_by_name: HashMap<String, Ref<EnumDefinition>>,
    pub(crate) tasks_by_name: HashMap<String, Ref<Task>>,
    /// Bound definition of each interned enum type, indexed by the [`EnumType`] handle.
    pub(crate) enum_types: Box<[Ref<EnumDefinition>]>,
    pub(crate) components: DocumentComponentTable,
}

/// The top-level entities of a document as mapped from XML, before linking.
#[derive(Debug)]
pub(crate) struct MappedDocument {
    pub(crate) enums: Sequence<Ref<EnumDefinition>>,
    pub(crate) tasks: Sequence<Ref<Task>>,
    pub(crate) applications: Sequence<(Ref<Application>, PendingApplication)>,
}

impl Document {
    pub const TAG_NAME: &'static str = "Gti";

    pub(crate) fn map_from_xml(
        context: &mut MappingContext,
        root: Node,
    ) -> Result<MappedDocument, LoadError> {
        if root.tag_name().name() != Self::TAG_NAME || root.tag_name().namespace().is_some() {
            return Err(StructuralError::UnexpectedRoot {
                name: root.tag_name().name().to_string(),
            }
            .into());
        }

        map_strict(root, &[], |gti| {
            let enums = gti
                .elements(EnumDefinition::TAG_NAME)
                .into_iter()
                .map(|node| EnumDefinition::map_from_xml(context, node))
                .collect::<Result<_, _>>()?;

            let tasks = gti
                .elements(Task::TAG_NAME)
                .into_iter()
                .map(|node| Task::map_from_xml(context, node))
                .collect::<Result<_, _>>()?;

            let applications = gti
                .elements(Application::TAG_NAME)
                .into_iter()
                .map(|node| Application::map_from_xml(context, node))
                .collect::<Result<_, _>>()?;

            Ok(MappedDocument {
                enums,
                tasks,
                applications,
            })
        })
    }

    pub fn enums(&self) -> &[Ref<EnumDefinition>] {
        &self.enums
    }

    pub fn tasks(&self) -> &[Ref<Task>] {
        &self.tasks
    }

    pub fn applications(&self) -> &[Ref<Application>] {
        &self.applications
    }

    pub fn enum_by_name(&self, name: &str) -> Option<Ref<EnumDefinition>> {
        self.enums_by_name.get(name).copied()
    }

    pub fn task_by_name(&self, name: &str) -> Option<Ref<Task>> {
        self.tasks_by_name.get(name).copied()
    }

    /// The definition an enum-typed parameter refers to. Every parameter naming the same enum
    /// resolves to the same definition.
    pub fn resolve_enum(&self, enum_type: EnumType) -> Ref<EnumDefinition> {
        *self
            .enum_types
            .get(enum_type.index())
            .expect("Invalid enum type reference (out-of-bounds)")
    }

    pub fn enum_definition_of(&self, parameter: &Parameter) -> Option<&EnumDefinition> {
        parameter
            .type_
            .enum_type()
            .map(|enum_type| self.resolve_enum(enum_type).get(self))
    }

    /// Display label of a parameter: its name, or a label derived from its type if the name is
    /// empty.
    pub fn parameter_label<'a>(&'a self, parameter: &'a Parameter) -> &'a str {
        if !parameter.name.is_empty() {
            return &parameter.name;
        }
        match parameter.type_.default_label() {
            Some(label) => label,
            None => self
                .enum_definition_of(parameter)
                .map(|definition| definition.name.as_str())
                .unwrap_or_default(),
        }
    }

    /// Every application implementing `task`, with its implementation, in document order.
    pub fn implementations_of(
        &self,
        task: Ref<Task>,
    ) -> impl Iterator<Item = (Ref<Application>, &TaskImplementation)> + '_ {
        self.applications.iter().flat_map(move |&application| {
            application
                .get(self)
                .task_implementations
                .iter()
                .filter(move |implementation| implementation.task == task)
                .map(move |implementation| (application, implementation))
        })
    }
}

impl ComponentTable for Document {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.get(ref_)
    }
}
