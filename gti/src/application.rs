use std::collections::HashMap;

use roxmltree::Node;

use super::{
    components::{Component, ComponentTable, Named},
    error::{LoadError, ReferenceError},
    strict::map_strict,
    xstypes::Sequence,
    MappingContext, Ref, Task,
};

/// `<ConsoleApplication Name="...">`: a command-line tool implementing zero or more tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub task_implementations: Sequence<TaskImplementation>,
}

/// `<TaskImplementation TaskName="...">`: binds an application to one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskImplementation {
    pub task_name: String,
    pub task: Ref<Task>,
    pub custom_arguments: Option<CustomArguments>,
}

/// `<CustomArguments>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomArguments {
    pub arguments: Sequence<CustomArgument>,
}

/// `<Argument Condition?>text</Argument>`. The text is stored, never evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomArgument {
    pub condition: Option<String>,
    pub text: String,
}

/// An application as mapped from XML, whose task references are not resolved yet. Its slot in the
/// component table stays reserved until the application phase of linking fills it.
#[derive(Debug)]
pub(crate) struct PendingApplication {
    name: String,
    implementations: Sequence<PendingTaskImplementation>,
}

#[derive(Debug)]
struct PendingTaskImplementation {
    task_name: String,
    custom_arguments: Option<CustomArguments>,
}

impl Application {
    pub const TAG_NAME: &'static str = "ConsoleApplication";

    pub fn implementation_of(&self, task: Ref<Task>) -> Option<&TaskImplementation> {
        self.task_implementations
            .iter()
            .find(|implementation| implementation.task == task)
    }

    pub(crate) fn map_from_xml(
        context: &mut MappingContext,
        node: Node,
    ) -> Result<(Ref<Self>, PendingApplication), LoadError> {
        assert_eq!(node.tag_name().name(), Self::TAG_NAME);

        let pending = map_strict(node, &["Name"], |application| {
            let name = application.attribute_value("Name")?.unwrap_or_default();
            let implementations = application
                .elements(TaskImplementation::TAG_NAME)
                .into_iter()
                .map(PendingTaskImplementation::map_from_xml)
                .collect::<Result<_, _>>()?;
            Ok(PendingApplication {
                name,
                implementations,
            })
        })?;

        Ok((context.reserve(), pending))
    }
}

impl PendingApplication {
    /// Resolves every task reference against `tasks_by_name`.
    pub(crate) fn link(
        self,
        tasks_by_name: &HashMap<String, Ref<Task>>,
        components: &impl ComponentTable,
    ) -> Result<Application, LoadError> {
        let Self {
            name,
            implementations,
        } = self;

        let application = Application {
            name,
            task_implementations: Sequence::new(),
        };
        application.validate_name()?;

        let task_implementations = implementations
            .into_iter()
            .map(|implementation| implementation.link(&application.name, tasks_by_name, components))
            .collect::<Result<_, _>>()?;

        Ok(Application {
            task_implementations,
            ..application
        })
    }
}

impl TaskImplementation {
    pub const TAG_NAME: &'static str = "TaskImplementation";
}

impl PendingTaskImplementation {
    fn map_from_xml(node: Node) -> Result<Self, LoadError> {
        map_strict(node, &["TaskName"], |implementation| {
            let task_name = implementation
                .required_attribute(TaskImplementation::TAG_NAME, "TaskName")?
                .to_string();
            let custom_arguments = implementation
                .element(CustomArguments::TAG_NAME)?
                .map(CustomArguments::map_from_xml)
                .transpose()?;
            Ok(Self {
                task_name,
                custom_arguments,
            })
        })
    }

    fn link(
        self,
        application: &str,
        tasks_by_name: &HashMap<String, Ref<Task>>,
        components: &impl ComponentTable,
    ) -> Result<TaskImplementation, ReferenceError> {
        let task = tasks_by_name.get(&self.task_name).copied().ok_or_else(|| {
            ReferenceError::UndefinedTask {
                application: application.to_string(),
                task: self.task_name.clone(),
            }
        })?;

        if let Some(custom_arguments) = &self.custom_arguments {
            custom_arguments.check_against(components.get(task));
        }

        Ok(TaskImplementation {
            task_name: self.task_name,
            task,
            custom_arguments: self.custom_arguments,
        })
    }
}

impl CustomArguments {
    pub const TAG_NAME: &'static str = "CustomArguments";

    fn map_from_xml(node: Node) -> Result<Self, LoadError> {
        map_strict(node, &[], |custom_arguments| {
            let arguments = custom_arguments
                .elements(CustomArgument::TAG_NAME)
                .into_iter()
                .map(CustomArgument::map_from_xml)
                .collect::<Result<_, _>>()?;
            Ok(Self { arguments })
        })
    }

    /// Argument text is only stored; the owning task is known to exist at this point.
    fn check_against(&self, task: &Task) {
        for argument in &self.arguments {
            tracing::debug!(
                task = %task.name,
                condition = argument.condition.as_deref(),
                text = %argument.text,
                "stored custom argument text"
            );
        }
    }
}

impl CustomArgument {
    pub const TAG_NAME: &'static str = "Argument";

    fn map_from_xml(node: Node) -> Result<Self, LoadError> {
        map_strict(node, &["Condition"], |argument| {
            let condition = argument.attribute_value("Condition")?;
            let text = argument.text();
            Ok(Self { condition, text })
        })
    }
}

impl Component for Application {
    const DISPLAY_NAME: &'static str = "ConsoleApplication";
}

impl Named for Application {
    fn name(&self) -> &str {
        &self.name
    }
}
