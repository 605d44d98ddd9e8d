//! Second pass over a mapped document. The phases run strictly in order (enums, tasks,
//! applications) and each one completes before the next starts; the first error aborts the load.

use std::collections::HashMap;

use super::{
    application::PendingApplication,
    components::{ComponentTable, ConstructionComponentTable, Named},
    document::MappedDocument,
    error::{LoadError, StructuralError},
    interner::ReferenceInterner,
    Application, Document, DuplicateParameterAction, EnumDefinition, MappingContext, Ref, Task,
};

pub(crate) fn link(context: MappingContext, mapped: MappedDocument) -> Result<Document, LoadError> {
    let (mut components, mut interner, options) = context.into_parts();
    let MappedDocument {
        enums,
        tasks,
        applications,
    } = mapped;

    let enums_by_name = link_enums(&components, &enums, &mut interner)?;
    let tasks_by_name = link_tasks(&mut components, &tasks, options.duplicate_parameters)?;
    let applications = link_applications(&mut components, applications, &tasks_by_name)?;

    Ok(Document {
        enums,
        tasks,
        applications,
        enums_by_name,
        tasks_by_name,
        enum_types: interner.into_bindings()?,
        // A slot that was reserved but never filled fails the conversion.
        components: components.convert_to_document_table()?,
    })
}

/// Phase 1: validates every enum, indexes them by name and binds every interned enum type.
fn link_enums(
    components: &ConstructionComponentTable,
    enums: &[Ref<EnumDefinition>],
    interner: &mut ReferenceInterner,
) -> Result<HashMap<String, Ref<EnumDefinition>>, LoadError> {
    let _span = tracing::debug_span!("link_enums").entered();

    let mut enums_by_name = HashMap::with_capacity(enums.len());
    for &ref_ in enums {
        let definition = ref_.get(components);
        definition.validate()?;
        register_unique(&mut enums_by_name, definition, ref_)?;
    }

    interner.resolve_all(&enums_by_name)?;

    tracing::debug!(
        enums = enums.len(),
        references = interner.len(),
        "resolved enum types"
    );
    Ok(enums_by_name)
}

/// Phase 2: validates every task and builds its parameter index.
fn link_tasks(
    components: &mut ConstructionComponentTable,
    tasks: &[Ref<Task>],
    duplicate_parameters: DuplicateParameterAction,
) -> Result<HashMap<String, Ref<Task>>, LoadError> {
    let _span = tracing::debug_span!("link_tasks").entered();

    let mut tasks_by_name = HashMap::with_capacity(tasks.len());
    for &ref_ in tasks {
        let task = components.get_mut(ref_);
        task.validate()?;
        task.build_parameter_index(duplicate_parameters)?;
        register_unique(&mut tasks_by_name, task, ref_)?;
    }

    tracing::debug!(tasks = tasks.len(), "indexed tasks");
    Ok(tasks_by_name)
}

/// Phase 3: resolves the task of every task implementation and fills the reserved application
/// slots.
fn link_applications(
    components: &mut ConstructionComponentTable,
    applications: Vec<(Ref<Application>, PendingApplication)>,
    tasks_by_name: &HashMap<String, Ref<Task>>,
) -> Result<Vec<Ref<Application>>, LoadError> {
    let _span = tracing::debug_span!("link_applications").entered();

    let mut linked = Vec::with_capacity(applications.len());
    for (ref_, pending) in applications {
        let application = pending.link(tasks_by_name, &*components)?;
        linked.push(components.insert(ref_, application));
    }

    tracing::debug!(applications = linked.len(), "linked applications");
    Ok(linked)
}

fn register_unique<C: Named>(
    by_name: &mut HashMap<String, Ref<C>>,
    component: &C,
    ref_: Ref<C>,
) -> Result<(), StructuralError> {
    if by_name.insert(component.name().to_string(), ref_).is_some() {
        return Err(StructuralError::DuplicateName {
            kind: C::DISPLAY_NAME,
            name: component.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FormatError, ReferenceError},
        load, LoadOptions,
    };

    #[test]
    fn enum_phase_runs_before_task_phase() {
        // Both an unnamed task and an undefined enum: the enum phase reports first.
        let error = load(
            r#"<Gti><Task Name=""><Parameter Type="Enum:Missing"/></Task></Gti>"#,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            LoadError::Reference(ReferenceError::UndefinedEnum { .. })
        ));
    }

    #[test]
    fn task_phase_runs_before_application_phase() {
        let error = load(
            r#"<Gti>
                <Task Name="Build"/>
                <Task Name="Build"/>
                <ConsoleApplication Name="make"><TaskImplementation TaskName="Missing"/></ConsoleApplication>
            </Gti>"#,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            LoadError::Structural(StructuralError::DuplicateName { kind: "Task", ref name })
                if name == "Build"
        ));
    }

    #[test]
    fn duplicate_enum_names_are_rejected() {
        let error = load(
            r#"<Gti><Enum Name="Color"/><Enum Name="Color"><Value Name="Red"/></Enum></Gti>"#,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            LoadError::Structural(StructuralError::DuplicateName { kind: "Enum", .. })
        ));
    }

    #[test]
    fn unnamed_task_is_a_format_error() {
        let error = load(r#"<Gti><Task/></Gti>"#).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Format(FormatError::EmptyName { element: "Task" })
        ));
    }

    #[test]
    fn unnamed_enum_is_a_format_error() {
        let error = load(r#"<Gti><Enum><Value Name="a"/></Enum></Gti>"#).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Format(FormatError::EmptyName { element: "Enum" })
        ));
    }

    #[test]
    fn unused_enums_need_no_references() {
        let document = load(r#"<Gti><Enum Name="Unused"><Value Name="a"/></Enum></Gti>"#).unwrap();
        assert_eq!(document.enums().len(), 1);
    }

    #[test]
    fn reserved_but_unfilled_slot_fails_linking() {
        let options = LoadOptions::default();
        let mut context = MappingContext::new(&options);
        let orphan: Ref<Application> = context.reserve();
        let mapped = MappedDocument {
            enums: vec![],
            tasks: vec![],
            applications: vec![],
        };

        let error = link(context, mapped).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Structural(StructuralError::UnreferencedObject {
                kind: "ConsoleApplication",
                index
            }) if index == orphan.index()
        ));
    }
}
