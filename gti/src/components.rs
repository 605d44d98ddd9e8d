use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::{NonZeroU32, NonZeroUsize};

use super::{
    error::{FormatError, StructuralError},
    Application, EnumDefinition, Task,
};

/// Trait implemented by all entities addressable through a [`Ref`].
pub trait Component {
    const DISPLAY_NAME: &'static str;
}

/// Type on which internal component traits are implemented.
///
/// This type is used to prevent leaking internal functions into the [`Component`]
pub struct ComponentTraits;

/// A component stored in one of the arena tables. Intended for internal use.
pub trait HasArenaContainer<R: Component>: Sized {
    fn get_container_from_construction_component_table(
        table: &ConstructionComponentTable,
    ) -> &[Option<R>];
    fn get_container_from_construction_component_table_mut(
        table: &mut ConstructionComponentTable,
    ) -> &mut Vec<Option<R>>;
    fn get_container_from_document_component_table(table: &DocumentComponentTable) -> &[R];
}

/// A reference to a [`Component`].
///
/// Two equal `Ref`s always denote the very same instance: every lookup through a table returns
/// the same `&R`.
pub struct Ref<R: Component>(NonZeroU32, PhantomData<R>);

impl<R: Component> Ref<R> {
    const fn from_inner(inner: NonZeroU32) -> Self {
        Self(inner, PhantomData)
    }

    /// Builds the reference for the slot at `index` of its container.
    pub(crate) fn from_index(index: usize) -> Self {
        let size = NonZeroUsize::new(index + 1).expect("index + 1 is never zero");
        let id: NonZeroU32 = size.try_into().expect("ID did not fit into 32-bit integer");
        Self::from_inner(id)
    }

    pub(crate) fn index(self) -> usize {
        let size: NonZeroUsize = self
            .0
            .try_into()
            .expect("Could not convert component reference to usize index");
        usize::from(size) - 1
    }

    pub fn get(self, table: &impl ComponentTable) -> &R
    where
        ComponentTraits: HasArenaContainer<R>,
    {
        table.get(self)
    }
}

// derive(...) does not work if R itself does not derive the trait, even though it is only "used"
// in the PhantomData; hence we have to manually implement required traits for the Ref type.

impl<R: Component> Copy for Ref<R> {}

impl<R: Component> Clone for Ref<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Component> fmt::Debug for Ref<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{} #{}>", R::DISPLAY_NAME, self.0)
    }
}

impl<R: Component> PartialEq for Ref<R> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<R: Component> Eq for Ref<R> {}

impl<R: Component> Hash for Ref<R> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// An arena-like container for the top-level [`Component`]s of a document.
pub trait ComponentTable {
    /// Retrieves a component's value by reference from this component table.
    /// This function panics if the component value is not present in the table.
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>;
}

/// The [component table](ComponentTable) used while a document is mapped and linked.
///
/// The containers hold `Option`s, since an entity's slot may be reserved before the entity itself
/// can be built (applications are only built once their task references are resolved).
#[derive(Default)]
pub struct ConstructionComponentTable {
    enum_definitions: Vec<Option<EnumDefinition>>,
    tasks: Vec<Option<Task>>,
    applications: Vec<Option<Application>>,
}

impl ComponentTable for ConstructionComponentTable {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table(self);
        container
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
            .as_ref()
            .expect("Component is not present")
    }
}

impl ConstructionComponentTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Ref`] which points to an absent, reserved slot in the table.
    pub(crate) fn reserve<R>(&mut self) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);
        container.push(None);
        Ref::from_index(container.len() - 1)
    }

    /// Inserts the `value` into the slot pointed to by `ref_`. Returns `ref_` for convenience.
    pub(crate) fn insert<R>(&mut self, ref_: Ref<R>, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);

        let slot = container
            .get_mut(ref_.index())
            .expect("Invalid component reference (out-of-bounds)");

        *slot = Some(value);

        ref_
    }

    /// Shorthand for `insert(reserve(), value)`
    pub(crate) fn create<R>(&mut self, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let ref_ = self.reserve();
        self.insert(ref_, value)
    }

    pub(crate) fn get_mut<R>(&mut self, ref_: Ref<R>) -> &mut R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        ComponentTraits::get_container_from_construction_component_table_mut(self)
            .get_mut(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
            .as_mut()
            .expect("Component is not present")
    }

    /// Converts this construction table to a [document table](DocumentComponentTable).
    /// A slot that was reserved but never filled is reported as an unreferenced object.
    pub(crate) fn convert_to_document_table(
        self,
    ) -> Result<DocumentComponentTable, StructuralError> {
        Ok(DocumentComponentTable {
            enum_definitions: Self::convert_container(self.enum_definitions)?,
            tasks: Self::convert_container(self.tasks)?,
            applications: Self::convert_container(self.applications)?,
        })
    }

    /// Helper for [`Self::convert_to_document_table()`]
    fn convert_container<R: Component>(
        container: Vec<Option<R>>,
    ) -> Result<Box<[R]>, StructuralError> {
        let mut result = Vec::<R>::with_capacity(container.len());
        for (index, component) in container.into_iter().enumerate() {
            result.push(component.ok_or(StructuralError::UnreferencedObject {
                kind: R::DISPLAY_NAME,
                index,
            })?);
        }
        Ok(result.into_boxed_slice())
    }
}

/// The read-only [component table](ComponentTable) owned by a linked document.
///
/// Components for which a [`Ref`] exists will always be present in this table.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentComponentTable {
    enum_definitions: Box<[EnumDefinition]>,
    tasks: Box<[Task]>,
    applications: Box<[Application]>,
}

impl ComponentTable for DocumentComponentTable {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_document_component_table(self);
        container
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
    }
}

macro_rules! has_arena_container_impl {
    ($type_name:ty, $field_name:ident) => {
        impl HasArenaContainer<$type_name> for ComponentTraits {
            fn get_container_from_construction_component_table(
                table: &ConstructionComponentTable,
            ) -> &[Option<$type_name>] {
                &table.$field_name
            }

            fn get_container_from_construction_component_table_mut(
                table: &mut ConstructionComponentTable,
            ) -> &mut Vec<Option<$type_name>> {
                &mut table.$field_name
            }

            fn get_container_from_document_component_table(
                table: &DocumentComponentTable,
            ) -> &[$type_name] {
                &table.$field_name
            }
        }
    };
}

has_arena_container_impl!(EnumDefinition, enum_definitions);
has_arena_container_impl!(Task, tasks);
has_arena_container_impl!(Application, applications);

/// A component carrying a `Name` attribute.
pub trait Named: Component {
    fn name(&self) -> &str;

    /// Fails if the name is empty (or was absent).
    fn validate_name(&self) -> Result<(), FormatError> {
        if self.name().is_empty() {
            return Err(FormatError::EmptyName {
                element: Self::DISPLAY_NAME,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> Task {
        Task {
            name: name.into(),
            description: None,
            parameters: vec![],
            flags: vec![],
            parameter_index: Default::default(),
        }
    }

    #[test]
    fn reserved_slot_is_filled_by_insert() {
        let mut table = ConstructionComponentTable::new();
        let first: Ref<Task> = table.reserve();
        let second = table.create(task("Second"));
        table.insert(first, task("First"));

        assert_ne!(first, second);
        assert_eq!(first.get(&table).name, "First");
        assert_eq!(second.get(&table).name, "Second");
    }

    #[test]
    fn unfilled_slot_is_an_unreferenced_object() {
        let mut table = ConstructionComponentTable::new();
        table.create(task("Kept"));
        let _: Ref<Task> = table.reserve();

        let error = table.convert_to_document_table().unwrap_err();
        assert_eq!(
            error,
            StructuralError::UnreferencedObject {
                kind: "Task",
                index: 1
            }
        );
    }

    #[test]
    fn converted_table_returns_identical_instances() {
        let mut table = ConstructionComponentTable::new();
        let ref_ = table.create(task("Paint"));
        let table = table.convert_to_document_table().unwrap();

        assert!(std::ptr::eq(ref_.get(&table), table.get(ref_)));
        assert_eq!(format!("{ref_:?}"), "<Task #1>");
    }
}
