use super::{
    components::{Component, ComponentTraits, ConstructionComponentTable, HasArenaContainer},
    interner::ReferenceInterner,
    LoadOptions, Ref,
};

/// State of a single load: the component table being filled and the enum interner. Nothing in
/// here outlives the load, so separate loads never share placeholders.
pub(crate) struct MappingContext<'o> {
    components: ConstructionComponentTable,
    interner: ReferenceInterner,
    options: &'o LoadOptions,
}

impl<'o> MappingContext<'o> {
    pub(crate) fn new(options: &'o LoadOptions) -> Self {
        Self {
            components: ConstructionComponentTable::new(),
            interner: ReferenceInterner::new(),
            options,
        }
    }

    #[cfg(test)]
    pub(crate) fn components(&self) -> &ConstructionComponentTable {
        &self.components
    }

    pub(crate) fn interner_mut(&mut self) -> &mut ReferenceInterner {
        &mut self.interner
    }

    pub(crate) fn reserve<R>(&mut self) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.reserve::<R>()
    }

    pub(crate) fn create<R>(&mut self, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.create(value)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (ConstructionComponentTable, ReferenceInterner, &'o LoadOptions) {
        (self.components, self.interner, self.options)
    }
}
