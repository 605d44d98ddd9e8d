use std::collections::HashMap;

use super::{
    components::{Component, Ref},
    error::ReferenceError,
    EnumDefinition,
};

/// Prefix of a `Type` attribute that names a document-declared enum.
pub const ENUM_TYPE_PREFIX: &str = "Enum:";

/// Placeholder for an enum named by one or more parameter types, bound to its definition during
/// the enum phase of linking.
#[derive(Clone, Debug)]
pub struct EnumTypeReference {
    name: String,
    definition: Option<Ref<EnumDefinition>>,
}

impl EnumTypeReference {
    /// The enum name, without the `Enum:` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> Option<Ref<EnumDefinition>> {
        self.definition
    }
}

impl Component for EnumTypeReference {
    const DISPLAY_NAME: &'static str = "EnumTypeReference";
}

/// Handle to an interned [`EnumTypeReference`]. Parameters naming the same enum hold equal
/// handles.
pub type EnumType = Ref<EnumTypeReference>;

fn strip_prefix(token: &str) -> &str {
    token.strip_prefix(ENUM_TYPE_PREFIX).unwrap_or(token)
}

/// Per-load table of enum placeholders.
///
/// Placeholders are kept in creation order, which is also the order in which they are resolved.
#[derive(Debug, Default)]
pub(crate) struct ReferenceInterner {
    by_name: HashMap<String, EnumType>,
    worklist: Vec<EnumTypeReference>,
}

impl ReferenceInterner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the placeholder for `token`, creating it on first use. `Enum:Color` and `Color`
    /// denote the same placeholder.
    pub(crate) fn intern(&mut self, token: &str) -> EnumType {
        if let Some(existing) = self.lookup(token) {
            return existing;
        }

        let name = strip_prefix(token);
        let handle = Ref::from_index(self.worklist.len());
        self.worklist.push(EnumTypeReference {
            name: name.to_string(),
            definition: None,
        });
        self.by_name.insert(name.to_string(), handle);
        tracing::trace!(name, ?handle, "interned enum type reference");
        handle
    }

    pub(crate) fn lookup(&self, token: &str) -> Option<EnumType> {
        self.by_name.get(strip_prefix(token)).copied()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, handle: EnumType) -> &EnumTypeReference {
        self.worklist
            .get(handle.index())
            .expect("Invalid enum type reference (out-of-bounds)")
    }

    pub(crate) fn len(&self) -> usize {
        self.worklist.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Binds every placeholder to the definition of the same name. Each placeholder is resolved
    /// exactly once, no matter how many parameters refer to it.
    pub(crate) fn resolve_all(
        &mut self,
        enums_by_name: &HashMap<String, Ref<EnumDefinition>>,
    ) -> Result<(), ReferenceError> {
        for reference in &mut self.worklist {
            let definition = enums_by_name.get(&reference.name).copied().ok_or_else(|| {
                ReferenceError::UndefinedEnum {
                    name: reference.name.clone(),
                }
            })?;
            reference.definition = Some(definition);
        }
        Ok(())
    }

    /// The bound definition of every placeholder, indexed like the placeholders themselves.
    pub(crate) fn into_bindings(self) -> Result<Box<[Ref<EnumDefinition>]>, ReferenceError> {
        self.worklist
            .into_iter()
            .map(|reference| {
                reference
                    .definition
                    .ok_or(ReferenceError::UndefinedEnum {
                        name: reference.name,
                    })
            })
            .collect()
    }
}
