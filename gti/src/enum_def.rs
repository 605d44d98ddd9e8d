use roxmltree::Node;

use super::{
    components::{Component, Named},
    error::{FormatError, LoadError},
    strict::map_strict,
    xstypes::Sequence,
    MappingContext, Ref,
};

/// `<Enum Name="...">`: a named, ordered list of values an enum-typed parameter may take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Sequence<EnumValue>,
}

/// `<Value Name="..."/>` inside an [`EnumDefinition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
}

impl EnumDefinition {
    pub const TAG_NAME: &'static str = "Enum";

    /// The value names in declaration order, as offered to the user.
    pub fn value_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|value| value.name.as_str())
    }

    pub(crate) fn map_from_xml(
        context: &mut MappingContext,
        node: Node,
    ) -> Result<Ref<Self>, LoadError> {
        assert_eq!(node.tag_name().name(), Self::TAG_NAME);

        let definition = map_strict(node, &["Name"], |enum_node| {
            let name = enum_node.attribute_value("Name")?.unwrap_or_default();
            let values = enum_node
                .elements(EnumValue::TAG_NAME)
                .into_iter()
                .map(EnumValue::map_from_xml)
                .collect::<Result<_, _>>()?;
            Ok(Self { name, values })
        })?;

        Ok(context.create(definition))
    }

    /// Both the enum and each of its values must be named. An enum without values is legal.
    pub(crate) fn validate(&self) -> Result<(), FormatError> {
        self.validate_name()?;
        match self.values.iter().position(|value| value.name.is_empty()) {
            Some(index) => Err(FormatError::UnnamedEnumValue {
                enum_name: self.name.clone(),
                index,
            }),
            None => Ok(()),
        }
    }
}

impl EnumValue {
    pub const TAG_NAME: &'static str = "Value";

    fn map_from_xml(node: Node) -> Result<Self, LoadError> {
        map_strict(node, &["Name"], |value| {
            let name = value.attribute_value("Name")?.unwrap_or_default();
            Ok(Self { name })
        })
    }
}

impl Component for EnumDefinition {
    const DISPLAY_NAME: &'static str = "Enum";
}

impl Named for EnumDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::ComponentTable, LoadOptions};

    fn map(xml: &str) -> Result<EnumDefinition, LoadError> {
        let document = roxmltree::Document::parse(xml).unwrap();
        let options = LoadOptions::default();
        let mut context = MappingContext::new(&options);
        let ref_ = EnumDefinition::map_from_xml(&mut context, document.root_element())?;
        Ok(context.components().get(ref_).clone())
    }

    #[test]
    fn maps_values_in_order() {
        let definition =
            map(r#"<Enum Name="Color"><Value Name="Red"/><Value Name="Blue"/></Enum>"#).unwrap();
        assert_eq!(definition.name, "Color");
        assert_eq!(definition.value_names().collect::<Vec<_>>(), ["Red", "Blue"]);
        definition.validate().unwrap();
    }

    #[test]
    fn empty_enum_is_valid() {
        let definition = map(r#"<Enum Name="Nothing"/>"#).unwrap();
        assert!(definition.values.is_empty());
        definition.validate().unwrap();
    }

    #[test]
    fn unnamed_value_fails_validation() {
        let definition = map(r#"<Enum Name="Color"><Value Name="Red"/><Value/></Enum>"#).unwrap();
        assert_eq!(
            definition.validate(),
            Err(FormatError::UnnamedEnumValue {
                enum_name: "Color".into(),
                index: 1
            })
        );
        assert_eq!(
            definition.validate().unwrap_err().to_string(),
            "Missing required attribute 'Name' on <Value> in Enum 'Color' (value #1)"
        );
    }

    #[test]
    fn unnamed_enum_fails_validation() {
        let definition = map(r#"<Enum Name=""><Value Name="Red"/></Enum>"#).unwrap();
        assert_eq!(
            definition.validate(),
            Err(FormatError::EmptyName { element: "Enum" })
        );
    }

    #[test]
    fn value_with_unknown_attribute_is_rejected() {
        let error = map(r#"<Enum Name="Color"><Value Name="Red" Rgb="f00"/></Enum>"#).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Structural(crate::error::StructuralError::UnknownAttribute { ref name, ref path, .. })
                if name == "Rgb" && path == "Enum 'Color'/Value 'Red'"
        ));
    }
}
