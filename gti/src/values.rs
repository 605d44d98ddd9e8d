use super::{
    error::FormatError,
    interner::{ReferenceInterner, ENUM_TYPE_PREFIX},
    task::ParameterType,
};

/// Conversion from the text of an attribute to its typed value.
pub trait ActualValue<'a>: Sized {
    fn convert(src: &'a str, attribute: &'static str) -> Result<Self, FormatError>;
}

impl<'a> ActualValue<'a> for &'a str {
    fn convert(src: &'a str, _attribute: &'static str) -> Result<Self, FormatError> {
        Ok(src)
    }
}

impl ActualValue<'_> for String {
    fn convert(src: &str, _attribute: &'static str) -> Result<Self, FormatError> {
        Ok(src.to_string())
    }
}

impl ActualValue<'_> for bool {
    // Only the canonical lowercase forms are accepted.
    fn convert(src: &str, attribute: &'static str) -> Result<Self, FormatError> {
        match src {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(FormatError::InvalidBoolean {
                attribute,
                value: src.to_string(),
            }),
        }
    }
}

pub fn actual_value<'a, T: ActualValue<'a>>(
    src: &'a str,
    attribute: &'static str,
) -> Result<T, FormatError> {
    T::convert(src, attribute)
}

/// Converts a `Type` attribute. `Enum:<name>` tokens are interned, so every parameter naming the
/// same enum receives the same placeholder.
pub fn type_value(
    src: &str,
    interner: &mut ReferenceInterner,
) -> Result<ParameterType, FormatError> {
    if src.starts_with(ENUM_TYPE_PREFIX) {
        return Ok(ParameterType::Enum(interner.intern(src)));
    }
    match src {
        "File" => Ok(ParameterType::File),
        "InputFile" => Ok(ParameterType::InputFile),
        "Directory" => Ok(ParameterType::Directory),
        "OutputDirectory" => Ok(ParameterType::OutputDirectory),
        _ => Err(FormatError::InvalidType {
            value: src.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_case_sensitive() {
        assert_eq!(actual_value::<bool>("true", "Optional"), Ok(true));
        assert_eq!(actual_value::<bool>("false", "Optional"), Ok(false));
        for src in ["True", "FALSE", "1", "0", "", " true"] {
            assert_eq!(
                actual_value::<bool>(src, "Multiple"),
                Err(FormatError::InvalidBoolean {
                    attribute: "Multiple",
                    value: src.to_string()
                })
            );
        }
    }

    #[test]
    fn fixed_types_must_match_exactly() {
        let mut interner = ReferenceInterner::new();
        assert_eq!(type_value("File", &mut interner), Ok(ParameterType::File));
        assert_eq!(
            type_value("OutputDirectory", &mut interner),
            Ok(ParameterType::OutputDirectory)
        );
        assert!(matches!(
            type_value("file", &mut interner),
            Err(FormatError::InvalidType { .. })
        ));
        // `Enum` on its own is not a type; only the prefixed form names an enum
        assert!(matches!(
            type_value("Enum", &mut interner),
            Err(FormatError::InvalidType { .. })
        ));
        assert!(interner.is_empty());
    }

    #[test]
    fn enum_tokens_are_interned() {
        let mut interner = ReferenceInterner::new();
        let a = type_value("Enum:Color", &mut interner).unwrap();
        let b = type_value("Enum:Color", &mut interner).unwrap();
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }
}
