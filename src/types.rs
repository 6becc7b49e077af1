//! Normalized type representation shared by the semantic analyzer and the
//! code generator.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    Real,
    Boolean,
    Char,
    Texto,
    Enum(String),
    Set(Box<Type>),
    File(Box<Type>),
    Array(Box<Type>),
    Record(RecordLayout),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordLayout {
    pub fields: BTreeMap<String, Type>,
    pub variant: Option<Box<VariantLayout>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantLayout {
    pub discriminant_name: String,
    pub discriminant_type: Type,
    pub branches: Vec<(Vec<String>, BTreeMap<String, Type>)>,
}

impl Type {
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Type::Integer | Type::Char | Type::Boolean | Type::Enum(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Real)
    }

    pub fn display_name(&self) -> String {
        match self {
            Type::Integer => "integer".to_string(),
            Type::Real => "real".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Char => "char".to_string(),
            Type::Texto => "texto".to_string(),
            Type::Enum(name) => format!("enum {name}"),
            Type::Set(elem) => format!("set of {}", elem.display_name()),
            Type::File(elem) => format!("file of {}", elem.display_name()),
            Type::Array(elem) => format!("array of {}", elem.display_name()),
            Type::Record(_) => "record".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_types() {
        assert!(Type::Integer.is_ordinal());
        assert!(Type::Char.is_ordinal());
        assert!(Type::Boolean.is_ordinal());
        assert!(!Type::Real.is_ordinal());
        assert!(!Type::Texto.is_ordinal());
    }

    #[test]
    fn numeric_types() {
        assert!(Type::Integer.is_numeric());
        assert!(Type::Real.is_numeric());
        assert!(!Type::Boolean.is_numeric());
    }
}
