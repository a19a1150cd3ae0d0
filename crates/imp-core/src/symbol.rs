//! Symbol descriptors and their resolved forms.

use crate::types::{ClassHandle, FieldHandle, MethodHandle, TypeName};
use std::fmt;

/// Parameter-type filter for member lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    /// First member with a matching name wins, whatever its parameters.
    Any,
    /// Exact arity and exact parameter types, in order.
    Exact(Vec<TypeName>),
}

impl Signature {
    pub fn exact<I, T>(params: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        Self::Exact(params.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, params: &[TypeName]) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected.as_slice() == params,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("(..)"),
            Self::Exact(params) => {
                let params: Vec<&str> = params.iter().map(TypeName::as_str).collect();
                write!(f, "({})", params.join(","))
            }
        }
    }
}

/// One lookup target: a class, or a member of a named class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolDescriptor {
    Class {
        class: String,
    },
    Method {
        class: String,
        name: String,
        signature: Signature,
    },
    Field {
        class: String,
        name: String,
    },
}

impl SymbolDescriptor {
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
        }
    }

    pub fn method(class: impl Into<String>, name: impl Into<String>, signature: Signature) -> Self {
        Self::Method {
            class: class.into(),
            name: name.into(),
            signature,
        }
    }

    pub fn field(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Field {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Name of the class that has to be loaded before anything else is tried.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Class { class } | Self::Method { class, .. } | Self::Field { class, .. } => class,
        }
    }
}

impl fmt::Display for SymbolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { class } => f.write_str(class),
            Self::Method {
                class,
                name,
                signature,
            } => write!(f, "{class}.{name}{signature}"),
            Self::Field { class, name } => write!(f, "{class}.{name}"),
        }
    }
}

/// Ordered alternatives for one logical symbol. The first resolvable entry
/// wins; later entries are fallbacks for other host builds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolCandidates(Vec<SymbolDescriptor>);

impl SymbolCandidates {
    pub fn new(candidates: Vec<SymbolDescriptor>) -> Self {
        Self(candidates)
    }

    /// Candidates that are plain class names, tried in the given order.
    pub fn classes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(SymbolDescriptor::class).collect())
    }

    pub fn single(descriptor: SymbolDescriptor) -> Self {
        Self(vec![descriptor])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SymbolDescriptor>> for SymbolCandidates {
    fn from(value: Vec<SymbolDescriptor>) -> Self {
        Self(value)
    }
}

impl FromIterator<SymbolDescriptor> for SymbolCandidates {
    fn from_iter<T: IntoIterator<Item = SymbolDescriptor>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for SymbolCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(" | "))
    }
}

/// Handle produced by a successful lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedSymbol {
    Class(ClassHandle),
    Method(MethodHandle),
    Field(FieldHandle),
}

impl ResolvedSymbol {
    pub fn as_class(&self) -> Option<&ClassHandle> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodHandle> {
        match self {
            Self::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldHandle> {
        match self {
            Self::Field(field) => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => class.fmt(f),
            Self::Method(method) => method.fmt(f),
            Self::Field(field) => field.fmt(f),
        }
    }
}
