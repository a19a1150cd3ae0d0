use serde::{Deserialize, Serialize};
use std::fmt;

/// Package name of the host process. Fixed for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessIdentity(String);

impl ProcessIdentity {
    pub fn new(package: impl Into<String>) -> Self {
        Self(package.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a class-loading context inside the host.
///
/// Two classes with the same name but different loaders are distinct symbols.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoaderId(String);

impl LoaderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully-qualified type name as the host spells it (`int`, `java.lang.String`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn int() -> Self {
        Self::new("int")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    /// Whether a literal of this shape can stand in for a value of this type.
    ///
    /// `Null` is accepted by `void` and by every reference type, never by a
    /// primitive. Numeric and boolean literals also fit their boxed wrappers.
    pub fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Null => !self.is_primitive(),
            Value::Bool(_) => matches!(self.0.as_str(), "boolean" | "java.lang.Boolean"),
            Value::Int(_) => matches!(
                self.0.as_str(),
                "int" | "short" | "byte" | "java.lang.Integer"
            ),
            Value::Long(_) => matches!(self.0.as_str(), "long" | "java.lang.Long"),
            Value::Str(_) | Value::Loader(_) | Value::Object(_) | Value::List(_) => {
                !self.is_primitive() && !self.is_void()
            }
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reference to a live object owned by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub class: String,
    pub id: u64,
}

/// A value crossing the host boundary: hook arguments, results and literals.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Str(String),
    Loader(LoaderId),
    Object(ObjectRef),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_loader(&self) -> Option<&LoaderId> {
        match self {
            Self::Loader(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short label used in type-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Str(_) => "string",
            Self::Loader(_) => "class-loader",
            Self::Object(_) => "object",
            Self::List(_) => "list",
        }
    }
}

/// A class resolved within a specific loader.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassHandle {
    pub name: String,
    pub loader: LoaderId,
}

impl ClassHandle {
    pub fn new(name: impl Into<String>, loader: LoaderId) -> Self {
        Self {
            name: name.into(),
            loader,
        }
    }

    /// Unqualified name, with nested-class separators kept (`Outer$Inner`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A declared method of a resolved class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodHandle {
    pub class: ClassHandle,
    pub name: String,
    pub params: Vec<TypeName>,
    pub return_type: TypeName,
    pub is_static: bool,
}

impl MethodHandle {
    /// `Class.method(int,java.lang.String)`
    pub fn descriptor(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(TypeName::as_str).collect();
        format!("{}.{}({})", self.class.name, self.name, params.join(","))
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// A declared field of a resolved class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldHandle {
    pub class: ClassHandle,
    pub name: String,
    pub ty: TypeName,
    pub is_static: bool,
}

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.name, self.name)
    }
}

/// Invocation state handed to hook payloads.
///
/// `result` is only populated for after-advice, once the original body has
/// returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallFrame {
    pub this: Option<Value>,
    pub args: Vec<Value>,
    pub result: Option<Value>,
}

impl CallFrame {
    pub fn new(this: Option<Value>, args: Vec<Value>) -> Self {
        Self {
            this,
            args,
            result: None,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}
