//! How each model type crosses the native/managed boundary.
//!
//! Every spelling a writer needs (native declaration, managed declaration,
//! P/Invoke declaration, argument expressions, return adaptation) comes
//! from one [`Shape`], so the two sides cannot disagree about a type.

use csbind_model::{ClassModel, TypeRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Void,
    /// Marshaled as a one-byte value on both sides.
    Bool,
    Number {
        native: &'static str,
        managed: &'static str,
    },
    /// Engine string on the native side, C string across the boundary.
    String,
    Enum(String),
    /// Reference-counted engine object, passed as a handle.
    Object { native: String, managed: String },
    /// Number-array value type, passed by reference.
    Value { native: String, managed: String },
    /// Hidden engine context; never appears in a managed signature.
    Context,
}

impl Shape {
    /// `None` when the type has no marshaling pattern.
    pub fn of(model: &ClassModel, ty: &TypeRef) -> Option<Self> {
        Some(match ty {
            TypeRef::Void => Self::Void,
            TypeRef::Bool => Self::Bool,
            TypeRef::Int => Self::Number {
                native: "int",
                managed: "int",
            },
            TypeRef::UInt => Self::Number {
                native: "unsigned",
                managed: "uint",
            },
            TypeRef::Float => Self::Number {
                native: "float",
                managed: "float",
            },
            TypeRef::Double => Self::Number {
                native: "double",
                managed: "double",
            },
            TypeRef::String => Self::String,
            TypeRef::Context => Self::Context,
            TypeRef::Enum(name) => Self::Enum(name.clone()),
            TypeRef::Class(id) => {
                let class = model.class(*id);
                let native = class.native_name.clone();
                let managed = class.name.clone();
                if class.is_number_array {
                    Self::Value { native, managed }
                } else {
                    Self::Object { native, managed }
                }
            }
            TypeRef::StringVector
            | TypeRef::Vector(_)
            | TypeRef::Callback
            | TypeRef::RawPointer
            | TypeRef::Unsupported(_) => return None,
        })
    }

    pub fn param(model: &ClassModel, ty: &TypeRef) -> Option<Self> {
        Self::of(model, ty).filter(|shape| *shape != Self::Void)
    }

    pub fn result(model: &ClassModel, ty: &TypeRef) -> Option<Self> {
        Self::of(model, ty).filter(|shape| *shape != Self::Context)
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub const fn is_hidden(&self) -> bool {
        matches!(self, Self::Context)
    }

    /// Managed type name as it appears in the wrapper's own signatures.
    pub fn managed_type(&self) -> String {
        match self {
            Self::Void => "void".into(),
            Self::Bool => "bool".into(),
            Self::Number { managed, .. } => (*managed).into(),
            Self::String => "string".into(),
            Self::Enum(name) => name.clone(),
            Self::Object { managed, .. } | Self::Value { managed, .. } => managed.clone(),
            Self::Context => "IntPtr".into(),
        }
    }

    // Native side

    /// Parameter declaration in an exported function, `None` when hidden.
    pub fn native_param(&self, name: &str) -> Option<String> {
        Some(match self {
            Self::Void | Self::Context => return None,
            Self::Bool => format!("bool {name}"),
            Self::Number { native, .. } => format!("{native} {name}"),
            Self::String => format!("const char* {name}"),
            Self::Enum(enum_name) => format!("{enum_name} {name}"),
            Self::Object { native, .. } | Self::Value { native, .. } => {
                format!("{native}* {name}")
            }
        })
    }

    /// Expression forwarding an exported parameter to the native call.
    pub fn native_arg(&self, name: &str, context_expr: &str) -> String {
        match self {
            Self::Context => context_expr.to_string(),
            Self::Value { .. } => format!("*{name}"),
            _ => name.to_string(),
        }
    }

    pub fn native_return_type(&self) -> String {
        match self {
            Self::Void | Self::Value { .. } | Self::Context => "void".into(),
            Self::Bool => "bool".into(),
            Self::Number { native, .. } => (*native).into(),
            Self::String => "const char*".into(),
            Self::Enum(name) => name.clone(),
            Self::Object { native, .. } => format!("{native}*"),
        }
    }

    /// Extra trailing parameter carrying a value-type result.
    pub fn native_out_param(&self) -> Option<String> {
        match self {
            Self::Value { native, .. } => Some(format!("{native}* retValue")),
            _ => None,
        }
    }

    /// Statements returning `call` from an exported function.
    pub fn native_return_lines(&self, call: &str) -> Vec<String> {
        match self {
            Self::Void | Self::Context => vec![format!("{call};")],
            Self::String => vec![
                "static String returnValue;".into(),
                format!("returnValue = {call};"),
                "return returnValue.CString();".into(),
            ],
            Self::Value { .. } => vec![format!("*retValue = {call};")],
            _ => vec![format!("return {call};")],
        }
    }

    // P/Invoke side

    pub fn pinvoke_param(&self, name: &str) -> Option<String> {
        Some(match self {
            Self::Void | Self::Context => return None,
            Self::Bool => format!("[MarshalAs(UnmanagedType.I1)] bool {name}"),
            Self::Number { managed, .. } => format!("{managed} {name}"),
            Self::String => format!("string {name}"),
            Self::Enum(enum_name) => format!("{enum_name} {name}"),
            Self::Object { .. } => format!("IntPtr {name}"),
            Self::Value { managed, .. } => format!("ref {managed} {name}"),
        })
    }

    /// Expression passing managed parameter `name` to the import.
    pub fn pinvoke_arg(&self, name: &str) -> Option<String> {
        Some(match self {
            Self::Void | Self::Context => return None,
            Self::Object { .. } => format!("{name} == null ? IntPtr.Zero : {name}.nativeInstance"),
            Self::Value { .. } => format!("ref {name}"),
            _ => name.to_string(),
        })
    }

    pub fn pinvoke_return_type(&self) -> String {
        match self {
            Self::Void | Self::Value { .. } | Self::Context => "void".into(),
            Self::String | Self::Object { .. } => "IntPtr".into(),
            other => other.managed_type(),
        }
    }

    /// Attribute line preceding the import declaration, if the return needs one.
    pub fn pinvoke_return_attribute(&self) -> Option<&'static str> {
        matches!(self, Self::Bool).then_some("[return: MarshalAs(UnmanagedType.I1)]")
    }

    pub fn pinvoke_out_param(&self) -> Option<String> {
        match self {
            Self::Value { managed, .. } => Some(format!("out {managed} retValue")),
            _ => None,
        }
    }

    /// Statements in the managed wrapper turning the import call into the
    /// wrapper's result. `call` must already carry `out retValue` when
    /// [`Self::pinvoke_out_param`] applies.
    pub fn managed_return_lines(&self, call: &str) -> Vec<String> {
        match self {
            Self::Void | Self::Context => vec![format!("{call};")],
            Self::String => vec![format!("return Marshal.PtrToStringAnsi({call});")],
            Self::Object { managed, .. } => {
                vec![format!("return NativeCore.WrapNative<{managed}>({call});")]
            }
            Self::Value { managed, .. } => vec![
                format!("{managed} retValue;"),
                format!("{call};"),
                "return retValue;".into(),
            ],
            _ => vec![format!("return {call};")],
        }
    }
}

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Parameter name safe to use in both languages. `retValue` and `self` are
/// taken by the generated code itself.
pub fn safe_param_name(name: &str) -> String {
    if CSHARP_KEYWORDS.contains(&name) || matches!(name, "retValue" | "self" | "value") {
        format!("_{name}")
    } else {
        name.to_string()
    }
}
