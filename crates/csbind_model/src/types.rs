use crate::model::{ClassId, ClassModel};

/// Parameter and return types as the model describes them.
///
/// This is deliberately coarse: it captures what the generator needs to pick
/// a marshaling pattern, not the full native type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Void,
    Bool,
    Int,
    UInt,
    Float,
    Double,
    /// The engine string class, passed as a C string across the boundary.
    String,
    /// Hidden engine context argument filled in on the native side.
    Context,
    Enum(String),
    Class(ClassId),
    StringVector,
    Vector(Box<TypeRef>),
    Callback,
    RawPointer,
    /// A generic the generator knows nothing about, kept by spelling.
    Unsupported(String),
}

impl TypeRef {
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Human-readable name, resolving class ids against `model`.
    pub fn describe(&self, model: &ClassModel) -> String {
        match self {
            Self::Void => "void".into(),
            Self::Bool => "bool".into(),
            Self::Int => "int".into(),
            Self::UInt => "uint".into(),
            Self::Float => "float".into(),
            Self::Double => "double".into(),
            Self::String => "string".into(),
            Self::Context => "context".into(),
            Self::Enum(name) => format!("enum:{name}"),
            Self::Class(id) => model.class(*id).name.clone(),
            Self::StringVector => "vector<string>".into(),
            Self::Vector(element) => format!("vector<{}>", element.describe(model)),
            Self::Callback => "callback".into(),
            Self::RawPointer => "void*".into(),
            Self::Unsupported(spelling) => spelling.clone(),
        }
    }

    /// Parse a type spelling from a model description.
    ///
    /// `resolve_class` maps a bare identifier to a class; `Err` carries the
    /// identifier that could not be resolved.
    pub fn parse<F>(spelling: &str, resolve_class: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<ClassId>,
    {
        let spelling = spelling.trim();
        let lowered = spelling.to_ascii_lowercase();

        let parsed = match lowered.as_str() {
            "" | "void" | "unit" => Self::Void,
            "bool" => Self::Bool,
            "int" | "i32" | "int32" => Self::Int,
            "uint" | "unsigned" | "u32" | "uint32" => Self::UInt,
            "float" | "f32" => Self::Float,
            "double" | "f64" => Self::Double,
            "string" | "str" | "const string&" => Self::String,
            "context" | "context*" => Self::Context,
            "callback" | "function" => Self::Callback,
            "void*" | "pointer" => Self::RawPointer,
            _ => {
                if let Some(name) = spelling.strip_prefix("enum:") {
                    return Ok(Self::Enum(name.trim().to_string()));
                }
                let bare = strip_qualifiers(spelling);
                if bare != spelling {
                    let pointer = spelling.ends_with('*');
                    return match bare.to_ascii_lowercase().as_str() {
                        "void" if pointer => Ok(Self::RawPointer),
                        "char" if pointer => Ok(Self::String),
                        _ => Self::parse(bare, resolve_class),
                    };
                }
                if let Some((outer, inner)) = split_generic(spelling) {
                    return match outer.to_ascii_lowercase().as_str() {
                        "vector" | "podvector" | "pod_vector" => {
                            let element = Self::parse(inner, resolve_class)?;
                            Ok(if element == Self::String {
                                Self::StringVector
                            } else {
                                Self::Vector(Box::new(element))
                            })
                        }
                        "sharedptr" | "weakptr" => Self::parse(inner, resolve_class),
                        _ => Ok(Self::Unsupported(spelling.to_string())),
                    };
                }
                return resolve_class(spelling)
                    .map(Self::Class)
                    .ok_or_else(|| spelling.to_string());
            }
        };

        Ok(parsed)
    }
}

/// Drop a leading `const` and trailing `&`/`*`.
fn strip_qualifiers(spelling: &str) -> &str {
    let bare = spelling.trim_end_matches(['*', '&', ' ']);
    bare.strip_prefix("const ").map_or(bare, str::trim_start)
}

/// `Outer<Inner>` split into its two halves.
fn split_generic(spelling: &str) -> Option<(&str, &str)> {
    let open = spelling.find('<')?;
    let inner = spelling.get(open + 1..)?.strip_suffix('>')?;
    let outer = spelling[..open].trim();
    (!outer.is_empty()).then_some((outer, inner.trim()))
}
