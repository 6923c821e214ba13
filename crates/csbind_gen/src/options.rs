use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::indent::DEFAULT_INDENT_WIDTH;

/// Knobs for both emitters. `Default` matches the Atomic engine's
/// conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    pub indent_width: usize,
    pub native: NativeOptions,
    pub managed: ManagedOptions,
    pub omit: OmitRules,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            native: NativeOptions::default(),
            managed: ManagedOptions::default(),
            omit: OmitRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeOptions {
    /// Macro placed in front of every exported function.
    pub export_macro: String,
    /// Expression passed wherever a native signature takes the engine context.
    pub context_expr: String,
    /// Native namespace; the package name when unset.
    pub namespace: Option<String>,
    /// Include targets, spelled as they should appear after `#include`.
    pub includes: Vec<String>,
}

impl Default for NativeOptions {
    fn default() -> Self {
        Self {
            export_macro: "ATOMIC_EXPORT_API".into(),
            context_expr: "NETCore::GetContext()".into(),
            namespace: None,
            includes: vec!["\"NETCore.h\"".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedOptions {
    /// Expression naming the native library in `DllImport`.
    pub library: String,
    pub calling_convention: String,
    pub char_set: String,
    /// Managed namespace; the package name when unset.
    pub namespace: Option<String>,
    pub usings: Vec<String>,
}

impl Default for ManagedOptions {
    fn default() -> Self {
        Self {
            library: "Constants.LIBNAME".into(),
            calling_convention: "Cdecl".into(),
            char_set: "Ansi".into(),
            namespace: None,
            usings: vec!["System".into(), "System.Runtime.InteropServices".into()],
        }
    }
}

impl ManagedOptions {
    /// Namespace the classes of `package` are declared in.
    pub fn namespace_for<'a>(&'a self, package: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(package)
    }

    /// The attribute placed on every extern import. It is the same string for
    /// every import so both sides agree on one calling convention.
    pub fn dll_import(&self) -> String {
        format!(
            "[DllImport ({}, CallingConvention = CallingConvention.{}, CharSet = CharSet.{})]",
            self.library, self.calling_convention, self.char_set
        )
    }
}

/// Members left out on purpose, typically because a platform lacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmitRules {
    /// Every member of these classes is omitted; the class itself still binds.
    pub classes: BTreeSet<String>,
    /// Entries of the form `Class::Function`.
    pub functions: BTreeSet<String>,
}

impl OmitRules {
    pub fn omits(&self, class: &str, function: &str) -> bool {
        self.classes.contains(class) || self.functions.contains(&format!("{class}::{function}"))
    }

    pub fn merge(&mut self, other: &Self) {
        self.classes.extend(other.classes.iter().cloned());
        self.functions.extend(other.functions.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty()
    }
}
