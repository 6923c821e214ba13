//! Exported symbol naming.
//!
//! The native shim defines and the managed side imports the same symbol, so
//! both call [`export_symbol`] and nothing else spells symbol names.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use csbind_model::{Class, Function};
use parking_lot::Mutex;

use crate::error::{GenError, GenResult};

pub const SYMBOL_PREFIX: &str = "csb";
pub const CLASS_ID_MEMBER: &str = "GetClassIDStatic";
pub const CONSTRUCTOR_MEMBER: &str = "Constructor";

/// `csb_{package}_{class}_{member}`.
pub fn export_symbol(package: &str, class: &str, member: &str) -> String {
    format!("{SYMBOL_PREFIX}_{package}_{class}_{member}")
}

pub fn class_id_symbol(package: &str, class: &str) -> String {
    export_symbol(package, class, CLASS_ID_MEMBER)
}

/// Managed method name for a native operator token.
pub fn operator_method_name(token: &str) -> Option<&'static str> {
    Some(match token {
        "==" => "op_Equality",
        "!=" => "op_Inequality",
        "<" => "op_LessThan",
        ">" => "op_GreaterThan",
        "<=" => "op_LessThanOrEqual",
        ">=" => "op_GreaterThanOrEqual",
        "+" => "op_Addition",
        "-" => "op_Subtraction",
        "*" => "op_Multiply",
        "/" => "op_Division",
        _ => return None,
    })
}

fn base_member_name(function: &Function) -> String {
    if function.is_constructor() {
        return CONSTRUCTOR_MEMBER.to_string();
    }
    if function.is_destructor() {
        return "Destructor".to_string();
    }
    match function.operator_token() {
        Some(token) => operator_method_name(token).unwrap_or("operator").to_string(),
        None => function.name.clone(),
    }
}

/// Symbol member name for every function of `class`, indexed like
/// `class.functions`.
///
/// The first function with a given name keeps it; later overloads get `_1`,
/// `_2`, ... in declaration order. Numbering runs over all functions, bound
/// or not, so excluding one member never renames another.
pub fn member_names(class: &Class) -> Vec<String> {
    let mut seen: AHashMap<String, usize> = AHashMap::new();
    class
        .functions
        .iter()
        .map(|function| {
            let base = base_member_name(function);
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// One symbol exported by a generated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSymbol {
    pub name: String,
    pub class: String,
    pub member: String,
}

impl ExportSymbol {
    pub fn new(package: &str, class: &str, member: &str) -> Self {
        Self {
            name: export_symbol(package, class, member),
            class: class.to_string(),
            member: member.to_string(),
        }
    }

    pub fn owner(&self) -> String {
        format!("`{}::{}`", self.class, self.member)
    }
}

impl fmt::Display for ExportSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Every symbol exported during one generation run. Two members producing
/// the same symbol would make the native library ambiguous, so a second
/// registration is an error.
#[derive(Clone, Default)]
pub struct SymbolRegistry {
    symbols: Arc<Mutex<AHashMap<String, ExportSymbol>>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, symbol: &ExportSymbol) -> GenResult<()> {
        let mut symbols = self.symbols.lock();
        if let Some(existing) = symbols.get(&symbol.name) {
            return Err(GenError::SymbolCollision {
                symbol: symbol.name.clone(),
                first: existing.owner(),
                second: symbol.owner(),
            });
        }
        symbols.insert(symbol.name.clone(), symbol.clone());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.lock().is_empty()
    }

    /// Registered symbol names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRegistry")
            .field("symbols", &self.len())
            .finish()
    }
}
