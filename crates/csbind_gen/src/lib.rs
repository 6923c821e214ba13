//! Binding generator core.
//!
//! Turns classes from a [`csbind_model::ClassModel`] into two matched source
//! fragments: a native C++ export shim and a managed C# partial class that
//! imports those exports. The two sides share exactly one contract, the
//! exported symbol name, which both derive through [`symbols::export_symbol`].

pub mod class;
pub mod error;
pub mod filter;
pub mod function;
pub mod indent;
pub mod options;
pub mod package;
pub mod symbols;
pub mod types;

pub use class::{ClassBinding, ClassWriter, Note, NoteKind};
pub use error::{GenError, GenResult};
pub use filter::{Exclusion, ManagedTypeRules, TypeCompatibility, exclusion_reason, is_eligible};
pub use function::{FunctionWriter, MemberKind};
pub use indent::IndentContext;
pub use options::{GeneratorOptions, ManagedOptions, NativeOptions, OmitRules};
pub use package::{Generator, PackageSources, generate_package};
pub use symbols::{ExportSymbol, SymbolRegistry, export_symbol};
