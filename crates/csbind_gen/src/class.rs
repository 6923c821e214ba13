use std::fmt;

use ahash::AHashSet;
use csbind_model::{Class, ClassId, ClassModel, FunctionIndex, Package, Property};
use tracing::{debug, info};

use crate::error::GenResult;
use crate::filter::{Exclusion, ManagedTypeRules, TypeCompatibility, exclusion_reason};
use crate::function::{FunctionWriter, MemberKind};
use crate::indent::IndentContext;
use crate::options::GeneratorOptions;
use crate::symbols::{CLASS_ID_MEMBER, ExportSymbol, SymbolRegistry, member_names};

/// Something worth telling the user that did not stop generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub class: String,
    pub member: Option<String>,
    pub kind: NoteKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteKind {
    Excluded(Exclusion),
    /// No constructor was bindable, so only the handle constructor exists.
    FallbackConstructor,
}

impl Note {
    /// Exclusions the model asked for; not interesting by default.
    pub const fn is_expected(&self) -> bool {
        matches!(
            self.kind,
            NoteKind::Excluded(Exclusion::Skipped | Exclusion::Destructor)
        )
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.member) {
            (NoteKind::Excluded(reason), Some(member)) => {
                write!(f, "{}::{member} not bound: {reason}", self.class)
            }
            (NoteKind::Excluded(reason), None) => write!(f, "{} not bound: {reason}", self.class),
            (NoteKind::FallbackConstructor, _) => write!(
                f,
                "{} has no bindable constructor; only the handle constructor was generated",
                self.class
            ),
        }
    }
}

/// Output of one class: both source fragments, the symbols they share and
/// the notes raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassBinding {
    pub class: String,
    pub native: String,
    pub managed: String,
    pub symbols: Vec<ExportSymbol>,
    pub notes: Vec<Note>,
}

impl ClassBinding {
    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.managed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Identity,
    Members,
    Properties,
    Declaration,
    Done,
}

/// Working state threaded through the stages.
#[derive(Default)]
struct Pass<'a> {
    native: String,
    identity: String,
    members: String,
    properties: String,
    managed: String,
    writers: Vec<Option<FunctionWriter<'a>>>,
    has_constructor: bool,
    /// Managed overload keys bound so far.
    overloads: AHashSet<String>,
    symbols: SymbolRegistry,
    exported: Vec<ExportSymbol>,
    notes: Vec<Note>,
}

impl Pass<'_> {
    fn export(&mut self, symbol: &ExportSymbol) -> GenResult<()> {
        self.symbols.register(symbol)?;
        self.exported.push(symbol.clone());
        Ok(())
    }
}

enum Accessor<'p, 'a> {
    Absent,
    Bound(&'p FunctionWriter<'a>),
    Blocked,
}

/// Generates the native export shim and the managed partial class for one
/// class.
pub struct ClassWriter<'a> {
    model: &'a ClassModel,
    class: &'a Class,
    package: &'a Package,
    options: &'a GeneratorOptions,
    rules: Option<&'a dyn TypeCompatibility>,
}

impl<'a> ClassWriter<'a> {
    pub fn new(model: &'a ClassModel, class: ClassId, options: &'a GeneratorOptions) -> Self {
        Self {
            model,
            class: model.class(class),
            package: model.package_of(class),
            options,
            rules: None,
        }
    }

    /// Replace the default [`ManagedTypeRules`].
    #[must_use]
    pub fn with_rules(mut self, rules: &'a dyn TypeCompatibility) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn generate_native_source(&self) -> GenResult<String> {
        Ok(self.generate()?.native)
    }

    pub fn generate_managed_source(&self) -> GenResult<String> {
        Ok(self.generate()?.managed)
    }

    /// Both sides with the managed class at depth zero.
    pub fn generate(&self) -> GenResult<ClassBinding> {
        self.bind(&mut IndentContext::new(self.options.indent_width))
    }

    /// Both sides, with the managed class declared at `ctx`'s depth. Native
    /// exports are always top level.
    pub fn bind(&self, ctx: &mut IndentContext) -> GenResult<ClassBinding> {
        let class = &self.class.name;
        if self.class.is_number_array {
            debug!(class = %class, "number array class, no wrapper generated");
            return Ok(ClassBinding {
                class: class.clone(),
                ..ClassBinding::default()
            });
        }

        let default_rules = ManagedTypeRules::new(&self.options.omit);
        let rules: &dyn TypeCompatibility = match self.rules {
            Some(rules) => rules,
            None => &default_rules,
        };
        self.run(rules, ctx).map_err(|error| error.in_class(class))
    }

    fn run(&self, rules: &dyn TypeCompatibility, ctx: &mut IndentContext) -> GenResult<ClassBinding> {
        let mut pass = Pass::default();
        let mut stage = Stage::Identity;
        while stage != Stage::Done {
            stage = match stage {
                Stage::Identity => {
                    self.emit_identity(&mut pass, ctx)?;
                    Stage::Members
                }
                Stage::Members => {
                    self.emit_members(&mut pass, rules, ctx)?;
                    Stage::Properties
                }
                Stage::Properties => {
                    self.emit_properties(&mut pass, ctx)?;
                    Stage::Declaration
                }
                Stage::Declaration => {
                    self.emit_declaration(&mut pass, ctx)?;
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }

        Ok(ClassBinding {
            class: self.class.name.clone(),
            native: pass.native,
            managed: pass.managed,
            symbols: pass.exported,
            notes: pass.notes,
        })
    }

    fn native_ctx(&self) -> IndentContext {
        IndentContext::new(self.options.indent_width)
    }

    fn emit_identity(&self, pass: &mut Pass<'a>, ctx: &mut IndentContext) -> GenResult<()> {
        let symbol = ExportSymbol::new(&self.package.name, &self.class.name, CLASS_ID_MEMBER);
        pass.export(&symbol)?;

        let mut native = self.native_ctx();
        native.line(
            &mut pass.native,
            &format!(
                "{} ClassID {}()",
                self.options.native.export_macro, symbol.name
            ),
        );
        native.block(&mut pass.native, |native, out| {
            native.line(
                out,
                &format!("return {}::GetClassIDStatic();", self.class.native_name),
            );
            Ok(())
        })?;
        native.line(&mut pass.native, "");

        let out = &mut pass.identity;
        ctx.nested(|ctx| {
            ctx.line(out, &self.options.managed.dll_import());
            ctx.line(out, &format!("public static extern IntPtr {}();", symbol.name));
            ctx.line(out, "");
            Ok(())
        })
    }

    fn emit_members(
        &self,
        pass: &mut Pass<'a>,
        rules: &dyn TypeCompatibility,
        ctx: &mut IndentContext,
    ) -> GenResult<()> {
        let names = member_names(self.class);
        let mut native = self.native_ctx();

        for (function, member) in self.class.functions.iter().zip(&names) {
            let writer = match exclusion_reason(self.model, function, rules) {
                Some(reason) => Err(reason),
                None => FunctionWriter::new(
                    self.model,
                    self.package,
                    function,
                    member,
                    self.options,
                ),
            };
            let writer = writer.and_then(|writer| {
                let signature = writer.managed_overload_key();
                if pass.overloads.insert(signature.clone()) {
                    Ok(writer)
                } else {
                    Err(Exclusion::DuplicateSignature { signature })
                }
            });
            let writer = match writer {
                Ok(writer) => writer,
                Err(reason) => {
                    debug!(class = %self.class.name, member = %member, %reason, "member excluded");
                    pass.notes.push(Note {
                        class: self.class.name.clone(),
                        member: Some(member.clone()),
                        kind: NoteKind::Excluded(reason),
                    });
                    pass.writers.push(None);
                    continue;
                }
            };

            pass.export(writer.symbol())?;
            writer.write_native(&mut native, &mut pass.native)?;
            let out = &mut pass.members;
            ctx.nested(|ctx| writer.write_managed(ctx, out))?;
            pass.has_constructor |= writer.kind() == MemberKind::Constructor;
            pass.writers.push(Some(writer));
        }
        Ok(())
    }

    fn accessor<'p>(&self, pass: &'p Pass<'a>, index: Option<FunctionIndex>) -> Accessor<'p, 'a> {
        let Some(index) = index else {
            return Accessor::Absent;
        };
        if self.class.function(index).skip {
            return Accessor::Absent;
        }
        match pass.writers.get(index.index()).and_then(Option::as_ref) {
            Some(writer) if matches!(writer.kind(), MemberKind::Method | MemberKind::Static) => {
                Accessor::Bound(writer)
            }
            _ => Accessor::Blocked,
        }
    }

    fn emit_properties(&self, pass: &mut Pass<'a>, ctx: &mut IndentContext) -> GenResult<()> {
        let mut out = String::new();
        for (name, property) in &self.class.properties {
            if let Some(block) = self.property_block(pass, name, property) {
                ctx.nested(|ctx| block.write(ctx, &mut out))?;
            }
        }
        pass.properties = out;
        Ok(())
    }

    fn property_block(&self, pass: &Pass<'a>, name: &str, property: &Property) -> Option<PropertyBlock> {
        let class = &self.class.name;
        let getter = match self.accessor(pass, property.getter) {
            Accessor::Blocked => {
                debug!(class = %class, property = %name, "getter not bound, property dropped");
                return None;
            }
            Accessor::Absent => None,
            Accessor::Bound(writer) => Some(writer),
        };
        let setter = match self.accessor(pass, property.setter) {
            Accessor::Blocked => {
                debug!(class = %class, property = %name, "setter not bound, property dropped");
                return None;
            }
            Accessor::Absent => None,
            Accessor::Bound(writer) => Some(writer),
        };

        let getter_shape = match getter {
            Some(writer) if writer.visible_params().count() == 0 && !writer.result().is_void() => {
                Some(writer.result())
            }
            Some(_) => return None,
            None => None,
        };
        let setter_shape = match setter {
            Some(writer) => {
                let mut params = writer.visible_params();
                match (params.next(), params.next()) {
                    (Some(param), None) => Some(&param.shape),
                    _ => return None,
                }
            }
            None => None,
        };

        let ty = match (getter_shape, setter_shape) {
            (Some(get), Some(set)) if get != set => {
                debug!(
                    class = %class,
                    property = %name,
                    getter = %get.managed_type(),
                    setter = %set.managed_type(),
                    "accessor types disagree, property dropped"
                );
                return None;
            }
            (Some(shape), _) | (None, Some(shape)) => shape.managed_type(),
            (None, None) => return None,
        };

        let shadows = self
            .class
            .base
            .is_some_and(|base| self.model.match_property(base, name, true).is_some());

        Some(PropertyBlock {
            name: name.to_string(),
            ty,
            shadows,
            getter: getter.map(|writer| writer.managed_name().to_string()),
            setter: setter.map(|writer| writer.managed_name().to_string()),
        })
    }

    fn emit_declaration(&self, pass: &mut Pass<'a>, ctx: &mut IndentContext) -> GenResult<()> {
        let class = &self.class.name;
        let mut body = String::new();
        body.push_str(&pass.properties);
        body.push_str(&pass.identity);
        body.push_str(&pass.members);

        if !pass.has_constructor {
            info!(class = %class, "no bindable constructor, generating handle constructor");
            pass.notes.push(Note {
                class: class.clone(),
                member: None,
                kind: NoteKind::FallbackConstructor,
            });
            let has_base = self.class.base.is_some();
            ctx.nested(|ctx| {
                if has_base {
                    ctx.line(&mut body, &format!("public {class} (IntPtr native) : base (native)"));
                    ctx.line(&mut body, "{");
                    ctx.line(&mut body, "}");
                } else {
                    ctx.line(&mut body, &format!("public {class} (IntPtr native)"));
                    ctx.block(&mut body, |ctx, out| {
                        ctx.line(out, "nativeInstance = native;");
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
        }
        while body.ends_with("\n\n") {
            body.pop();
        }

        let header = match self.class.base {
            Some(base) => format!("public partial class {class} : {}", self.base_name(base)),
            None => format!("public partial class {class}"),
        };
        let out = &mut pass.managed;
        ctx.line(out, &header);
        ctx.line(out, "{");
        out.push_str(&body);
        ctx.line(out, "}");
        ctx.line(out, "");
        Ok(())
    }
}

impl ClassWriter<'_> {
    /// The base as written in this class's namespace; qualified when the
    /// base lives in a package with a different managed namespace.
    fn base_name(&self, base: ClassId) -> String {
        let managed = &self.options.managed;
        let name = &self.model.class(base).name;
        let namespace = managed.namespace_for(&self.model.package_of(base).name);
        if namespace == managed.namespace_for(&self.package.name) {
            name.clone()
        } else {
            format!("{namespace}.{name}")
        }
    }
}

struct PropertyBlock {
    name: String,
    ty: String,
    shadows: bool,
    getter: Option<String>,
    setter: Option<String>,
}

impl PropertyBlock {
    fn write(&self, ctx: &mut IndentContext, out: &mut String) -> GenResult<()> {
        let new = if self.shadows { "new " } else { "" };
        ctx.line(out, &format!("public {new}{} {}", self.ty, self.name));
        ctx.block(out, |ctx, out| {
            if let Some(getter) = &self.getter {
                ctx.line(out, "get");
                ctx.block(out, |ctx, out| {
                    ctx.line(out, &format!("return {getter}();"));
                    Ok(())
                })?;
            }
            if let Some(setter) = &self.setter {
                ctx.line(out, "set");
                ctx.block(out, |ctx, out| {
                    ctx.line(out, &format!("{setter}(value);"));
                    Ok(())
                })?;
            }
            Ok(())
        })?;
        ctx.line(out, "");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenError;
    use csbind_model::{Function, ModelBuilder, TypeRef};

    #[test]
    fn number_arrays_produce_nothing() {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let vector = builder.class(package, "Vector3").unwrap();
        builder.set_number_array(vector, true);
        builder.add_function(vector, Function::method("Length").returns(TypeRef::Float));
        let model = builder.finish().unwrap();
        let options = GeneratorOptions::default();

        let binding = ClassWriter::new(&model, vector, &options).generate().unwrap();
        assert!(binding.is_empty());
        assert!(binding.symbols.is_empty());
    }

    #[test]
    fn symbol_collision_names_the_class() {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let node = builder.class(package, "Node").unwrap();
        builder.add_function(node, Function::static_fn("GetClassIDStatic").returns(TypeRef::UInt));
        let model = builder.finish().unwrap();
        let options = GeneratorOptions::default();

        let error = ClassWriter::new(&model, node, &options).generate().unwrap_err();
        assert!(matches!(&error, GenError::InClass { class, .. } if class == "Node"));
        assert!(matches!(
            error.root_cause(),
            GenError::SymbolCollision { symbol, .. } if symbol == "csb_Atomic_Node_GetClassIDStatic"
        ));
    }

    #[test]
    fn managed_class_nests_at_context_depth() {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let node = builder.class(package, "Node").unwrap();
        builder.add_function(node, Function::constructor("Node"));
        let model = builder.finish().unwrap();
        let options = GeneratorOptions::default();

        let mut ctx = IndentContext::default();
        ctx.indent();
        let binding = ClassWriter::new(&model, node, &options).bind(&mut ctx).unwrap();
        assert_eq!(ctx.depth(), 1);
        assert!(binding.managed.starts_with("    public partial class Node\n    {\n        [DllImport"));
        assert!(binding.managed.ends_with("    }\n\n"));
        assert!(binding.native.starts_with("ATOMIC_EXPORT_API ClassID"));
        assert!(binding.notes.is_empty());
    }
}
