use csbind_model::{ClassModel, PackageId};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::class::{ClassBinding, ClassWriter, Note};
use crate::error::GenResult;
use crate::indent::IndentContext;
use crate::options::GeneratorOptions;
use crate::symbols::{ExportSymbol, SymbolRegistry};

const GENERATED_HEADER: &str = "// Autogenerated by csbind. Do not edit.";

/// The two files generated for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSources {
    pub package: String,
    pub native: String,
    pub managed: String,
    pub symbols: Vec<ExportSymbol>,
    pub notes: Vec<Note>,
    /// Classes that produced output; number arrays are not counted.
    pub classes: usize,
}

impl PackageSources {
    pub fn native_file_name(&self) -> String {
        format!("CSPackage{}.cpp", self.package)
    }

    pub fn managed_file_name(&self) -> String {
        format!("{}.cs", self.package)
    }
}

/// Generate both files for `package`.
///
/// Classes are generated in parallel but assembled and registered in model
/// order, so output and collision reports are deterministic.
pub fn generate_package(
    model: &ClassModel,
    package: PackageId,
    options: &GeneratorOptions,
    registry: &SymbolRegistry,
) -> GenResult<PackageSources> {
    let package = model.package(package);
    debug!(package = %package.name, classes = package.classes.len(), "generating package");

    let bindings: Vec<GenResult<ClassBinding>> = package
        .classes
        .par_iter()
        .map(|&class| {
            let mut ctx = IndentContext::new(options.indent_width);
            ctx.indent();
            ClassWriter::new(model, class, options).bind(&mut ctx)
        })
        .collect();

    let mut sources = PackageSources {
        package: package.name.clone(),
        ..PackageSources::default()
    };
    let mut native_body = String::new();
    let mut managed_body = String::new();
    for binding in bindings {
        let binding = binding?;
        for symbol in &binding.symbols {
            registry
                .register(symbol)
                .map_err(|error| error.in_class(&binding.class))?;
        }
        if binding.is_empty() {
            continue;
        }
        sources.classes += 1;
        native_body.push_str(&binding.native);
        managed_body.push_str(&binding.managed);
        sources.symbols.extend(binding.symbols);
        sources.notes.extend(binding.notes);
    }

    sources.native = native_file(&package.name, &native_body, options);
    sources.managed = managed_file(&package.name, &managed_body, options);
    info!(
        package = %package.name,
        classes = sources.classes,
        symbols = sources.symbols.len(),
        "package generated"
    );
    Ok(sources)
}

fn native_file(package: &str, body: &str, options: &GeneratorOptions) -> String {
    let ctx = IndentContext::new(options.indent_width);
    let mut out = String::new();
    ctx.line(&mut out, GENERATED_HEADER);
    ctx.line(&mut out, "");
    for include in &options.native.includes {
        ctx.line(&mut out, &format!("#include {include}"));
    }
    ctx.line(&mut out, "");

    let namespace = options.native.namespace.as_deref().unwrap_or(package);
    ctx.line(&mut out, &format!("namespace {namespace}"));
    ctx.line(&mut out, "{");
    ctx.line(&mut out, "");
    ctx.line(&mut out, "extern \"C\"");
    ctx.line(&mut out, "{");
    ctx.line(&mut out, "");
    out.push_str(body);
    ctx.line(&mut out, "}");
    ctx.line(&mut out, "");
    ctx.line(&mut out, "}");
    out
}

fn managed_file(package: &str, body: &str, options: &GeneratorOptions) -> String {
    let ctx = IndentContext::new(options.indent_width);
    let mut out = String::new();
    ctx.line(&mut out, GENERATED_HEADER);
    ctx.line(&mut out, "");
    for using in &options.managed.usings {
        ctx.line(&mut out, &format!("using {using};"));
    }
    ctx.line(&mut out, "");

    let namespace = options.managed.namespace_for(package);
    ctx.line(&mut out, &format!("namespace {namespace}"));
    ctx.line(&mut out, "{");
    ctx.line(&mut out, "");
    out.push_str(body.trim_end_matches('\n'));
    if !body.is_empty() {
        out.push('\n');
    }
    ctx.line(&mut out, "}");
    out
}

/// Owns the options and the symbol registry for one generation run.
#[derive(Debug, Default)]
pub struct Generator {
    options: GeneratorOptions,
    registry: SymbolRegistry,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            registry: SymbolRegistry::new(),
        }
    }

    pub const fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub const fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn generate_package(
        &self,
        model: &ClassModel,
        package: PackageId,
    ) -> GenResult<PackageSources> {
        generate_package(model, package, &self.options, &self.registry)
    }

    /// Every package in model order.
    pub fn generate_all(&self, model: &ClassModel) -> GenResult<Vec<PackageSources>> {
        model
            .packages()
            .iter()
            .map(|package| self.generate_package(model, package.id))
            .collect()
    }
}
