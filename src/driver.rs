use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csbind_gen::{Generator, GeneratorOptions, PackageSources};
use csbind_model::{ClassModel, PackageId, parse_model};
use csbind_utils::{emit_diagnostic, find_best_match};
use tracing::{debug, info};

/// Message of the error returned after diagnostics were already printed.
pub const REPORTED_FAILURE: &str = "model loading failed";

pub const NATIVE_DIR: &str = "Native";
pub const MANAGED_DIR: &str = "Managed";

pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load and validate a model. Errors the YAML parser can place are printed
/// against the source and reported as [`REPORTED_FAILURE`].
pub fn load_model(path: &Path) -> Result<ClassModel> {
    let source = read_source(path)?;
    let source_id = path.display().to_string();
    match parse_model(&source) {
        Ok(model) => {
            debug!(
                model = %source_id,
                packages = model.packages().len(),
                classes = model.classes().len(),
                "model loaded"
            );
            Ok(model)
        }
        Err(error) => match error.to_diagnostic(&source_id) {
            Some(diagnostic) => {
                emit_diagnostic(&diagnostic, &source);
                bail!(REPORTED_FAILURE);
            }
            None => Err(error).with_context(|| format!("invalid class model {source_id}")),
        },
    }
}

/// Package ids for `names`, or every package when `names` is empty.
pub fn select_packages(model: &ClassModel, names: &[String]) -> Result<Vec<PackageId>> {
    if names.is_empty() {
        return Ok(model.packages().iter().map(|package| package.id).collect());
    }
    names
        .iter()
        .map(|name| {
            model.find_package(name).ok_or_else(|| {
                let known = model.packages().iter().map(|package| package.name.as_str());
                match find_best_match(name, known) {
                    Some(suggestion) => {
                        anyhow::anyhow!("unknown package `{name}`; did you mean `{suggestion}`?")
                    }
                    None => anyhow::anyhow!("unknown package `{name}`"),
                }
            })
        })
        .collect()
}

/// Generate the selected packages with one shared symbol registry.
pub fn generate(
    model: &ClassModel,
    options: GeneratorOptions,
    packages: &[String],
) -> Result<Vec<PackageSources>> {
    let generator = Generator::new(options);
    select_packages(model, packages)?
        .into_iter()
        .map(|id| {
            generator
                .generate_package(model, id)
                .with_context(|| format!("generation of package `{}` failed", model.package(id).name))
        })
        .collect()
}

/// Write `{out}/Native/CSPackage{P}.cpp` and `{out}/Managed/{P}.cs` per
/// package and return the written paths.
pub fn write_sources(out: &Path, sources: &[PackageSources]) -> Result<Vec<PathBuf>> {
    let native_dir = out.join(NATIVE_DIR);
    let managed_dir = out.join(MANAGED_DIR);
    for dir in [&native_dir, &managed_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let mut written = Vec::with_capacity(sources.len() * 2);
    for package in sources {
        let native = native_dir.join(package.native_file_name());
        let managed = managed_dir.join(package.managed_file_name());
        for (path, text) in [(&native, &package.native), (&managed, &package.managed)] {
            fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = text.len(), "wrote");
        }
        written.push(native);
        written.push(managed);
    }
    Ok(written)
}
