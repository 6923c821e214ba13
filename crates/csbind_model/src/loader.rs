use std::collections::{BTreeMap, BTreeSet};

use csbind_utils::find_best_match;
use serde::Deserialize;

use crate::builder::ModelBuilder;
use crate::error::{ModelError, ModelResult};
use crate::model::{ClassId, ClassModel, Function, FunctionKind, PackageId};
use crate::types::TypeRef;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default)]
    packages: Vec<RawPackage>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPackage {
    name: String,
    #[serde(default)]
    classes: Vec<RawClass>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClass {
    name: String,
    /// Native type name when it differs from the class name.
    #[serde(default)]
    native: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    number_array: bool,
    #[serde(default)]
    functions: Vec<RawFunction>,
    /// Absent means "derive from Get/Set pairs"; an empty map means none.
    #[serde(default)]
    properties: Option<BTreeMap<String, RawProperty>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunction {
    name: String,
    #[serde(default)]
    kind: RawKind,
    #[serde(default)]
    skip: bool,
    #[serde(default)]
    params: Vec<RawParam>,
    #[serde(default)]
    returns: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[default]
    Method,
    Static,
    Constructor,
    Destructor,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawProperty {
    #[serde(default)]
    getter: Option<String>,
    #[serde(default)]
    setter: Option<String>,
}

impl From<RawKind> for FunctionKind {
    fn from(kind: RawKind) -> Self {
        match kind {
            RawKind::Method => Self::Method,
            RawKind::Static => Self::Static,
            RawKind::Constructor => Self::Constructor,
            RawKind::Destructor => Self::Destructor,
        }
    }
}

/// Build a [`ClassModel`] from its YAML description.
///
/// Classes are declared first so bases and parameter types may refer to
/// classes declared later in the file or in another package.
pub fn parse_model(source: &str) -> ModelResult<ClassModel> {
    let raw: RawModel = serde_yaml::from_str(source)?;
    let mut builder = ModelBuilder::new();

    let mut packages = BTreeSet::new();
    let mut declared: Vec<(ClassId, RawClass)> = Vec::new();
    for package in raw.packages {
        if !packages.insert(package.name.clone()) {
            return Err(ModelError::DuplicatePackage { name: package.name });
        }
        let package_id = builder.package(&package.name);
        for class in package.classes {
            let id = declare_class(&mut builder, package_id, &class)?;
            declared.push((id, class));
        }
    }

    for (id, class) in &declared {
        if let Some(base) = &class.base {
            let base_id = lookup_class(&builder, base).ok_or_else(|| {
                ModelError::UnknownBaseClass {
                    class: class.name.clone(),
                    base: base.clone(),
                    suggestion: find_best_match(base, builder.class_names()),
                }
            })?;
            builder.set_base(*id, base_id);
        }
    }

    for (id, class) in &declared {
        for function in &class.functions {
            let function = convert_function(&builder, class, function)?;
            builder.add_function(*id, function);
        }

        match &class.properties {
            None => builder.derive_properties(*id),
            Some(properties) => {
                for (name, property) in properties {
                    builder.add_property(
                        *id,
                        name,
                        property.getter.as_deref(),
                        property.setter.as_deref(),
                    )?;
                }
            }
        }
    }

    builder.finish()
}

fn declare_class(
    builder: &mut ModelBuilder,
    package: PackageId,
    class: &RawClass,
) -> ModelResult<ClassId> {
    let id = builder.class(package, &class.name)?;
    if let Some(native) = &class.native {
        builder.set_native_name(id, native.clone());
    }
    builder.set_number_array(id, class.number_array);
    Ok(id)
}

fn lookup_class(builder: &ModelBuilder, name: &str) -> Option<ClassId> {
    builder.find_class(name)
}

fn convert_function(
    builder: &ModelBuilder,
    class: &RawClass,
    raw: &RawFunction,
) -> ModelResult<Function> {
    let resolve = |name: &str| lookup_class(builder, name);
    let parse = |spelling: &str| {
        TypeRef::parse(spelling, &resolve).map_err(|unknown| ModelError::UnknownType {
            class: class.name.clone(),
            function: raw.name.clone(),
            suggestion: find_best_match(&unknown, builder.class_names()),
            ty: unknown,
        })
    };

    let mut function = match FunctionKind::from(raw.kind) {
        FunctionKind::Constructor => Function::constructor(raw.name.clone()),
        FunctionKind::Destructor => Function::destructor(raw.name.trim_start_matches('~')),
        FunctionKind::Static => Function::static_fn(raw.name.clone()),
        FunctionKind::Method => Function::method(raw.name.clone()),
    };

    for param in &raw.params {
        function = function.param(param.name.clone(), parse(&param.ty)?);
    }
    if let Some(returns) = &raw.returns {
        function = function.returns(parse(returns)?);
    }
    if raw.skip {
        function = function.skipped();
    }
    Ok(function)
}
