use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::model::{
    Class, ClassId, ClassModel, Function, FunctionIndex, Package, PackageId, Property,
};

/// Incrementally assembles a [`ClassModel`].
///
/// Ids handed out by the builder stay valid in the finished model.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: ClassModel,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the package called `name`, creating it on first use.
    pub fn package(&mut self, name: &str) -> PackageId {
        if let Some(id) = self.model.find_package(name) {
            return id;
        }
        let id = PackageId(self.model.packages.len() as u32);
        self.model.packages.push(Package {
            id,
            name: name.to_string(),
            classes: Vec::new(),
        });
        id
    }

    /// Declare a class. Class names are unique across the whole model since
    /// managed code refers to base classes by bare name.
    pub fn class(&mut self, package: PackageId, name: &str) -> ModelResult<ClassId> {
        if let Some(existing) = self.model.find_class(name) {
            let owner = self.model.package_of(existing);
            return Err(ModelError::DuplicateClass {
                name: name.to_string(),
                package: owner.name.clone(),
            });
        }

        let id = ClassId(self.model.classes.len() as u32);
        self.model.classes.push(Class {
            id,
            name: name.to_string(),
            native_name: name.to_string(),
            package,
            base: None,
            functions: Vec::new(),
            properties: BTreeMap::new(),
            is_number_array: false,
        });
        self.model.packages[package.index()].classes.push(id);
        Ok(id)
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.model.find_class(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.model.classes.iter().map(|class| class.name.as_str())
    }

    pub fn set_base(&mut self, class: ClassId, base: ClassId) {
        self.class_mut(class).base = Some(base);
    }

    pub fn set_native_name(&mut self, class: ClassId, native_name: impl Into<String>) {
        self.class_mut(class).native_name = native_name.into();
    }

    pub fn set_number_array(&mut self, class: ClassId, is_number_array: bool) {
        self.class_mut(class).is_number_array = is_number_array;
    }

    pub fn add_function(&mut self, class: ClassId, mut function: Function) -> FunctionIndex {
        function.owner = class;
        let functions = &mut self.class_mut(class).functions;
        functions.push(function);
        FunctionIndex((functions.len() - 1) as u32)
    }

    /// Declare a property from accessor names. A getter must take no
    /// arguments and a setter exactly one; overloads that do not fit are
    /// passed over.
    pub fn add_property(
        &mut self,
        class: ClassId,
        name: &str,
        getter: Option<&str>,
        setter: Option<&str>,
    ) -> ModelResult<()> {
        let owner = self.class_ref(class);
        let resolve = |function: &str, arity: usize| -> ModelResult<FunctionIndex> {
            let matching = |f: &&Function| f.name == function && !f.is_constructor();
            owner
                .functions
                .iter()
                .position(|f| matching(&f) && f.params.len() == arity)
                .or_else(|| owner.functions.iter().position(|f| matching(&f)))
                .map(|index| FunctionIndex(index as u32))
                .ok_or_else(|| ModelError::UnknownAccessor {
                    class: owner.name.clone(),
                    property: name.to_string(),
                    function: function.to_string(),
                })
        };

        let getter = getter.map(|function| resolve(function, 0)).transpose()?;
        let setter = setter.map(|function| resolve(function, 1)).transpose()?;
        if getter.is_none() && setter.is_none() {
            return Err(ModelError::EmptyProperty {
                class: owner.name.clone(),
                property: name.to_string(),
            });
        }

        self.class_mut(class).properties.insert(
            name.to_string(),
            Property {
                name: name.to_string(),
                getter,
                setter,
            },
        );
        Ok(())
    }

    /// Pair `GetX` / `SetX` methods into properties named `x`.
    ///
    /// Properties that were declared explicitly are left alone.
    pub fn derive_properties(&mut self, class: ClassId) {
        let owner = self.class_ref(class);
        let mut found: BTreeMap<String, Property> = BTreeMap::new();

        for (index, function) in owner.functions.iter().enumerate() {
            if function.is_constructor()
                || function.is_destructor()
                || function.is_static()
                || function.operator_token().is_some()
            {
                continue;
            }
            let index = FunctionIndex(index as u32);

            if let Some(stem) = accessor_stem(&function.name, "Get") {
                if function.params.is_empty() && !function.return_type.is_void() {
                    let entry = found.entry(property_name(stem)).or_insert_with_key(empty);
                    entry.getter.get_or_insert(index);
                }
            } else if let Some(stem) = accessor_stem(&function.name, "Set") {
                if function.params.len() == 1 && function.return_type.is_void() {
                    let entry = found.entry(property_name(stem)).or_insert_with_key(empty);
                    entry.setter.get_or_insert(index);
                }
            }
        }

        let class_name = owner.name.clone();
        let properties = &mut self.class_mut(class).properties;
        for (name, property) in found {
            if properties.contains_key(&name) {
                continue;
            }
            debug!(class = %class_name, property = %name, "derived property");
            properties.insert(name, property);
        }
    }

    /// Validate the inheritance graph and hand out the finished model.
    pub fn finish(self) -> ModelResult<ClassModel> {
        let limit = self.model.classes.len();
        for class in &self.model.classes {
            let mut next = class.base;
            let mut steps = 0;
            while let Some(id) = next {
                steps += 1;
                if id == class.id || steps > limit {
                    return Err(ModelError::InheritanceCycle {
                        class: class.name.clone(),
                    });
                }
                next = self.model.classes[id.index()].base;
            }
        }
        Ok(self.model)
    }

    fn class_ref(&self, class: ClassId) -> &Class {
        &self.model.classes[class.index()]
    }

    fn class_mut(&mut self, class: ClassId) -> &mut Class {
        &mut self.model.classes[class.index()]
    }
}

fn empty(name: &String) -> Property {
    Property {
        name: name.clone(),
        getter: None,
        setter: None,
    }
}

fn accessor_stem<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)
        .filter(|stem| stem.starts_with(|ch: char| ch.is_ascii_uppercase()))
}

/// `Name` -> `name`, `ID` -> `id`, `URLPath` -> `urlPath`.
pub fn property_name(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let mut out = String::with_capacity(stem.len());
    let mut lowering = true;
    for (i, ch) in chars.iter().enumerate() {
        let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
        if lowering && ch.is_uppercase() && !(i > 0 && next_is_lower) {
            out.extend(ch.to_lowercase());
        } else {
            lowering = false;
            out.push(*ch);
        }
    }
    out
}
