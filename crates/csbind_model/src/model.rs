use std::collections::BTreeMap;

use crate::types::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub(crate) u32);

impl PackageId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of a function inside its owning class's function list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionIndex(pub(crate) u32);

impl FunctionIndex {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionKind {
    Constructor,
    Destructor,
    #[default]
    Method,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    /// Opt-out carried over from upstream annotations.
    pub skip: bool,
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    /// Set by the builder when the function is attached to a class.
    pub owner: ClassId,
}

impl Function {
    fn with_kind(name: impl Into<String>, kind: FunctionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            skip: false,
            params: Vec::new(),
            return_type: TypeRef::Void,
            owner: ClassId(u32::MAX),
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::with_kind(name, FunctionKind::Method)
    }

    pub fn static_fn(name: impl Into<String>) -> Self {
        Self::with_kind(name, FunctionKind::Static)
    }

    pub fn constructor(class_name: impl Into<String>) -> Self {
        Self::with_kind(class_name, FunctionKind::Constructor)
    }

    pub fn destructor(class_name: impl Into<String>) -> Self {
        let name = format!("~{}", class_name.into());
        Self::with_kind(name, FunctionKind::Destructor)
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    #[must_use]
    pub const fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub const fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor)
    }

    pub const fn is_destructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Destructor)
    }

    pub const fn is_static(&self) -> bool {
        matches!(self.kind, FunctionKind::Static)
    }

    /// Parameters a caller supplies; the engine context is filled in natively.
    pub fn visible_arity(&self) -> usize {
        self.params
            .iter()
            .filter(|param| param.ty != TypeRef::Context)
            .count()
    }

    /// The operator token (`==`, `+`, ...) for `operator==` style names.
    pub fn operator_token(&self) -> Option<&str> {
        self.name
            .strip_prefix("operator")
            .map(str::trim)
            .filter(|token| !token.is_empty() && !token.starts_with(char::is_alphanumeric))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub getter: Option<FunctionIndex>,
    pub setter: Option<FunctionIndex>,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    /// Type name used on the native side, usually identical to `name`.
    pub native_name: String,
    pub package: PackageId,
    pub base: Option<ClassId>,
    pub functions: Vec<Function>,
    /// Keyed by property name so iteration order is stable.
    pub properties: BTreeMap<String, Property>,
    /// Fixed-size numeric arrays (vectors, colors, ...) are value types and
    /// get no wrapper of their own.
    pub is_number_array: bool,
}

impl Class {
    pub fn function(&self, index: FunctionIndex) -> &Function {
        &self.functions[index.index()]
    }

    pub fn getter(&self, property: &Property) -> Option<&Function> {
        property.getter.map(|index| self.function(index))
    }

    pub fn setter(&self, property: &Property) -> Option<&Function> {
        property.setter.map(|index| self.function(index))
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub classes: Vec<ClassId>,
}

/// The immutable class graph consumed by the generator.
#[derive(Debug, Clone, Default)]
pub struct ClassModel {
    pub(crate) packages: Vec<Package>,
    pub(crate) classes: Vec<Class>,
}

impl ClassModel {
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Ids are only minted by [`crate::ModelBuilder`], so lookups cannot miss
    /// for ids that came from this model.
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_of(&self, class: ClassId) -> &Package {
        self.package(self.class(class).package)
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().find(|class| class.name == name).map(|class| class.id)
    }

    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .find(|package| package.name == name)
            .map(|package| package.id)
    }

    /// Walk the base-class chain of `id`, nearest ancestor first.
    pub fn ancestors(&self, id: ClassId) -> Ancestors<'_> {
        Ancestors {
            model: self,
            next: self.class(id).base,
        }
    }

    pub fn is_subclass_of(&self, id: ClassId, ancestor: ClassId) -> bool {
        self.ancestors(id).any(|class| class.id == ancestor)
    }

    /// Look up a property by name on `id` and, with `include_bases`, on
    /// its ancestors. Returns the class that declares it.
    pub fn match_property(
        &self,
        id: ClassId,
        name: &str,
        include_bases: bool,
    ) -> Option<(ClassId, &Property)> {
        let own = self.class(id);
        if let Some(property) = own.properties.get(name) {
            return Some((id, property));
        }
        if !include_bases {
            return None;
        }
        self.ancestors(id).find_map(|class| {
            class
                .properties
                .get(name)
                .map(|property| (class.id, property))
        })
    }
}

pub struct Ancestors<'a> {
    model: &'a ClassModel,
    next: Option<ClassId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.model.class(self.next?);
        self.next = class.base;
        Some(class)
    }
}
