use csbind_model::{Class, ClassModel, Function, Package};

use crate::error::GenResult;
use crate::filter::Exclusion;
use crate::indent::IndentContext;
use crate::options::GeneratorOptions;
use crate::symbols::{ExportSymbol, operator_method_name};
use crate::types::{Shape, safe_param_name};

/// What a bound member turns into on the managed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// `new T(...)` natively, a registering constructor in managed code.
    Constructor,
    /// Instance call through the wrapped pointer.
    Method,
    Static,
    /// Binary operator, exposed as a static `op_*` method.
    Operator {
        token: &'static str,
        method: &'static str,
    },
}

impl MemberKind {
    fn of(function: &Function) -> Result<Self, Exclusion> {
        if function.is_constructor() {
            return Ok(Self::Constructor);
        }
        if function.is_destructor() {
            return Err(Exclusion::Destructor);
        }
        if let Some(token) = function.operator_token() {
            let unsupported = || Exclusion::UnsupportedOperator {
                token: token.to_string(),
            };
            let method = operator_method_name(token).ok_or_else(unsupported)?;
            if function.visible_arity() != 1 {
                return Err(unsupported());
            }
            let token = OPERATOR_TOKENS
                .iter()
                .copied()
                .find(|known| *known == token)
                .ok_or_else(unsupported)?;
            return Ok(Self::Operator { token, method });
        }
        if function.is_static() {
            Ok(Self::Static)
        } else {
            Ok(Self::Method)
        }
    }

    pub const fn takes_self(self) -> bool {
        matches!(self, Self::Method | Self::Operator { .. })
    }
}

const OPERATOR_TOKENS: &[&str] = &["==", "!=", "<", ">", "<=", ">=", "+", "-", "*", "/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    pub name: String,
    pub shape: Shape,
}

/// Emits the native export and the managed import plus wrapper for one
/// eligible function. Both sides are driven by the same [`Shape`]s and the
/// same [`ExportSymbol`].
#[derive(Debug)]
pub struct FunctionWriter<'a> {
    class: &'a Class,
    function: &'a Function,
    options: &'a GeneratorOptions,
    kind: MemberKind,
    symbol: ExportSymbol,
    params: Vec<BoundParam>,
    result: Shape,
}

impl<'a> FunctionWriter<'a> {
    /// `member` is the disambiguated member name used in the symbol.
    pub fn new(
        model: &'a ClassModel,
        package: &Package,
        function: &'a Function,
        member: &str,
        options: &'a GeneratorOptions,
    ) -> Result<Self, Exclusion> {
        let class = model.class(function.owner);
        let kind = MemberKind::of(function)?;
        let unsupported = |ty: &csbind_model::TypeRef| Exclusion::UnsupportedType {
            ty: ty.describe(model),
        };

        let params = function
            .params
            .iter()
            .map(|param| {
                Shape::param(model, &param.ty)
                    .map(|shape| BoundParam {
                        name: safe_param_name(&param.name),
                        shape,
                    })
                    .ok_or_else(|| unsupported(&param.ty))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = if kind == MemberKind::Constructor {
            Shape::Void
        } else {
            Shape::result(model, &function.return_type)
                .ok_or_else(|| unsupported(&function.return_type))?
        };

        Ok(Self {
            class,
            function,
            options,
            kind,
            symbol: ExportSymbol::new(&package.name, &class.name, member),
            params,
            result,
        })
    }

    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    pub const fn symbol(&self) -> &ExportSymbol {
        &self.symbol
    }

    /// The name managed code calls, e.g. from a property accessor.
    pub fn managed_name(&self) -> &str {
        match self.kind {
            MemberKind::Operator { method, .. } => method,
            _ => &self.function.name,
        }
    }

    pub const fn result(&self) -> &Shape {
        &self.result
    }

    /// Name and visible parameter types, which is all the managed compiler
    /// uses to tell overloads apart.
    pub fn managed_overload_key(&self) -> String {
        let params: Vec<String> = self
            .visible_params()
            .map(|param| param.shape.managed_type())
            .collect();
        format!("{}({})", self.managed_name(), params.join(", "))
    }

    /// Parameters that appear in the managed signature.
    pub fn visible_params(&self) -> impl Iterator<Item = &BoundParam> {
        self.params.iter().filter(|param| !param.shape.is_hidden())
    }

    // Native export

    fn native_signature(&self) -> String {
        let mut params = Vec::new();
        if self.kind.takes_self() {
            params.push(format!("{}* self", self.class.native_name));
        }
        params.extend(
            self.params
                .iter()
                .filter_map(|param| param.shape.native_param(&param.name)),
        );
        params.extend(self.result.native_out_param());

        let return_type = match self.kind {
            MemberKind::Constructor => format!("{}*", self.class.native_name),
            _ => self.result.native_return_type(),
        };
        format!(
            "{} {} {}({})",
            self.options.native.export_macro,
            return_type,
            self.symbol.name,
            params.join(", ")
        )
    }

    fn native_call(&self) -> String {
        let context = &self.options.native.context_expr;
        let args: Vec<String> = self
            .params
            .iter()
            .map(|param| param.shape.native_arg(&param.name, context))
            .collect();
        let args = args.join(", ");
        let native = &self.class.native_name;
        let name = &self.function.name;

        match self.kind {
            MemberKind::Constructor => format!("new {native}({args})"),
            MemberKind::Method => format!("self->{name}({args})"),
            MemberKind::Static => format!("{native}::{name}({args})"),
            MemberKind::Operator { token, .. } => {
                let operand = self
                    .visible_params()
                    .next()
                    .map(|rhs| match rhs.shape {
                        Shape::Object { .. } => format!("*{}", rhs.name),
                        _ => rhs.shape.native_arg(&rhs.name, context),
                    })
                    .unwrap_or_default();
                format!("(*self {token} {operand})")
            }
        }
    }

    pub fn write_native(&self, ctx: &mut IndentContext, out: &mut String) -> GenResult<()> {
        let call = self.native_call();
        let lines = match self.kind {
            MemberKind::Constructor => vec![format!("return {call};")],
            _ => self.result.native_return_lines(&call),
        };

        ctx.line(out, &self.native_signature());
        ctx.block(out, |ctx, out| {
            for line in &lines {
                ctx.line(out, line);
            }
            Ok(())
        })?;
        ctx.line(out, "");
        Ok(())
    }

    // Managed import and wrapper

    fn pinvoke_declaration(&self) -> String {
        let mut params = Vec::new();
        if self.kind.takes_self() {
            params.push("IntPtr self".to_string());
        }
        params.extend(
            self.params
                .iter()
                .filter_map(|param| param.shape.pinvoke_param(&param.name)),
        );
        params.extend(self.result.pinvoke_out_param());

        let return_type = match self.kind {
            MemberKind::Constructor => "IntPtr".to_string(),
            _ => self.result.pinvoke_return_type(),
        };
        format!(
            "private static extern {} {}({});",
            return_type,
            self.symbol.name,
            params.join(", ")
        )
    }

    fn pinvoke_call(&self) -> String {
        let mut args = Vec::new();
        match self.kind {
            MemberKind::Method => args.push("nativeInstance".to_string()),
            MemberKind::Operator { .. } => {
                args.push("lhs == null ? IntPtr.Zero : lhs.nativeInstance".to_string());
            }
            MemberKind::Constructor | MemberKind::Static => {}
        }
        args.extend(
            self.params
                .iter()
                .filter_map(|param| param.shape.pinvoke_arg(&param.name)),
        );
        if self.result.pinvoke_out_param().is_some() {
            args.push("out retValue".to_string());
        }
        format!("{}({})", self.symbol.name, args.join(", "))
    }

    fn managed_params(&self) -> Vec<String> {
        self.visible_params()
            .map(|param| format!("{} {}", param.shape.managed_type(), param.name))
            .collect()
    }

    fn managed_signature(&self) -> String {
        let class = &self.class.name;
        let params = self.managed_params().join(", ");
        let result = self.result.managed_type();
        match self.kind {
            MemberKind::Constructor => {
                let base = if self.class.base.is_some() {
                    " : base(UnknownType.UnknownTypeInstance)"
                } else {
                    ""
                };
                format!("public {class}({params}){base}")
            }
            MemberKind::Method => format!("public {result} {}({params})", self.function.name),
            MemberKind::Static => {
                format!("public static {result} {}({params})", self.function.name)
            }
            MemberKind::Operator { method, .. } => {
                let mut operands = vec![format!("{class} lhs")];
                operands.extend(self.managed_params());
                format!("public static {result} {method}({})", operands.join(", "))
            }
        }
    }

    /// The `DllImport` declaration followed by the public wrapper.
    pub fn write_managed(&self, ctx: &mut IndentContext, out: &mut String) -> GenResult<()> {
        ctx.line(out, &self.options.managed.dll_import());
        if self.kind != MemberKind::Constructor {
            if let Some(attribute) = self.result.pinvoke_return_attribute() {
                ctx.line(out, attribute);
            }
        }
        ctx.line(out, &self.pinvoke_declaration());
        ctx.line(out, "");

        let call = self.pinvoke_call();
        ctx.line(out, &self.managed_signature());
        ctx.block(out, |ctx, out| {
            if self.kind == MemberKind::Constructor {
                ctx.line(out, "if (nativeInstance == IntPtr.Zero)");
                ctx.block(out, |ctx, out| {
                    ctx.line(
                        out,
                        &format!("nativeInstance = NativeCore.RegisterNative({call}, this);"),
                    );
                    Ok(())
                })
            } else {
                for line in self.result.managed_return_lines(&call) {
                    ctx.line(out, &line);
                }
                Ok(())
            }
        })?;
        ctx.line(out, "");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csbind_model::{ClassId, ModelBuilder, TypeRef};

    fn node_model() -> (ClassModel, ClassId) {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let base = builder.class(package, "Animatable").unwrap();
        let node = builder.class(package, "Node").unwrap();
        let vector = builder.class(package, "Vector3").unwrap();
        builder.set_number_array(vector, true);
        builder.set_base(node, base);

        builder.add_function(node, Function::constructor("Node").param("context", TypeRef::Context));
        builder.add_function(node, Function::method("GetName").returns(TypeRef::String));
        builder.add_function(node, Function::method("IsEnabled").returns(TypeRef::Bool));
        builder.add_function(
            node,
            Function::method("GetChild")
                .param("name", TypeRef::String)
                .param("recursive", TypeRef::Bool)
                .returns(TypeRef::Class(node)),
        );
        builder.add_function(node, Function::method("GetPosition").returns(TypeRef::Class(vector)));
        builder.add_function(
            node,
            Function::method("operator==")
                .param("rhs", TypeRef::Class(node))
                .returns(TypeRef::Bool),
        );
        builder.add_function(
            node,
            Function::static_fn("GetTypeNameStatic").returns(TypeRef::String),
        );
        (builder.finish().unwrap(), node)
    }

    fn render(model: &ClassModel, class: ClassId, index: usize, member: &str) -> (String, String) {
        let options = GeneratorOptions::default();
        let class = model.class(class);
        let package = model.package(class.package);
        let writer =
            FunctionWriter::new(model, package, &class.functions[index], member, &options).unwrap();
        let mut native = String::new();
        let mut managed = String::new();
        writer
            .write_native(&mut IndentContext::default(), &mut native)
            .unwrap();
        writer
            .write_managed(&mut IndentContext::default(), &mut managed)
            .unwrap();
        (native, managed)
    }

    #[test]
    fn string_getter() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 1, "GetName");
        assert_eq!(
            native,
            "ATOMIC_EXPORT_API const char* csb_Atomic_Node_GetName(Node* self)\n\
             {\n    static String returnValue;\n    returnValue = self->GetName();\n    return returnValue.CString();\n}\n\n"
        );
        assert!(managed.contains("private static extern IntPtr csb_Atomic_Node_GetName(IntPtr self);"));
        assert!(managed.contains("public string GetName()\n{\n    return Marshal.PtrToStringAnsi(csb_Atomic_Node_GetName(nativeInstance));\n}\n"));
    }

    #[test]
    fn bool_results_carry_marshal_attribute() {
        let (model, node) = node_model();
        let (_, managed) = render(&model, node, 2, "IsEnabled");
        let lines: Vec<&str> = managed.lines().collect();
        assert!(lines[0].starts_with("[DllImport (Constants.LIBNAME"));
        assert_eq!(lines[1], "[return: MarshalAs(UnmanagedType.I1)]");
        assert_eq!(
            lines[2],
            "private static extern bool csb_Atomic_Node_IsEnabled(IntPtr self);"
        );
    }

    #[test]
    fn object_arguments_and_results() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 3, "GetChild");
        assert!(native.starts_with(
            "ATOMIC_EXPORT_API Node* csb_Atomic_Node_GetChild(Node* self, const char* name, bool recursive)"
        ));
        assert!(native.contains("    return self->GetChild(name, recursive);\n"));
        assert!(managed.contains(
            "private static extern IntPtr csb_Atomic_Node_GetChild(IntPtr self, string name, [MarshalAs(UnmanagedType.I1)] bool recursive);"
        ));
        assert!(managed.contains("public Node GetChild(string name, bool recursive)"));
        assert!(managed.contains(
            "return NativeCore.WrapNative<Node>(csb_Atomic_Node_GetChild(nativeInstance, name, recursive));"
        ));
    }

    #[test]
    fn value_results_use_out_parameter() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 4, "GetPosition");
        assert!(native.starts_with(
            "ATOMIC_EXPORT_API void csb_Atomic_Node_GetPosition(Node* self, Vector3* retValue)"
        ));
        assert!(native.contains("    *retValue = self->GetPosition();\n"));
        assert!(managed.contains("Vector3 retValue;\n    csb_Atomic_Node_GetPosition(nativeInstance, out retValue);\n    return retValue;"));
    }

    #[test]
    fn constructor_registers_native_instance() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 0, "Constructor");
        assert!(native.starts_with("ATOMIC_EXPORT_API Node* csb_Atomic_Node_Constructor()\n"));
        assert!(native.contains("    return new Node(NETCore::GetContext());\n"));
        assert!(managed.contains("private static extern IntPtr csb_Atomic_Node_Constructor();"));
        assert!(managed.contains(
            "public Node() : base(UnknownType.UnknownTypeInstance)\n{\n    if (nativeInstance == IntPtr.Zero)\n    {\n        nativeInstance = NativeCore.RegisterNative(csb_Atomic_Node_Constructor(), this);\n    }\n}\n"
        ));
    }

    #[test]
    fn operators_become_static_methods() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 5, "op_Equality");
        assert!(native.starts_with(
            "ATOMIC_EXPORT_API bool csb_Atomic_Node_op_Equality(Node* self, Node* rhs)"
        ));
        assert!(native.contains("    return (*self == *rhs);\n"));
        assert!(managed.contains("public static bool op_Equality(Node lhs, Node rhs)"));
    }

    #[test]
    fn operator_arity_ignores_the_engine_context() {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let node = builder.class(package, "Node").unwrap();
        builder.add_function(
            node,
            Function::method("operator==")
                .param("context", TypeRef::Context)
                .returns(TypeRef::Bool),
        );
        builder.add_function(
            node,
            Function::method("operator!=")
                .param("context", TypeRef::Context)
                .param("rhs", TypeRef::Class(node))
                .returns(TypeRef::Bool),
        );
        let model = builder.finish().unwrap();
        let options = GeneratorOptions::default();
        let class = model.class(node);

        let error = FunctionWriter::new(
            &model,
            model.package(class.package),
            &class.functions[0],
            "op_Equality",
            &options,
        )
        .unwrap_err();
        assert_eq!(
            error,
            Exclusion::UnsupportedOperator {
                token: "==".into()
            }
        );

        let (native, managed) = render(&model, node, 1, "op_Inequality");
        assert!(native.contains("    return (*self != *rhs);\n"));
        assert!(managed.contains("public static bool op_Inequality(Node lhs, Node rhs)\n"));
        assert!(!managed.contains(", )"));
    }

    #[test]
    fn statics_have_no_receiver() {
        let (model, node) = node_model();
        let (native, managed) = render(&model, node, 6, "GetTypeNameStatic");
        assert!(native.contains("csb_Atomic_Node_GetTypeNameStatic()"));
        assert!(native.contains("returnValue = Node::GetTypeNameStatic();"));
        assert!(managed.contains("public static string GetTypeNameStatic()"));
    }

    #[test]
    fn rejects_unrepresentable_signatures() {
        let mut builder = ModelBuilder::new();
        let package = builder.package("Atomic");
        let node = builder.class(package, "Node").unwrap();
        builder.add_function(node, Function::method("GetTags").returns(TypeRef::StringVector));
        let model = builder.finish().unwrap();
        let options = GeneratorOptions::default();
        let class = model.class(node);

        let error = FunctionWriter::new(
            &model,
            model.package(class.package),
            &class.functions[0],
            "GetTags",
            &options,
        )
        .unwrap_err();
        assert_eq!(
            error,
            Exclusion::UnsupportedType {
                ty: "vector<string>".into()
            }
        );
    }
}
