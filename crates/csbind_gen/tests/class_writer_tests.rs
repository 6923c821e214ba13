use std::collections::BTreeSet;

use anyhow::{Context, Result};
use csbind_gen::{ClassWriter, Exclusion, GeneratorOptions, IndentContext, NoteKind};
use csbind_model::{ClassModel, parse_model};

const NODE_MODEL: &str = r"
packages:
  - name: Atomic
    classes:
      - name: Node
        functions:
          - name: GetName
            returns: string
          - name: SetName
            params:
              - { name: name, type: string }
        properties:
          name: { getter: GetName, setter: SetName }
";

fn class_sources(model: &ClassModel, name: &str) -> Result<(String, String)> {
    let id = model.find_class(name).context("class missing from model")?;
    let options = GeneratorOptions::default();
    let writer = ClassWriter::new(model, id, &options);
    Ok((writer.generate_native_source()?, writer.generate_managed_source()?))
}

/// Symbols defined by `ATOMIC_EXPORT_API` lines or imported by `extern` lines.
fn symbols(text: &str, marker: &str) -> BTreeSet<String> {
    text.lines()
        .filter(|line| line.contains(marker))
        .filter_map(|line| {
            let start = line.find("csb_")?;
            let end = line[start..].find('(')? + start;
            Some(line[start..end].to_string())
        })
        .collect()
}

#[test]
fn node_end_to_end() -> Result<()> {
    let model = parse_model(NODE_MODEL)?;
    let (native, managed) = class_sources(&model, "Node")?;

    assert!(native.contains("ATOMIC_EXPORT_API ClassID csb_Atomic_Node_GetClassIDStatic()"));
    assert!(native.contains("    return Node::GetClassIDStatic();"));
    assert!(native.contains("ATOMIC_EXPORT_API const char* csb_Atomic_Node_GetName(Node* self)"));
    assert!(native.contains("ATOMIC_EXPORT_API void csb_Atomic_Node_SetName(Node* self, const char* name)"));

    assert!(managed.starts_with("public partial class Node\n{\n"));
    let property = "    public string name\n    {\n        get\n        {\n            return GetName();\n        }\n        set\n        {\n            SetName(value);\n        }\n    }\n";
    assert!(managed.contains(property), "{managed}");
    assert_eq!(managed.matches("public string name").count(), 1);
    assert!(managed.contains(
        "    public static extern IntPtr csb_Atomic_Node_GetClassIDStatic();"
    ));
    assert!(managed.contains("    public Node (IntPtr native)\n    {\n        nativeInstance = native;\n    }\n}\n"));
    Ok(())
}

#[test]
fn native_exports_match_managed_imports() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    for class in model.classes() {
        let (native, managed) = class_sources(&model, &class.name)?;
        let exported = symbols(&native, "ATOMIC_EXPORT_API");
        let imported = symbols(&managed, "static extern");
        assert_eq!(exported, imported, "symbol mismatch in {}", class.name);
        assert_eq!(
            managed.matches("[DllImport (").count(),
            imported.len(),
            "every import carries the attribute in {}",
            class.name
        );
    }
    Ok(())
}

#[test]
fn generation_is_deterministic() -> Result<()> {
    let source = include_str!("../../../models/atomic/model.yaml");
    let first = parse_model(source)?;
    let second = parse_model(source)?;
    for class in first.classes() {
        assert_eq!(
            class_sources(&first, &class.name)?,
            class_sources(&second, &class.name)?
        );
    }
    Ok(())
}

#[test]
fn number_arrays_generate_nothing() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (native, managed) = class_sources(&model, "Vector3")?;
    assert!(native.is_empty());
    assert!(managed.is_empty());
    Ok(())
}

#[test]
fn every_class_gets_exactly_one_kind_of_constructor() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let options = GeneratorOptions::default();

    // Node keeps its real constructor, so no handle constructor is added.
    let node = model.find_class("Node").context("Node")?;
    let binding = ClassWriter::new(&model, node, &options).generate()?;
    assert!(binding.managed.contains("public Node() : base(UnknownType.UnknownTypeInstance)"));
    assert_eq!(binding.managed.matches("public Node(").count(), 1);
    assert!(!binding.managed.contains("IntPtr native"));
    assert!(binding.native.contains("return new Node(NETCore::GetContext());"));

    // HttpRequest's only constructor takes a string vector and is dropped.
    let request = model.find_class("HttpRequest").context("HttpRequest")?;
    let binding = ClassWriter::new(&model, request, &options).generate()?;
    assert!(binding.managed.contains("public HttpRequest (IntPtr native) : base (native)\n    {\n    }\n"));
    assert_eq!(binding.managed.matches("public HttpRequest").count(), 1);
    assert!(!binding.native.contains("Constructor"));
    assert!(
        binding
            .notes
            .iter()
            .any(|note| note.kind == NoteKind::FallbackConstructor)
    );
    Ok(())
}

#[test]
fn excluded_members_are_absent_from_both_sides() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (native, managed) = class_sources(&model, "Node")?;
    for member in ["GetTags", "MarkDirty", "Destructor"] {
        assert!(!native.contains(member), "{member} leaked into native");
        assert!(!managed.contains(member), "{member} leaked into managed");
    }
    Ok(())
}

#[test]
fn overloads_get_numbered_symbols() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (native, managed) = class_sources(&model, "Node")?;
    assert!(native.contains("csb_Atomic_Node_CreateChild(Node* self, const char* name)"));
    assert!(native.contains(
        "csb_Atomic_Node_CreateChild_1(Node* self, const char* name, CreateMode mode, unsigned id)"
    ));
    assert!(managed.contains("public Node CreateChild(string name, CreateMode mode, uint id)"));
    Ok(())
}

#[test]
fn properties_require_agreeing_accessor_types() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (_, managed) = class_sources(&model, "Scene")?;
    assert!(managed.contains("public float timeScale"));
    // float getter, double setter
    assert!(!managed.contains("smoothingConstant"));
    // The accessors themselves are still bound.
    assert!(managed.contains("public float GetSmoothingConstant()"));
    assert!(managed.contains("public void SetSmoothingConstant(double constant)"));
    Ok(())
}

#[test]
fn properties_with_unbindable_accessors_are_dropped() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (_, managed) = class_sources(&model, "Node")?;
    assert!(!managed.contains(" tags"));
    assert!(managed.contains("public Vector3 position"));
    assert!(managed.contains("public Node parent"));
    // Setter without getter still yields a write-only property.
    assert!(managed.contains("public bool enabled\n    {\n        set\n"));
    Ok(())
}

#[test]
fn redeclared_properties_shadow_the_base() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let (_, scene) = class_sources(&model, "Scene")?;
    let (_, node) = class_sources(&model, "Node")?;
    assert!(scene.contains("public new string name"));
    assert!(!scene.contains("public new float timeScale"));
    assert!(node.contains("public string name"));
    assert!(!node.contains("public new string name"));
    Ok(())
}

#[test]
fn binding_at_depth_leaves_context_balanced() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    let options = GeneratorOptions::default();
    for class in model.classes() {
        let mut ctx = IndentContext::default();
        ctx.indent();
        ctx.indent();
        ClassWriter::new(&model, class.id, &options).bind(&mut ctx)?;
        assert_eq!(ctx.depth(), 2, "{} left the context unbalanced", class.name);
    }
    Ok(())
}

#[test]
fn braces_balance_in_every_class() -> Result<()> {
    let model = parse_model(include_str!("../../../models/atomic/model.yaml"))?;
    for class in model.classes() {
        let (native, managed) = class_sources(&model, &class.name)?;
        for text in [&native, &managed] {
            assert_eq!(text.matches('{').count(), text.matches('}').count());
        }
    }
    Ok(())
}

#[test]
fn overloads_differing_only_in_context_bind_once() -> Result<()> {
    let model = parse_model(
        r"
packages:
  - name: Atomic
    classes:
      - name: Node
        functions:
          - name: Node
            kind: constructor
          - name: Node
            kind: constructor
            params:
              - { name: context, type: Context* }
          - name: Load
            params:
              - { name: path, type: String }
          - name: Load
            params:
              - { name: context, type: Context* }
              - { name: path, type: const String& }
",
    )?;
    let node = model.find_class("Node").context("Node")?;
    let binding = ClassWriter::new(&model, node, &GeneratorOptions::default()).generate()?;

    assert_eq!(binding.managed.matches("public Node(").count(), 1);
    assert_eq!(binding.managed.matches("public void Load(string path)").count(), 1);
    assert!(binding.native.contains("csb_Atomic_Node_Constructor()"));
    assert!(!binding.native.contains("csb_Atomic_Node_Constructor_1"));
    assert!(!binding.native.contains("csb_Atomic_Node_Load_1"));

    let duplicates: Vec<_> = binding
        .notes
        .iter()
        .filter_map(|note| match &note.kind {
            NoteKind::Excluded(Exclusion::DuplicateSignature { signature }) => {
                Some(signature.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(duplicates, vec!["Node()", "Load(string)"]);
    Ok(())
}
