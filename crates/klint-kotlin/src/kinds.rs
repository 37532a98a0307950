//! Mapping from `tree-sitter-kotlin-ng` node kinds to [`SyntaxKind`].

use klint_core::SyntaxKind;

/// How a tree-sitter node is carried over into the syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// A composite node of the given kind.
    Node(SyntaxKind),
    /// A leaf of the given kind.
    Leaf(SyntaxKind),
    /// A file annotation, wrapped in its own annotation list.
    FileAnnotation,
    /// Children are inlined into the parent.
    Transparent,
}

/// Classifies a node by its grammar kind.
///
/// Comments are always leaves, whatever structure the grammar gives them.
pub(crate) fn shape(kind: &str, named: bool, leaf: bool, text: &str) -> Shape {
    match kind {
        "line_comment" => return Shape::Leaf(SyntaxKind::EolComment),
        "block_comment" | "multiline_comment" => return Shape::Leaf(SyntaxKind::BlockComment),
        _ => {}
    }
    if leaf {
        return Shape::Leaf(leaf_kind(kind, named, text));
    }
    match kind {
        "file_annotation" => Shape::FileAnnotation,
        "statements" => Shape::Transparent,
        _ => Shape::Node(node_kind(kind)),
    }
}

fn node_kind(kind: &str) -> SyntaxKind {
    match kind {
        "source_file" | "script" => SyntaxKind::File,
        "package_header" => SyntaxKind::PackageDirective,
        "import_list" | "import_header_list" => SyntaxKind::ImportList,
        "import" | "import_header" => SyntaxKind::ImportDirective,
        "annotation" => SyntaxKind::Annotation,
        "modifiers" => SyntaxKind::ModifierList,
        "class_declaration" | "object_declaration" | "companion_object" => SyntaxKind::Class,
        "class_body" | "enum_class_body" => SyntaxKind::ClassBody,
        "function_declaration" | "secondary_constructor" => SyntaxKind::Function,
        "property_declaration" => SyntaxKind::Property,
        "function_value_parameters" | "class_parameters" => SyntaxKind::ValueParameterList,
        "parameter" | "class_parameter" => SyntaxKind::ValueParameter,
        "value_arguments" => SyntaxKind::ValueArgumentList,
        "value_argument" => SyntaxKind::ValueArgument,
        "block" | "control_structure_body" => SyntaxKind::Block,
        "call_expression" => SyntaxKind::CallExpression,
        "annotated_expression" | "annotated_lambda" => SyntaxKind::AnnotatedExpression,
        "string_literal" | "multiline_string_literal" => SyntaxKind::StringTemplate,
        k if k.ends_with("_expression") || k.ends_with("_literal") => SyntaxKind::Expression,
        _ => SyntaxKind::Node,
    }
}

fn leaf_kind(kind: &str, named: bool, text: &str) -> SyntaxKind {
    if !named {
        return if text.chars().all(|c| c.is_alphabetic()) {
            SyntaxKind::Keyword
        } else {
            SyntaxKind::Operator
        };
    }
    match kind {
        "identifier" | "simple_identifier" | "type_identifier" => SyntaxKind::Identifier,
        "string_content" | "character_literal" | "escape_sequence" => SyntaxKind::Literal,
        k if k.ends_with("_literal") => SyntaxKind::Literal,
        _ if text.chars().all(char::is_whitespace) => SyntaxKind::Whitespace,
        _ => SyntaxKind::Token,
    }
}
