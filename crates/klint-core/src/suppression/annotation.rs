//! `@Suppress` / `@SuppressWarnings` annotations and the nodes they apply to.

use std::collections::BTreeSet;

use crate::tree::{Edit, Fragment, NodeId, SyntaxKind, SyntaxTree};

/// Name of the canonical suppression annotation.
pub const SUPPRESS: &str = "Suppress";
/// Name of the alias accepted for suppression.
pub const SUPPRESS_WARNINGS: &str = "SuppressWarnings";

/// Name of an annotation, ignoring its arguments.
///
/// For qualified names such as `kotlin.Suppress` the last segment is
/// returned.
#[must_use]
pub fn name(tree: &SyntaxTree, annotation: NodeId) -> Option<&str> {
    tree.descendants(annotation)
        .filter(|&n| tree.kind(n) == SyntaxKind::Identifier)
        .filter(|&n| {
            !tree
                .ancestors(n)
                .take_while(|&a| a != annotation)
                .any(|a| tree.kind(a) == SyntaxKind::ValueArgumentList)
        })
        .last()
        .and_then(|n| tree.leaf_text(n))
}

/// Returns true for `@Suppress` and `@SuppressWarnings` annotations.
#[must_use]
pub fn is_suppression(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node) == SyntaxKind::Annotation
        && matches!(name(tree, node), Some(SUPPRESS | SUPPRESS_WARNINGS))
}

/// Value arguments of an annotation, in source order.
#[must_use]
pub fn arguments(tree: &SyntaxTree, annotation: NodeId) -> Vec<NodeId> {
    let Some(list) = tree
        .descendants(annotation)
        .find(|&n| tree.kind(n) == SyntaxKind::ValueArgumentList)
    else {
        return Vec::new();
    };
    tree.children(list)
        .iter()
        .copied()
        .filter(|&c| tree.kind(c) == SyntaxKind::ValueArgument)
        .collect()
}

/// String template of an argument that is nothing but a string literal.
#[must_use]
pub fn literal(tree: &SyntaxTree, argument: NodeId) -> Option<NodeId> {
    let mut code = tree
        .children(argument)
        .iter()
        .copied()
        .filter(|&c| !tree.kind(c).is_trivia());
    match (code.next(), code.next()) {
        (Some(only), None) if tree.kind(only) == SyntaxKind::StringTemplate => Some(only),
        _ => None,
    }
}

/// String literal entries of an annotation with their template nodes,
/// unquoted.
///
/// Other arguments, such as constant references, are not entries.
#[must_use]
pub fn entries(tree: &SyntaxTree, annotation: NodeId) -> Vec<(NodeId, String)> {
    arguments(tree, annotation)
        .into_iter()
        .filter_map(|argument| literal(tree, argument))
        .map(|n| (n, unquote(&tree.text(n)).to_string()))
        .collect()
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

/// Returns true if the annotation is a file annotation.
#[must_use]
pub fn is_file_annotation(tree: &SyntaxTree, annotation: NodeId) -> bool {
    tree.parent(annotation)
        .is_some_and(|p| tree.kind(p) == SyntaxKind::FileAnnotationList)
}

/// The node an annotation applies to.
#[must_use]
pub fn annotated_node(tree: &SyntaxTree, annotation: NodeId) -> Option<NodeId> {
    let parent = tree.parent(annotation)?;
    match tree.kind(parent) {
        SyntaxKind::FileAnnotationList => Some(tree.root()),
        SyntaxKind::ModifierList => tree.parent(parent),
        _ => Some(parent),
    }
}

/// Suppression annotations already present on `target`.
#[must_use]
pub fn suppressions_on(tree: &SyntaxTree, target: NodeId) -> Vec<NodeId> {
    let holders: Vec<NodeId> = if target == tree.root() {
        tree.children(target)
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == SyntaxKind::FileAnnotationList)
            .collect()
    } else {
        std::iter::once(target)
            .chain(
                tree.children(target)
                    .iter()
                    .copied()
                    .filter(|&c| tree.kind(c) == SyntaxKind::ModifierList),
            )
            .collect()
    };
    holders
        .into_iter()
        .flat_map(|h| tree.children(h).iter().copied())
        .filter(|&c| is_suppression(tree, c))
        .collect()
}

/// Returns true for expressions that are statements of a block.
#[must_use]
pub fn is_statement(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node).is_expression()
        && tree
            .parent(node)
            .is_some_and(|p| tree.kind(p) == SyntaxKind::Block)
}

/// Returns true for nodes that accept a suppression annotation.
#[must_use]
pub fn is_annotatable(tree: &SyntaxTree, node: NodeId) -> bool {
    match tree.kind(node) {
        SyntaxKind::File
        | SyntaxKind::Class
        | SyntaxKind::Function
        | SyntaxKind::Property
        | SyntaxKind::ValueParameter
        | SyntaxKind::ValueArgument => true,
        _ => is_statement(tree, node),
    }
}

/// Closest annotatable node at or above `node`.
#[must_use]
pub fn nearest_annotatable(tree: &SyntaxTree, node: NodeId) -> NodeId {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&n| is_annotatable(tree, n))
        .unwrap_or_else(|| tree.root())
}

/// Builds `@Name("a", "b")`, or `@file:Name(...)` for file annotations.
#[must_use]
pub fn build(name: &str, entries: &BTreeSet<String>, file: bool) -> Fragment {
    let arguments = entries
        .iter()
        .map(|entry| Fragment::node(SyntaxKind::ValueArgument, vec![string_template(entry)]))
        .collect();
    build_with(name, arguments, file)
}

fn build_with(name: &str, arguments: Vec<Fragment>, file: bool) -> Fragment {
    let mut children = vec![Fragment::leaf(SyntaxKind::Operator, "@")];
    if file {
        children.push(Fragment::leaf(SyntaxKind::Keyword, "file"));
        children.push(Fragment::leaf(SyntaxKind::Operator, ":"));
    }
    children.push(Fragment::leaf(SyntaxKind::Identifier, name));

    let mut list = vec![Fragment::leaf(SyntaxKind::Operator, "(")];
    for (i, argument) in arguments.into_iter().enumerate() {
        if i > 0 {
            list.push(Fragment::leaf(SyntaxKind::Operator, ","));
            list.push(Fragment::whitespace(" "));
        }
        list.push(argument);
    }
    list.push(Fragment::leaf(SyntaxKind::Operator, ")"));
    children.push(Fragment::node(SyntaxKind::ValueArgumentList, list));
    Fragment::node(SyntaxKind::Annotation, children)
}

/// A string literal holding `value`.
#[must_use]
pub fn string_template(value: &str) -> Fragment {
    Fragment::node(
        SyntaxKind::StringTemplate,
        vec![Fragment::leaf(SyntaxKind::Literal, format!("\"{value}\""))],
    )
}

/// Indentation of the line `node` starts on, when it starts the line.
#[must_use]
pub fn indent_of(tree: &SyntaxTree, node: NodeId) -> String {
    tree.prev_leaf(node)
        .filter(|&l| tree.kind(l) == SyntaxKind::Whitespace)
        .and_then(|l| tree.leaf_text(l))
        .and_then(|text| text.rfind('\n').map(|i| text[i + 1..].to_string()))
        .unwrap_or_default()
}

/// Edit attaching a new `@Suppress` annotation with `entries` to `target`.
#[must_use]
pub fn insert(tree: &SyntaxTree, target: NodeId, entries: &BTreeSet<String>) -> Edit {
    let first_code = tree
        .children(target)
        .iter()
        .copied()
        .find(|&c| !tree.kind(c).is_trivia());

    if target == tree.root() {
        let list = Fragment::node(
            SyntaxKind::FileAnnotationList,
            vec![build(SUPPRESS, entries, true)],
        );
        return match first_code {
            Some(anchor) => {
                let separator = if tree.kind(anchor) == SyntaxKind::FileAnnotationList {
                    "\n"
                } else {
                    "\n\n"
                };
                Edit::InsertBefore {
                    anchor,
                    nodes: vec![list, Fragment::whitespace(separator)],
                }
            }
            None => Edit::InsertChildren {
                parent: target,
                index: tree.children(target).len(),
                nodes: vec![list],
            },
        };
    }

    let annotation = build(SUPPRESS, entries, false);
    match tree.kind(target) {
        SyntaxKind::ValueParameter | SyntaxKind::ValueArgument => {
            let nodes = vec![annotation, Fragment::whitespace(" ")];
            match first_code {
                Some(anchor) => Edit::InsertBefore { anchor, nodes },
                None => Edit::InsertChildren {
                    parent: target,
                    index: 0,
                    nodes,
                },
            }
        }
        kind if kind.is_declaration() => {
            let nodes = vec![
                annotation,
                Fragment::whitespace(format!("\n{}", indent_of(tree, target))),
            ];
            match first_code {
                Some(anchor) => Edit::InsertBefore { anchor, nodes },
                None => Edit::InsertChildren {
                    parent: target,
                    index: 0,
                    nodes,
                },
            }
        }
        _ => Edit::Replace {
            target,
            with: vec![Fragment::node(
                SyntaxKind::AnnotatedExpression,
                vec![
                    annotation,
                    Fragment::whitespace(format!("\n{}", indent_of(tree, target))),
                    Fragment::Existing(target),
                ],
            )],
        },
    }
}

/// Edit rewriting the string entries of an existing annotation, keeping
/// its name.
///
/// Arguments that are not string literals are copied unchanged after the
/// entries.
#[must_use]
pub fn rewrite(tree: &SyntaxTree, annotation: NodeId, entries: &BTreeSet<String>) -> Edit {
    let name = name(tree, annotation).unwrap_or(SUPPRESS);
    let values = entries
        .iter()
        .map(|entry| Fragment::node(SyntaxKind::ValueArgument, vec![string_template(entry)]))
        .chain(
            arguments(tree, annotation)
                .into_iter()
                .filter(|&argument| literal(tree, argument).is_none())
                .map(|argument| Fragment::copy(tree, argument)),
        )
        .collect();
    Edit::Replace {
        target: annotation,
        with: vec![build_with(name, values, is_file_annotation(tree, annotation))],
    }
}
