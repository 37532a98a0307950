//! Small Kotlin-shaped trees for unit tests.

use super::{Fragment, NodeId, SyntaxKind, SyntaxTree, TreeBuilder};

pub(crate) fn tree(root: Fragment) -> SyntaxTree {
    fn walk(builder: &mut TreeBuilder, fragment: Fragment) {
        match fragment {
            Fragment::Leaf { kind, text } => {
                builder.token(kind, text);
            }
            Fragment::Node { kind, children } => {
                builder.start_node(kind);
                for child in children {
                    walk(builder, child);
                }
                builder.finish_node();
            }
            Fragment::Existing(_) => panic!("fixtures cannot reference existing nodes"),
        }
    }
    let mut builder = TreeBuilder::new();
    walk(&mut builder, root);
    builder.finish().unwrap()
}

pub(crate) fn file(children: Vec<Fragment>) -> Fragment {
    Fragment::node(SyntaxKind::File, children)
}

pub(crate) fn ws(text: &str) -> Fragment {
    Fragment::whitespace(text)
}

pub(crate) fn kw(text: &str) -> Fragment {
    Fragment::leaf(SyntaxKind::Keyword, text)
}

pub(crate) fn ident(text: &str) -> Fragment {
    Fragment::leaf(SyntaxKind::Identifier, text)
}

pub(crate) fn op(text: &str) -> Fragment {
    Fragment::leaf(SyntaxKind::Operator, text)
}

pub(crate) fn eol(text: &str) -> Fragment {
    Fragment::leaf(SyntaxKind::EolComment, text)
}

pub(crate) fn block_comment(text: &str) -> Fragment {
    Fragment::leaf(SyntaxKind::BlockComment, text)
}

pub(crate) fn string(text: &str) -> Fragment {
    Fragment::node(
        SyntaxKind::StringTemplate,
        vec![Fragment::leaf(SyntaxKind::Literal, format!("\"{text}\""))],
    )
}

/// `val <name> = "<value>"`
pub(crate) fn val(name: &str, value: &str) -> Fragment {
    val_with(Vec::new(), name, value)
}

/// `val` with leading children such as comments or modifiers.
pub(crate) fn val_with(mut leading: Vec<Fragment>, name: &str, value: &str) -> Fragment {
    leading.extend([
        kw("val"),
        ws(" "),
        ident(name),
        ws(" "),
        op("="),
        ws(" "),
        string(value),
    ]);
    Fragment::node(SyntaxKind::Property, leading)
}

/// `@<name>("a", "b")`
pub(crate) fn annotation(name: &str, entries: &[&str]) -> Fragment {
    let mut args = vec![op("(")];
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            args.extend([op(","), ws(" ")]);
        }
        args.push(Fragment::node(SyntaxKind::ValueArgument, vec![string(entry)]));
    }
    args.push(op(")"));
    Fragment::node(
        SyntaxKind::Annotation,
        vec![
            op("@"),
            ident(name),
            Fragment::node(SyntaxKind::ValueArgumentList, args),
        ],
    )
}

pub(crate) fn modifiers(children: Vec<Fragment>) -> Fragment {
    Fragment::node(SyntaxKind::ModifierList, children)
}

/// `<name>()`
pub(crate) fn call(name: &str) -> Fragment {
    Fragment::node(
        SyntaxKind::CallExpression,
        vec![
            ident(name),
            Fragment::node(SyntaxKind::ValueArgumentList, vec![op("("), op(")")]),
        ],
    )
}

/// `fun <name>() { <body> }`
pub(crate) fn fun(name: &str, body: Vec<Fragment>) -> Fragment {
    let mut block = vec![op("{")];
    block.extend(body);
    block.push(op("}"));
    Fragment::node(
        SyntaxKind::Function,
        vec![
            kw("fun"),
            ws(" "),
            ident(name),
            Fragment::node(SyntaxKind::ValueParameterList, vec![op("("), op(")")]),
            ws(" "),
            Fragment::node(SyntaxKind::Block, block),
        ],
    )
}

pub(crate) fn import(path: &str) -> Fragment {
    Fragment::node(
        SyntaxKind::ImportDirective,
        vec![kw("import"), ws(" "), ident(path)],
    )
}

/// The `nth` node of a kind in document order.
pub(crate) fn nth(tree: &SyntaxTree, kind: SyntaxKind, nth: usize) -> NodeId {
    tree.descendants(tree.root())
        .filter(|&n| tree.kind(n) == kind)
        .nth(nth)
        .unwrap()
}
