//! Tree rewriting by green-node splicing.
//!
//! A published syntax tree is immutable; the rewriter produces a *new* tree
//! in which the replaced subtrees and their spines are rebuilt while every
//! untouched subtree is shared with the original. Collect edits, then
//! `commit` against the root.

use std::collections::HashMap;

use rowan::{GreenNode, GreenToken, NodeOrToken};

use crate::cst::{SyntaxKind, SyntaxNode};

/// A batch of non-overlapping subtree replacements.
#[derive(Default)]
pub struct Rewriter {
    replacements: HashMap<SyntaxNode, Option<GreenNode>>,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `target` with a new subtree.
    pub fn replace(&mut self, target: &SyntaxNode, replacement: GreenNode) {
        self.replacements.insert(target.clone(), Some(replacement));
    }

    /// Removes `target` entirely.
    pub fn remove(&mut self, target: &SyntaxNode) {
        self.replacements.insert(target.clone(), None);
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Builds the rewritten tree. Subtrees without edits are referenced
    /// directly; only the spines above edits are reconstructed.
    pub fn commit(&self, root: &SyntaxNode) -> SyntaxNode {
        if self.replacements.is_empty() {
            return root.clone();
        }
        match self.rebuild(root) {
            Some(green) => SyntaxNode::new_root(green),
            None => SyntaxNode::new_root(GreenNode::new(
                SyntaxKind::CompilationUnit.into(),
                std::iter::empty::<NodeOrToken<GreenNode, GreenToken>>(),
            )),
        }
    }

    fn rebuild(&self, node: &SyntaxNode) -> Option<GreenNode> {
        if let Some(replacement) = self.replacements.get(node) {
            return replacement.clone();
        }
        if !self.has_edit_below(node) {
            return Some(node.green().into_owned());
        }

        let children = node
            .children_with_tokens()
            .filter_map(|child| match child {
                NodeOrToken::Node(n) => self.rebuild(&n).map(NodeOrToken::Node),
                NodeOrToken::Token(t) => {
                    Some(NodeOrToken::Token(t.green().to_owned()))
                }
            })
            .collect::<Vec<NodeOrToken<GreenNode, GreenToken>>>();
        Some(GreenNode::new(node.kind().into(), children))
    }

    fn has_edit_below(&self, node: &SyntaxNode) -> bool {
        self.replacements
            .keys()
            .any(|edited| edited.ancestors().any(|a| &a == node))
    }
}

/// Builds a green token, for constructing small replacements by hand.
pub fn green_token(kind: SyntaxKind, text: &str) -> GreenToken {
    GreenToken::new(kind.into(), text)
}

/// Renders a tree as indented `Kind "text"` lines; the shape used by tests.
pub fn dump_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    dump_into(&mut out, node, 0);
    out
}

fn dump_into(out: &mut String, node: &SyntaxNode, depth: usize) {
    use std::fmt::Write;
    let _ = writeln!(out, "{}{:?}", "  ".repeat(depth), node.kind());
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(n) => dump_into(out, &n, depth + 1),
            NodeOrToken::Token(t) => {
                let _ = writeln!(
                    out,
                    "{}{:?} {:?}",
                    "  ".repeat(depth + 1),
                    t.kind(),
                    t.text()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svlang_core::diagnostics::Diagnostics;
    use svlang_core::source::SourceManager;

    use crate::preprocessor::{Preprocessor, PreprocessorOptions};

    fn parse(text: &str) -> (crate::parser::Parse, SourceManager) {
        let mut sm = SourceManager::new();
        let root = sm.add_buffer("rw.sv", text);
        let mut diags = Diagnostics::new();
        let options = PreprocessorOptions::default();
        let result = Preprocessor::new(&mut sm, &mut diags, root, &options).run();
        let parse = crate::parser::parse_compilation_unit(&sm, &result.tokens)
            .expect("within fuel limits");
        (parse, sm)
    }

    #[test]
    fn replace_shares_unchanged_siblings() {
        let (parsed, sm) = parse("module m; wire a; wire b; endmodule\n");
        let root = parsed.root();
        let nets: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::NetDecl)
            .collect();
        assert_eq!(nets.len(), 2);

        // Reparse a replacement declaration and splice it over the first.
        let (replacement, _sm2) = parse("module x; wire renamed; endmodule\n");
        let new_net = replacement
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::NetDecl)
            .unwrap();

        let mut rewriter = Rewriter::new();
        rewriter.replace(&nets[0], new_net.green().into_owned());
        let new_root = rewriter.commit(&root);

        assert_eq!(
            new_root.text().to_string(),
            "module m; wire renamed; wire b; endmodule\n"
        );
        // The untouched second net's green data is shared, not copied.
        let new_nets: Vec<_> = new_root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::NetDecl)
            .collect();
        assert_eq!(new_nets[1].green(), nets[1].green());
        // The original tree is untouched.
        assert_eq!(root.text().to_string(), "module m; wire a; wire b; endmodule\n");
        let _ = sm;
    }

    #[test]
    fn remove_drops_subtree() {
        let (parse, _) = parse("module m; wire a; wire b; endmodule\n");
        let root = parse.root();
        let first_net = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::NetDecl)
            .unwrap();

        let mut rewriter = Rewriter::new();
        rewriter.remove(&first_net);
        let new_root = rewriter.commit(&root);

        assert_eq!(
            new_root.text().to_string(),
            "module m;  wire b; endmodule\n"
        );
    }

    #[test]
    fn rewritten_tree_reparses_identically() {
        let (parsed, _) = parse("module m; assign x = 1; endmodule\n");
        let root = parsed.root();
        let rewriter = Rewriter::new();
        let same = rewriter.commit(&root);
        assert_eq!(same.text(), root.text());

        let (reparsed, _) = parse(&same.text().to_string());
        assert_eq!(dump_tree(&reparsed.root()), dump_tree(&root));
    }
}
