//! The `SyntaxTree` facade: one call from source text to a parsed tree with
//! diagnostics, span mapping, and the preprocessor's residual state.

use std::path::Path;

use indexmap::IndexMap;
use rowan::GreenNode;

use svlang_core::diagnostics::Diagnostics;
use svlang_core::source::{SourceId, SourceManager};

use crate::Result;
use crate::ast;
use crate::cst::SyntaxNode;
use crate::parser::{self, Parse, SpanMap};
use crate::preprocessor::{
    DefaultNetTypeTracker, MacroDef, Preprocessor, PreprocessorOptions, TimeScale,
};

/// A parsed compilation-unit tree plus everything produced on the way to it.
///
/// The tree owns its text (green nodes store it); the source manager used to
/// build it is only needed again for resolving spans and rendering
/// diagnostics.
#[derive(Debug)]
pub struct SyntaxTree {
    green: GreenNode,
    diagnostics: Diagnostics,
    span_map: SpanMap,
    macros: IndexMap<String, MacroDef>,
    default_nettype: DefaultNetTypeTracker,
    time_scale: Option<TimeScale>,
    root_source: SourceId,
}

impl SyntaxTree {
    /// Lexes, preprocesses, and parses an in-memory buffer.
    pub fn from_text(
        text: &str,
        name: &str,
        sources: &mut SourceManager,
        options: &PreprocessorOptions,
    ) -> Result<SyntaxTree> {
        let root = sources.add_buffer(name, text);
        Self::build(root, sources, options)
    }

    /// Loads and parses a file.
    pub fn from_file(
        path: impl AsRef<Path>,
        sources: &mut SourceManager,
        options: &PreprocessorOptions,
    ) -> Result<SyntaxTree> {
        let root = sources.load_file(path)?;
        Self::build(root, sources, options)
    }

    fn build(
        root: SourceId,
        sources: &mut SourceManager,
        options: &PreprocessorOptions,
    ) -> Result<SyntaxTree> {
        let mut diagnostics = Diagnostics::new();
        let result = Preprocessor::new(sources, &mut diagnostics, root, options).run();
        let parse: Parse = parser::parse_compilation_unit(sources, &result.tokens)?;
        diagnostics.merge_buffered(parse.diagnostics);

        Ok(SyntaxTree {
            green: parse.green,
            diagnostics,
            span_map: parse.span_map,
            macros: result.macros,
            default_nettype: result.default_nettype,
            time_scale: result.time_scale,
            root_source: root,
        })
    }

    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn ast_root(&self) -> ast::Root {
        ast::Root::cast(self.root()).expect("tree root is a compilation unit")
    }

    /// Prints the tree back to text. Byte-identical to the input for source
    /// without macro substitutions.
    pub fn print(&self) -> String {
        self.root().text().to_string()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn span_map(&self) -> &SpanMap {
        &self.span_map
    }

    /// The macro table as it stood at end of input.
    pub fn macros(&self) -> &IndexMap<String, MacroDef> {
        &self.macros
    }

    pub fn default_nettype(&self) -> &DefaultNetTypeTracker {
        &self.default_nettype
    }

    pub fn time_scale(&self) -> Option<TimeScale> {
        self.time_scale
    }

    pub fn root_source(&self) -> SourceId {
        self.root_source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_round_trips() {
        let mut sm = SourceManager::new();
        let options = PreprocessorOptions::default();
        let text = "module m;\n  wire w;\nendmodule\n";
        let tree = SyntaxTree::from_text(text, "m.sv", &mut sm, &options).expect("parses");
        assert!(tree.diagnostics().is_empty());
        assert_eq!(tree.print(), text);
        assert_eq!(tree.ast_root().members().count(), 1);
    }

    #[test]
    fn from_file_reports_missing_path() {
        let mut sm = SourceManager::new();
        let options = PreprocessorOptions::default();
        let err = SyntaxTree::from_file("/does/not/exist.sv", &mut sm, &options);
        assert!(matches!(err, Err(crate::Error::Source(_))));
    }

    #[test]
    fn macro_table_is_snapshotted() {
        let mut sm = SourceManager::new();
        let options = PreprocessorOptions::default();
        let tree = SyntaxTree::from_text(
            "`define W 8\n`define F(x) x\nmodule m; endmodule\n",
            "m.sv",
            &mut sm,
            &options,
        )
        .expect("parses");
        assert!(tree.macros().contains_key("W"));
        assert!(tree.macros().contains_key("F"));
        assert!(tree.macros().contains_key("__LINE__"));
    }
}
