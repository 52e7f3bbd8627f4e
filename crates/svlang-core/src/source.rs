//! Source buffer storage and location resolution.
//!
//! All text a compilation ever sees lives in a `SourceManager`: files loaded
//! from disk, in-memory buffers, and the bodies of macro expansions. Buffers
//! are identified by a stable `SourceId`; every later string is a view into a
//! buffer. Locations resolve through `line` directive overrides and macro
//! expansion chains back to a (path, line, column) triple.

use std::ops::Range;
use std::path::{Path, PathBuf};

use rowan::{TextRange, TextSize};

/// Lightweight handle to a source buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct SourceId(u32);

impl SourceId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A byte range inside a specific buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileSpan {
    pub source: SourceId,
    pub range: TextRange,
}

impl FileSpan {
    pub fn new(source: SourceId, range: TextRange) -> Self {
        Self { source, range }
    }

    pub fn empty(source: SourceId, offset: TextSize) -> Self {
        Self {
            source,
            range: TextRange::empty(offset),
        }
    }

    pub fn start(&self) -> TextSize {
        self.range.start()
    }

    /// Extends this span to cover `other`, provided both are in the same buffer.
    pub fn cover(&self, other: FileSpan) -> FileSpan {
        if self.source != other.source {
            return *self;
        }
        FileSpan::new(self.source, self.range.cover(other.range))
    }
}

/// Handle to one macro expansion recorded in the manager.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExpansionId(u32);

/// One step of a macro expansion chain.
#[derive(Clone, Debug)]
pub struct Expansion {
    /// Span of the macro name at the usage site.
    pub name_span: FileSpan,
    /// Span of the whole usage, including any argument list.
    pub usage_span: FileSpan,
    /// Expansion this usage itself came from, for nested macros.
    pub parent: Option<ExpansionId>,
}

/// A resolved human-readable location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    /// 1-based line, after `line` directive overrides.
    pub line: u32,
    /// 1-based column in UTF-8 bytes.
    pub column: u32,
}

/// Errors from path and include resolution.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("include file '{0}' not found")]
    NotFound(String),

    #[error("include depth exceeds limit of {0}")]
    IncludeDepth(u32),
}

/// A `line` directive override: tokens at or after `offset` report as if the
/// next line were `line` in file `name` (None keeps the buffer's own name).
#[derive(Clone, Debug)]
struct LineOverride {
    offset: TextSize,
    line: u32,
    name: Option<String>,
}

#[derive(Debug)]
struct Buffer {
    name: String,
    /// Directory of the file, for relative include resolution. None for
    /// in-memory buffers.
    directory: Option<PathBuf>,
    text: String,
    line_starts: Vec<TextSize>,
    line_overrides: Vec<LineOverride>,
}

/// Owns every source buffer of a compilation and resolves locations.
#[derive(Debug, Default)]
pub struct SourceManager {
    buffers: Vec<Buffer>,
    expansions: Vec<Expansion>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an in-memory buffer under a display name.
    pub fn add_buffer(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        self.push_buffer(name.into(), None, text.into())
    }

    /// Loads a file from disk.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<SourceId, SourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = path.parent().map(Path::to_path_buf);
        Ok(self.push_buffer(path.display().to_string(), directory, text))
    }

    /// Resolves an `include` against the including file's directory, then the
    /// user directories in order, then the system directories in order.
    ///
    /// Cyclic includes are legal at this level; only depth past `max_depth`
    /// is an error.
    pub fn open_include(
        &mut self,
        name: &str,
        from: SourceId,
        user_dirs: &[PathBuf],
        system_dirs: &[PathBuf],
        depth: u32,
        max_depth: u32,
    ) -> Result<SourceId, SourceError> {
        if depth >= max_depth {
            return Err(SourceError::IncludeDepth(max_depth));
        }

        let relative = self.buffer(from).directory.clone();
        let candidates = relative
            .iter()
            .map(PathBuf::as_path)
            .chain(user_dirs.iter().map(PathBuf::as_path))
            .chain(system_dirs.iter().map(PathBuf::as_path));

        for dir in candidates {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return self.load_file(candidate);
            }
        }
        // A bare relative path with no search hit may still resolve against
        // the working directory.
        if Path::new(name).is_file() {
            return self.load_file(name);
        }
        Err(SourceError::NotFound(name.to_string()))
    }

    pub fn text(&self, id: SourceId) -> &str {
        &self.buffer(id).text
    }

    pub fn name(&self, id: SourceId) -> &str {
        &self.buffer(id).name
    }

    pub fn text_slice(&self, span: FileSpan) -> &str {
        &self.buffer(span.source).text[Range::<usize>::from(span.range)]
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Records a `line` directive override for subsequent offsets.
    pub fn set_line_override(
        &mut self,
        id: SourceId,
        offset: TextSize,
        line: u32,
        name: Option<String>,
    ) {
        self.buffer_mut(id)
            .line_overrides
            .push(LineOverride { offset, line, name });
    }

    /// Registers a macro expansion and returns its handle.
    pub fn register_expansion(
        &mut self,
        name_span: FileSpan,
        usage_span: FileSpan,
        parent: Option<ExpansionId>,
    ) -> ExpansionId {
        let id = ExpansionId(self.expansions.len() as u32);
        self.expansions.push(Expansion {
            name_span,
            usage_span,
            parent,
        });
        id
    }

    pub fn expansion(&self, id: ExpansionId) -> &Expansion {
        &self.expansions[id.0 as usize]
    }

    /// Walks an expansion chain outward: innermost usage first.
    pub fn expansion_chain(&self, id: ExpansionId) -> impl Iterator<Item = &Expansion> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let exp = self.expansion(next?);
            next = exp.parent;
            Some(exp)
        })
    }

    /// Resolves a span to (name, line, column), honoring `line` overrides.
    pub fn resolve(&self, span: FileSpan) -> Location {
        let buffer = self.buffer(span.source);
        let offset = span.range.start();
        let line_idx = buffer
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = u32::from(offset - buffer.line_starts[line_idx]) + 1;

        let raw_line = line_idx as u32 + 1;
        match buffer
            .line_overrides
            .iter()
            .rev()
            .find(|o| o.offset <= offset)
        {
            Some(o) => {
                let base_line = buffer
                    .line_starts
                    .partition_point(|&start| start <= o.offset)
                    .saturating_sub(1) as u32
                    + 1;
                Location {
                    name: o.name.clone().unwrap_or_else(|| buffer.name.clone()),
                    line: o.line + (raw_line - base_line),
                    column,
                }
            }
            None => Location {
                name: buffer.name.clone(),
                line: raw_line,
                column,
            },
        }
    }

    fn push_buffer(&mut self, name: String, directory: Option<PathBuf>, text: String) -> SourceId {
        // BOM tolerated: strip it so offsets match what tools expect.
        let text = match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        };
        let mut line_starts = vec![TextSize::from(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from(i as u32 + 1));
            }
        }
        let id = SourceId(self.buffers.len() as u32);
        self.buffers.push(Buffer {
            name,
            directory,
            text,
            line_starts,
            line_overrides: Vec::new(),
        });
        id
    }

    fn buffer(&self, id: SourceId) -> &Buffer {
        self.buffers.get(id.0 as usize).expect("invalid SourceId")
    }

    fn buffer_mut(&mut self, id: SourceId) -> &mut Buffer {
        self.buffers
            .get_mut(id.0 as usize)
            .expect("invalid SourceId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: SourceId, start: u32, end: u32) -> FileSpan {
        FileSpan::new(id, TextRange::new(start.into(), end.into()))
    }

    #[test]
    fn line_and_column() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("top.sv", "module m;\n  wire w;\nendmodule\n");

        assert_eq!(
            sm.resolve(span(id, 0, 6)),
            Location {
                name: "top.sv".into(),
                line: 1,
                column: 1
            }
        );
        // "wire" starts at offset 12: line 2, column 3.
        assert_eq!(
            sm.resolve(span(id, 12, 16)),
            Location {
                name: "top.sv".into(),
                line: 2,
                column: 3
            }
        );
    }

    #[test]
    fn bom_is_stripped() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("bom.sv", "\u{feff}module");
        assert_eq!(sm.text(id), "module");
    }

    #[test]
    fn line_override_shifts_reporting() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("gen.sv", "a\nb\nc\nd\n");
        // At offset 4 (start of line 3), report as line 100 of "orig.sv".
        sm.set_line_override(id, 4.into(), 100, Some("orig.sv".into()));

        assert_eq!(sm.resolve(span(id, 0, 1)).line, 1);
        let loc = sm.resolve(span(id, 6, 7));
        assert_eq!(loc.name, "orig.sv");
        assert_eq!(loc.line, 101);
    }

    #[test]
    fn expansion_chain_walks_outward() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("m.sv", "`A `B");
        let outer = sm.register_expansion(span(id, 0, 2), span(id, 0, 2), None);
        let inner = sm.register_expansion(span(id, 3, 5), span(id, 3, 5), Some(outer));

        let chain: Vec<_> = sm.expansion_chain(inner).collect();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name_span, span(id, 3, 5));
        assert_eq!(chain[1].name_span, span(id, 0, 2));
    }

    #[test]
    fn include_depth_limit() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("top.sv", "");
        let err = sm
            .open_include("missing.svh", id, &[], &[], 32, 32)
            .unwrap_err();
        assert!(matches!(err, SourceError::IncludeDepth(32)));
    }

    #[test]
    fn include_not_found() {
        let mut sm = SourceManager::new();
        let id = sm.add_buffer("top.sv", "");
        let err = sm
            .open_include("definitely/not/here.svh", id, &[], &[], 0, 32)
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn include_resolves_from_user_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("defs.svh"), "`define WIDTH 8\n").unwrap();

        let mut sm = SourceManager::new();
        let top = sm.add_buffer("top.sv", "");
        let inc = sm
            .open_include("defs.svh", top, &[dir.path().to_path_buf()], &[], 0, 32)
            .unwrap();
        assert_eq!(sm.text(inc), "`define WIDTH 8\n");
    }

    #[test]
    fn relative_include_prefers_including_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("inner.svh"), "// inner\n").unwrap();
        std::fs::write(sub.join("top.sv"), "`include \"inner.svh\"\n").unwrap();

        let mut sm = SourceManager::new();
        let top = sm.load_file(sub.join("top.sv")).unwrap();
        let inc = sm.open_include("inner.svh", top, &[], &[], 0, 32).unwrap();
        assert_eq!(sm.text(inc), "// inner\n");
    }
}
