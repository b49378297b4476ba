//! Annotated input file parser.
//!
//! The input is a UTF-8 text file parsed line by line. A line whose first
//! non-whitespace character is `@` is a directive, everything else is
//! shader code:
//!
//! ```text
//! @module demo
//! @type mat4 hmm_mat4
//! @block uniforms
//! layout(binding = 0) uniform vs_params { mat4 mvp; };
//! @end
//! @vs vs
//! @include_block uniforms
//! layout(location = 0) in vec4 position;
//! void main() { gl_Position = mvp * position; }
//! @end
//! @fs fs
//! layout(location = 0) out vec4 frag_color;
//! void main() { frag_color = vec4(1.0); }
//! @end
//! @program prog vs fs
//! ```
//!
//! A snippet stores the zero-based indices of its source lines rather
//! than copies of the text; `@include_block` splices the already resolved
//! indices of the named block, so inclusion is a single forward pass and
//! downstream stages can map any derived line back to the original file.

use std::fs;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::Diagnostic;

/// What a named snippet contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    /// Reusable lines, only ever spliced into other snippets.
    Block,
    /// A vertex shader.
    Vertex,
    /// A fragment shader.
    Fragment,
}

impl SnippetKind {
    /// The directive word that opens a snippet of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Vertex => "vs",
            Self::Fragment => "fs",
        }
    }
}

/// A named region of shader code with its resolved source lines.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub kind: SnippetKind,
    pub name: String,
    /// Zero-based indices into [`Input::lines`], in expansion order.
    pub lines: Vec<usize>,
}

impl Snippet {
    /// First original source line, the anchor for snippet-level diagnostics.
    #[must_use]
    pub fn first_line(&self) -> usize {
        self.lines.first().copied().unwrap_or(0)
    }
}

/// A `@program` declaration pairing a vertex with a fragment snippet.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub vs_name: String,
    pub fs_name: String,
    /// Zero-based line of the `@program` declaration.
    pub line_index: usize,
}

/// The parsed input file. All downstream artifacts reference it by
/// snippet index and line index.
#[derive(Debug, Default)]
pub struct Input {
    pub path: String,
    pub lines: Vec<String>,
    /// Snippets in declaration order.
    pub snippets: Vec<Snippet>,
    /// Programs in declaration order.
    pub programs: Vec<Program>,
    /// Optional `@module` symbol prefix, empty if absent.
    pub module: String,
    /// `@type` aliases: GLSL type name to C type name.
    pub type_map: FxHashMap<String, String>,
    pub snippet_map: FxHashMap<String, usize>,
    pub block_map: FxHashMap<String, usize>,
    pub vs_map: FxHashMap<String, usize>,
    pub fs_map: FxHashMap<String, usize>,
}

impl Input {
    /// Reads and parses an annotated source file.
    pub fn parse(path: &str) -> Result<Self, Diagnostic> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse_source(path, &text),
            Err(err) => Err(Diagnostic::file(path, format!("failed to read input file: {err}"))),
        }
    }

    /// Parses already loaded source text; `path` is only used in
    /// diagnostics and the generated header banner.
    pub fn parse_source(path: &str, text: &str) -> Result<Self, Diagnostic> {
        Parser::new(path).run(text)
    }

    /// The generated-symbol prefix: `module_` or the empty string.
    #[must_use]
    pub fn module_prefix(&self) -> String {
        if self.module.is_empty() {
            String::new()
        } else {
            format!("{}_", self.module)
        }
    }

    /// Logs the parsed tables at debug level.
    pub fn dump_debug(&self) {
        log::debug!("input: {} ({} lines)", self.path, self.lines.len());
        if !self.module.is_empty() {
            log::debug!("  module: {}", self.module);
        }
        for (glsl_type, c_type) in &self.type_map {
            log::debug!("  type: {glsl_type} => {c_type}");
        }
        for (index, snippet) in self.snippets.iter().enumerate() {
            log::debug!(
                "  snippet #{index} @{} '{}': lines {:?}",
                snippet.kind.as_str(),
                snippet.name,
                snippet.lines
            );
        }
        for program in &self.programs {
            log::debug!(
                "  program '{}': vs '{}', fs '{}' (line {})",
                program.name,
                program.vs_name,
                program.fs_name,
                program.line_index + 1
            );
        }
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A snippet being collected between its opening directive and `@end`.
struct OpenSnippet {
    snippet: Snippet,
    start_line: usize,
    /// Transitive names of every block spliced in so far.
    includes: FxHashSet<String>,
}

struct Parser {
    input: Input,
    current: Option<OpenSnippet>,
    /// Per finished block: the transitive set of blocks it spliced in.
    include_sets: FxHashMap<String, FxHashSet<String>>,
}

impl Parser {
    fn new(path: &str) -> Self {
        Self {
            input: Input {
                path: path.to_string(),
                ..Input::default()
            },
            current: None,
            include_sets: FxHashMap::default(),
        }
    }

    fn run(mut self, text: &str) -> Result<Input, Diagnostic> {
        self.input.lines = text.lines().map(str::to_string).collect();
        for line_index in 0..self.input.lines.len() {
            let trimmed = self.input.lines[line_index].trim_start();
            if !trimmed.starts_with('@') {
                if let Some(open) = &mut self.current {
                    open.snippet.lines.push(line_index);
                }
                continue;
            }
            let tokens: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
            self.directive(line_index, &tokens)?;
        }
        if let Some(open) = &self.current {
            return Err(self.err(
                open.start_line,
                format!(
                    "'@{} {}' without matching '@end'",
                    open.snippet.kind.as_str(),
                    open.snippet.name
                ),
            ));
        }
        Ok(self.input)
    }

    fn directive(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        match tokens[0].as_str() {
            "@block" => self.begin_snippet(line, tokens, SnippetKind::Block),
            "@vs" => self.begin_snippet(line, tokens, SnippetKind::Vertex),
            "@fs" => self.begin_snippet(line, tokens, SnippetKind::Fragment),
            "@end" => self.end_snippet(line, tokens),
            "@include_block" => self.include_block(line, tokens),
            "@program" => self.program(line, tokens),
            "@type" => self.type_alias(line, tokens),
            "@module" => self.module(line, tokens),
            tag => Err(self.err(line, format!("unknown @-tag '{tag}'"))),
        }
    }

    fn err(&self, line: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic::at(&self.input.path, line, message)
    }

    fn check_arity(&self, line: usize, tokens: &[String], args: usize) -> Result<(), Diagnostic> {
        if tokens.len() == args + 1 {
            Ok(())
        } else {
            Err(self.err(line, format!("'{}' expects {} argument(s)", tokens[0], args)))
        }
    }

    fn ident<'a>(&self, line: usize, token: &'a str) -> Result<&'a str, Diagnostic> {
        if is_ident(token) {
            Ok(token)
        } else {
            Err(self.err(line, format!("'{token}' is not a valid identifier")))
        }
    }

    fn begin_snippet(
        &mut self,
        line: usize,
        tokens: &[String],
        kind: SnippetKind,
    ) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 1)?;
        if let Some(open) = &self.current {
            return Err(self.err(
                line,
                format!(
                    "cannot start '{}' inside '@{} {}'",
                    tokens[0],
                    open.snippet.kind.as_str(),
                    open.snippet.name
                ),
            ));
        }
        let name = self.ident(line, &tokens[1])?;
        if self.input.snippet_map.contains_key(name) {
            return Err(self.err(line, format!("duplicate snippet name '{name}'")));
        }
        self.current = Some(OpenSnippet {
            snippet: Snippet {
                kind,
                name: name.to_string(),
                lines: Vec::new(),
            },
            start_line: line,
            includes: FxHashSet::default(),
        });
        Ok(())
    }

    fn end_snippet(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 0)?;
        let Some(open) = self.current.take() else {
            return Err(self.err(line, "'@end' without an open '@block', '@vs' or '@fs'"));
        };
        let index = self.input.snippets.len();
        let name = open.snippet.name.clone();
        self.input.snippet_map.insert(name.clone(), index);
        match open.snippet.kind {
            SnippetKind::Block => {
                self.input.block_map.insert(name.clone(), index);
                self.include_sets.insert(name, open.includes);
            }
            SnippetKind::Vertex => {
                self.input.vs_map.insert(name, index);
            }
            SnippetKind::Fragment => {
                self.input.fs_map.insert(name, index);
            }
        }
        self.input.snippets.push(open.snippet);
        Ok(())
    }

    fn include_block(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 1)?;
        let name = self.ident(line, &tokens[1])?.to_string();
        let current_name = match &self.current {
            Some(open) => open.snippet.name.clone(),
            None => {
                return Err(self.err(line, "'@include_block' must appear inside a snippet"));
            }
        };
        if name == current_name {
            return Err(self.err(line, format!("snippet '{current_name}' cannot include itself")));
        }
        let block_index = match self.input.block_map.get(&name) {
            Some(&index) => index,
            None => {
                let message = if self.input.snippet_map.contains_key(&name) {
                    format!("'{name}' is not a '@block' snippet")
                } else {
                    format!("unknown block '{name}'")
                };
                return Err(self.err(line, message));
            }
        };
        let transitive = self.include_sets.get(&name).cloned().unwrap_or_default();
        if transitive.contains(&current_name) {
            return Err(self.err(line, format!("'@include_block {name}' creates an include cycle")));
        }
        let block_lines = self.input.snippets[block_index].lines.clone();
        if let Some(open) = &mut self.current {
            open.snippet.lines.extend(block_lines);
            open.includes.insert(name);
            open.includes.extend(transitive);
        }
        Ok(())
    }

    fn program(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 3)?;
        if self.current.is_some() {
            return Err(self.err(line, "'@program' cannot appear inside a snippet"));
        }
        let name = self.ident(line, &tokens[1])?.to_string();
        let vs_name = self.ident(line, &tokens[2])?.to_string();
        let fs_name = self.ident(line, &tokens[3])?.to_string();
        if self.input.programs.iter().any(|p| p.name == name) {
            return Err(self.err(line, format!("duplicate program name '{name}'")));
        }
        if !self.input.vs_map.contains_key(&vs_name) {
            let message = if self.input.snippet_map.contains_key(&vs_name) {
                format!("'{vs_name}' is not a '@vs' snippet")
            } else {
                format!("unknown vertex shader '{vs_name}'")
            };
            return Err(self.err(line, message));
        }
        if !self.input.fs_map.contains_key(&fs_name) {
            let message = if self.input.snippet_map.contains_key(&fs_name) {
                format!("'{fs_name}' is not a '@fs' snippet")
            } else {
                format!("unknown fragment shader '{fs_name}'")
            };
            return Err(self.err(line, message));
        }
        self.input.programs.push(Program {
            name,
            vs_name,
            fs_name,
            line_index: line,
        });
        Ok(())
    }

    fn type_alias(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 2)?;
        if self.current.is_some() {
            return Err(self.err(line, "'@type' cannot appear inside a snippet"));
        }
        let glsl_type = self.ident(line, &tokens[1])?.to_string();
        let c_type = self.ident(line, &tokens[2])?.to_string();
        self.input.type_map.insert(glsl_type, c_type);
        Ok(())
    }

    fn module(&mut self, line: usize, tokens: &[String]) -> Result<(), Diagnostic> {
        self.check_arity(line, tokens, 1)?;
        if self.current.is_some() {
            return Err(self.err(line, "'@module' cannot appear inside a snippet"));
        }
        if !self.input.module.is_empty() {
            return Err(self.err(line, "'@module' can only appear once"));
        }
        self.input.module = self.ident(line, &tokens[1])?.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ident() {
        assert!(is_ident("vs_params"));
        assert!(is_ident("_private"));
        assert!(is_ident("a1"));
        assert!(!is_ident("1a"));
        assert!(!is_ident(""));
        assert!(!is_ident("vs-params"));
    }

    #[test]
    fn test_module_prefix() {
        let mut input = Input::default();
        assert_eq!(input.module_prefix(), "");
        input.module = "demo".to_string();
        assert_eq!(input.module_prefix(), "demo_");
    }
}
