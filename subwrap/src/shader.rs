//! WGSL generation for a single-statement case.
//!
//! Every generated module writes one `u32` at `@binding(0)` and may read a
//! zero-valued `u32` uniform at `@binding(1)`. The uniform is opaque to the
//! compiler, so `zero + x` cannot be folded away before the code path under
//! test is reached.

pub const ENTRY_POINT: &str = "main";
pub const RESULT_NAME: &str = "buffer";
pub const RESULT_BINDING: u32 = 0;
pub const ZERO_BINDING: u32 = 1;

const RESULT_DECL: &str = "@group(0) @binding(0) var<storage, read_write> buffer: u32;\n";
const ZERO_DECL: &str = "@group(0) @binding(1) var<uniform> zero: u32;\n";

/// Generated WGSL for one case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub text: String,
    /// Whether `@binding(1)` is declared, and therefore must be bound.
    pub binds_zero: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ShaderBuilder {
    always_bind_zero: bool,
}

impl ShaderBuilder {
    pub fn new(always_bind_zero: bool) -> Self {
        Self { always_bind_zero }
    }

    pub fn build(&self, snippet: &str) -> ShaderSource {
        let binds_zero = self.always_bind_zero || references_zero(snippet);

        let mut text = String::with_capacity(256 + snippet.len());
        text.push_str(RESULT_DECL);
        if binds_zero {
            text.push_str(ZERO_DECL);
        }
        text.push_str("\n@compute @workgroup_size(1)\n");
        text.push_str("fn main(@builtin(global_invocation_id) gid: vec3u) {\n");
        // An unreferenced binding is dropped from the auto layout, which would
        // then reject the bind group entry for it.
        if binds_zero {
            text.push_str("  _ = zero;\n");
        }
        text.push_str("  ");
        text.push_str(snippet.trim());
        text.push_str("\n}\n");

        ShaderSource { text, binds_zero }
    }
}

/// True when `ident` appears as a whole identifier in `snippet`, outside of
/// comments.
pub fn references(snippet: &str, ident: &str) -> bool {
    strip_comments(snippet)
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == ident)
}

/// Replaces `//` line comments and nested `/* */` block comments with a space.
fn strip_comments(snippet: &str) -> String {
    let mut out = String::with_capacity(snippet.len());
    let mut chars = snippet.chars().peekable();
    let mut depth = 0usize;
    let mut in_line = false;

    while let Some(c) = chars.next() {
        if in_line {
            if c == '\n' {
                in_line = false;
                out.push(c);
            }
            continue;
        }
        match (c, chars.peek().copied()) {
            ('/', Some('*')) => {
                chars.next();
                depth += 1;
            }
            ('*', Some('/')) if depth > 0 => {
                chars.next();
                depth -= 1;
                if depth == 0 {
                    out.push(' ');
                }
            }
            ('/', Some('/')) if depth == 0 => {
                chars.next();
                in_line = true;
                out.push(' ');
            }
            _ if depth > 0 => {}
            _ => out.push(c),
        }
    }
    out
}

pub fn references_zero(snippet: &str) -> bool {
    references(snippet, "zero")
}
