//! rendered shell text
//!
//! A [Fragment] is what a single resource renders to. It stays line oriented until the very end
//! so that guards can re-indent their body without touching heredoc payloads.

/// Body of a guard that has nothing to do
const NO_OP: &str = ":";
const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
enum Line {
    /// Regular shell code, indented along with its enclosing block
    Code(String),
    /// Heredoc payload, emitted exactly as declared
    Literal(String),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fragment {
    lines: Vec<Line>,
}

impl Fragment {
    /// Append shell code, one line per line of `text`
    ///
    /// Trailing newlines are dropped. Empty `text` appends nothing.
    pub fn code(&mut self, text: &str) {
        self.lines.extend(
            text.trim_end_matches('\n')
                .lines()
                .map(|line| Line::Code(line.to_string())),
        );
    }

    /// Append one logical line, embedded newlines are kept verbatim
    ///
    /// Only the start of the line is re-indented by guards.
    pub fn line(&mut self, line: String) {
        self.lines.push(Line::Code(line));
    }

    /// Append lines that must never be re-indented
    pub fn literal(&mut self, text: &str) {
        self.lines
            .extend(text.split('\n').map(|line| Line::Literal(line.to_string())));
    }

    pub fn append(&mut self, mut other: Fragment) {
        self.lines.append(&mut other.lines);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Wrap `body` in `if ! <predicate>; then ... fi`
    pub fn guarded(predicate: &str, body: Fragment) -> Fragment {
        let mut guarded = Fragment::default();
        guarded.code(&format!("if ! {predicate}; then"));

        if body.is_empty() {
            guarded.lines.push(Line::Code(format!("{INDENT}{NO_OP}")));
        } else {
            guarded.append(body.indented());
        }

        guarded.code("fi");
        guarded
    }

    fn indented(self) -> Fragment {
        let lines = self
            .lines
            .into_iter()
            .map(|line| match line {
                Line::Code(code) if code.is_empty() => Line::Code(code),
                Line::Code(code) => Line::Code(format!("{INDENT}{code}")),
                literal @ Line::Literal(_) => literal,
            })
            .collect();

        Fragment { lines }
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            match line {
                Line::Code(text) | Line::Literal(text) => f.write_str(text)?,
            }
        }
        Ok(())
    }
}
