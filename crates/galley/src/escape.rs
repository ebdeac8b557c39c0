//! shell quoting helpers
//!
//! Everything a resource emits that did not come verbatim from the recipe author passes through
//! one of these functions.

/// Sentinel closing every heredoc written by `galley`
pub const HEREDOC_TAG: &str = "GALLEY_EOF";

/// Quote `s` as a single shell word
///
/// Embedded single quotes close the quoted string, emit a double-quoted `'` and reopen it.
///
/// ```
/// # use galley::escape::single_quote;
/// assert_eq!(single_quote("I'm here"), r#"'I'"'"'m here'"#);
/// assert_eq!(single_quote(""), "''");
/// ```
pub fn single_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str(r#"'"'"'"#);
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Quoted here-document carrying `content` without any shell expansion
///
/// The operator (`<<'GALLEY_EOF'`) and the payload are kept apart so callers can place
/// redirections between them: `cat <<'GALLEY_EOF' > path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heredoc<'a> {
    /// `None` when there is nothing to write
    payload: Option<&'a str>,
}

impl<'a> Heredoc<'a> {
    pub fn operator(&self) -> String {
        format!("<<'{HEREDOC_TAG}'")
    }

    /// Payload lines followed by the closing tag line, without a trailing newline
    pub fn body(&self) -> String {
        match self.payload {
            Some(payload) => format!("{payload}\n{HEREDOC_TAG}"),
            None => HEREDOC_TAG.to_string(),
        }
    }
}

impl std::fmt::Display for Heredoc<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.operator())?;
        writeln!(f, "{}", self.body())
    }
}

/// `content` would terminate the heredoc early
#[derive(Debug, Clone, PartialEq)]
pub struct TagCollision;

/// Prepare `content` for embedding in a quoted heredoc
///
/// A single trailing newline is absorbed, the heredoc terminates the last line itself. Empty
/// content has no payload lines, so the file written is empty. Content with a line equal to
/// [HEREDOC_TAG] cannot be embedded.
pub fn heredoc(content: &str) -> Result<Heredoc<'_>, TagCollision> {
    if content.is_empty() {
        return Ok(Heredoc { payload: None });
    }

    let payload = content.strip_suffix('\n').unwrap_or(content);
    if payload.split('\n').any(|line| line == HEREDOC_TAG) {
        return Err(TagCollision);
    }

    Ok(Heredoc {
        payload: Some(payload),
    })
}

/// Largest permission value `chmod` accepts in octal form
pub const MAX_MODE: u32 = 0o7777;

/// Format a permission value as 4 zero-padded octal digits
///
/// Returns `None` for values above [MAX_MODE].
pub fn octal_mode(mode: u32) -> Option<String> {
    (mode <= MAX_MODE).then(|| format!("{mode:04o}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal POSIX word parser for single-quoted and double-quoted segments
    fn shell_unquote(word: &str) -> String {
        let mut out = String::new();
        let mut chars = word.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => out.extend(chars.by_ref().take_while(|c| *c != '\'')),
                '"' => out.extend(chars.by_ref().take_while(|c| *c != '"')),
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn single_quote_round_trips() {
        for input in [
            "",
            "plain",
            "I'm in bash!",
            "'",
            "''''",
            "$HOME `date` \\ \"double\"",
            "tab\tnew\nline",
        ] {
            assert_eq!(shell_unquote(&single_quote(input)), input, "{input:?}");
        }
    }

    #[test]
    fn single_quote_escapes_each_quote() {
        assert_eq!(single_quote("a'b'c"), r#"'a'"'"'b'"'"'c'"#);
    }

    #[test]
    fn heredoc_layout() {
        let doc = heredoc("export PATH=~/bin:$PATH").unwrap();
        assert_eq!(doc.operator(), "<<'GALLEY_EOF'");
        assert_eq!(
            doc.to_string(),
            "<<'GALLEY_EOF'\nexport PATH=~/bin:$PATH\nGALLEY_EOF\n"
        );
    }

    #[test]
    fn heredoc_absorbs_one_trailing_newline() {
        assert_eq!(heredoc("a\nb\n").unwrap().body(), "a\nb\nGALLEY_EOF");
        assert_eq!(heredoc("a\n\n").unwrap().body(), "a\n\nGALLEY_EOF");
        assert_eq!(heredoc("\n").unwrap().body(), "\nGALLEY_EOF");
        assert_eq!(heredoc("").unwrap().body(), "GALLEY_EOF");
    }

    #[test]
    fn heredoc_rejects_tag_line() {
        assert_eq!(heredoc("one\nGALLEY_EOF\ntwo"), Err(TagCollision));
        // only a whole line collides
        assert!(heredoc("echo GALLEY_EOF").is_ok());
    }

    #[test]
    fn octal_modes() {
        assert_eq!(octal_mode(0o644).as_deref(), Some("0644"));
        assert_eq!(octal_mode(0o7).as_deref(), Some("0007"));
        assert_eq!(octal_mode(0o4755).as_deref(), Some("4755"));
        assert_eq!(octal_mode(0o10000), None);
    }
}
