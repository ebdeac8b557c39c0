use super::Origin;
use crate::context::{Block, Context, Env};
use crate::error::CompileError;
use crate::escape::{self, HEREDOC_TAG};
use crate::node::NodeData;
use crate::script::Fragment;

/// Create a file unless it already exists
#[derive(Debug)]
pub struct File {
    origin: Origin,
    body: Context,
    path: Option<String>,
    content: Option<String>,
    content_block: Option<String>,
    mode: Option<u32>,
}

impl File {
    pub(crate) fn new(origin: Origin, body: Context) -> Self {
        Self {
            origin,
            body,
            path: None,
            content: None,
            content_block: None,
            mode: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Where to create the file, defaults to the label
    pub fn path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Write exactly `content`, without any shell expansion
    pub fn content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// Write the lines produced by `block`
    pub fn content_with(&mut self, block: impl FnOnce(&mut Content)) {
        let mut content = Content {
            env: self.body.env().clone(),
            lines: vec![],
        };
        block(&mut content);
        self.content_block = Some(content.lines.join("\n"));
    }

    pub fn mode(&mut self, mode: u32) {
        self.mode = Some(mode);
    }

    /// Content and nested declarations exclude each other, echoes aside
    fn declared_content(&self) -> Result<Option<&str>, CompileError> {
        let content = match (&self.content, &self.content_block) {
            (Some(_), Some(_)) => return Err(self.conflict("content", "content_with")),
            (Some(content), None) => Some((content.as_str(), "content")),
            (None, Some(content)) => Some((content.as_str(), "content_with")),
            (None, None) => None,
        };

        match content {
            Some((_, attribute)) if self.body.has_declarations() => {
                Err(self.conflict(attribute, NESTED_DECLARATIONS))
            }
            content => Ok(content.map(|(content, _)| content)),
        }
    }

    fn conflict(&self, first: &'static str, second: &'static str) -> CompileError {
        CompileError::DeclarationConflict {
            origin: self.origin.clone(),
            first,
            second,
        }
    }

    pub(crate) fn render(&self) -> Result<Fragment, CompileError> {
        let path = required_path(&self.origin, self.path.as_deref())?;
        let content = self.declared_content()?;

        let mut body = self.body.render_body()?;
        match content {
            Some(content) => body.append(write_file(&self.origin, path, content)?),
            None => body.code(&format!("touch {path}")),
        }
        if let Some(mode) = self.mode {
            body.code(&chmod(&self.origin, path, mode)?);
        }

        Ok(Fragment::guarded(&format!("test -e {path}"), body))
    }
}

impl Block for File {
    fn context(&self) -> &Context {
        &self.body
    }

    fn context_mut(&mut self) -> &mut Context {
        &mut self.body
    }
}

/// Line oriented file content
pub struct Content {
    env: Env,
    lines: Vec<String>,
}

impl Content {
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn node(&self) -> &NodeData {
        self.env.node()
    }
}

/// Stands for a block's resources in conflict reports
pub(crate) const NESTED_DECLARATIONS: &str = "nested declarations";

/// The declared path, falling back to the label
pub(crate) fn required_path<'a>(
    origin: &'a Origin,
    path: Option<&'a str>,
) -> Result<&'a str, CompileError> {
    path.or_else(|| (!origin.label.is_empty()).then_some(origin.label.as_str()))
        .ok_or_else(|| CompileError::MissingRequiredAttribute {
            origin: origin.clone(),
            attribute: "path",
        })
}

/// `cat` a quoted heredoc into `path`
pub(crate) fn write_file(
    origin: &Origin,
    path: &str,
    content: &str,
) -> Result<Fragment, CompileError> {
    let heredoc =
        escape::heredoc(content).map_err(|_| CompileError::UnsafeContentCollision {
            origin: origin.clone(),
            tag: HEREDOC_TAG,
        })?;

    let mut fragment = Fragment::default();
    fragment.code(&format!("cat {} > {path}", heredoc.operator()));
    fragment.literal(&heredoc.body());
    Ok(fragment)
}

pub(crate) fn chmod(origin: &Origin, path: &str, mode: u32) -> Result<String, CompileError> {
    let mode = escape::octal_mode(mode).ok_or_else(|| CompileError::InvalidMode {
        origin: origin.clone(),
        mode,
    })?;
    Ok(format!("chmod {mode} {path}"))
}
