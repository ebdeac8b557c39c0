use super::Origin;
use crate::context::{Block, Context};
use crate::error::CompileError;
use crate::script::Fragment;

/// Run shell commands, optionally from another directory and only when a guard fails
#[derive(Debug)]
pub struct Execute {
    origin: Origin,
    body: Context,
    cwd: Option<String>,
    not_if: Option<String>,
    creates: Option<String>,
}

impl Execute {
    pub(crate) fn new(origin: Origin, body: Context) -> Self {
        Self {
            origin,
            body,
            cwd: None,
            not_if: None,
            creates: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Append a command; multi-line strings become one line each
    pub fn command(&mut self, command: impl Into<String>) {
        self.body.push_command(command.into());
    }

    /// Change directory before everything else this block declares
    ///
    /// Applies to the whole block, including commands declared before this call.
    pub fn cwd(&mut self, cwd: impl Into<String>) {
        self.cwd = Some(cwd.into());
    }

    /// Skip the block when the shell test `condition` succeeds
    ///
    /// Takes precedence over [Execute::creates].
    pub fn not_if(&mut self, condition: impl Into<String>) {
        self.not_if = Some(condition.into());
    }

    /// Skip the block when `path` exists
    pub fn creates(&mut self, path: impl Into<String>) {
        self.creates = Some(path.into());
    }

    fn guard(&self) -> Option<String> {
        self.not_if
            .clone()
            .or_else(|| self.creates.as_ref().map(|path| format!("test -e {path}")))
    }

    pub(crate) fn render(&self) -> Result<Fragment, CompileError> {
        let mut body = Fragment::default();
        if let Some(cwd) = &self.cwd {
            body.code(&format!("cd {cwd}"));
        }
        body.append(self.body.render_body()?);

        Ok(match self.guard() {
            Some(predicate) => Fragment::guarded(&predicate, body),
            None => body,
        })
    }
}

impl Block for Execute {
    fn context(&self) -> &Context {
        &self.body
    }

    fn context_mut(&mut self) -> &mut Context {
        &mut self.body
    }
}
