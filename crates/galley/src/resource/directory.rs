use super::file::{chmod, required_path};
use super::Origin;
use crate::context::{Block, Context};
use crate::error::CompileError;
use crate::script::Fragment;

/// `mkdir -p`, which needs no guard
#[derive(Debug)]
pub struct Directory {
    origin: Origin,
    body: Context,
    path: Option<String>,
    mode: Option<u32>,
}

impl Directory {
    pub(crate) fn new(origin: Origin, body: Context) -> Self {
        Self {
            origin,
            body,
            path: None,
            mode: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Directory to create, defaults to the label
    pub fn path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    pub fn mode(&mut self, mode: u32) {
        self.mode = Some(mode);
    }

    pub(crate) fn render(&self) -> Result<Fragment, CompileError> {
        let path = required_path(&self.origin, self.path.as_deref())?;

        let mut fragment = self.body.render_body()?;
        fragment.code(&format!("mkdir -p {path}"));
        if let Some(mode) = self.mode {
            fragment.code(&chmod(&self.origin, path, mode)?);
        }
        Ok(fragment)
    }
}

impl Block for Directory {
    fn context(&self) -> &Context {
        &self.body
    }

    fn context_mut(&mut self) -> &mut Context {
        &mut self.body
    }
}

#[cfg(test)]
mod test {
    use crate::context::Block;
    use crate::error::CompileError;
    use crate::recipe::compile;
    use pretty_assertions::assert_eq;

    #[test]
    fn creates_a_directory() {
        let script = compile(|recipe| recipe.directory("/usr/local/bin", |_| {})).unwrap();
        assert_eq!(script, "mkdir -p /usr/local/bin\n");
    }

    #[test]
    fn path_and_mode() {
        let script = compile(|recipe| {
            recipe.directory("binaries", |directory| {
                directory.path("/opt/app/bin");
                directory.mode(0o755);
            });
        })
        .unwrap();
        assert_eq!(script, "mkdir -p /opt/app/bin\nchmod 0755 /opt/app/bin\n");
    }

    #[test]
    fn missing_path() {
        let error = compile(|recipe| recipe.directory("", |_| {})).unwrap_err();
        assert!(matches!(
            error,
            CompileError::MissingRequiredAttribute {
                attribute: "path",
                ..
            }
        ));
    }
}
