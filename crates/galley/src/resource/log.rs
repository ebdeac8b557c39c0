use super::Origin;
use crate::context::{Block, Context};
use crate::error::CompileError;
use crate::script::Fragment;

/// Redirect the output of the rest of the script
///
/// Either both streams go to one `path`, or `stdout` and `stderr` are set individually.
#[derive(Debug)]
pub struct Log {
    origin: Origin,
    body: Context,
    path: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
}

impl Log {
    pub(crate) fn new(origin: Origin, body: Context) -> Self {
        Self {
            origin,
            body,
            path: None,
            stdout: None,
            stderr: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Send stdout and stderr to `path`
    pub fn path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    pub fn stdout(&mut self, path: impl Into<String>) {
        self.stdout = Some(path.into());
    }

    pub fn stderr(&mut self, path: impl Into<String>) {
        self.stderr = Some(path.into());
    }

    fn redirect(&self) -> Result<String, CompileError> {
        match (&self.path, &self.stdout, &self.stderr) {
            (Some(_), Some(_), _) => Err(self.conflict("stdout")),
            (Some(_), _, Some(_)) => Err(self.conflict("stderr")),
            (Some(path), None, None) => Ok(format!("exec 1>{path} 2>&1")),
            (None, None, None) => Err(CompileError::MissingRequiredAttribute {
                origin: self.origin.clone(),
                attribute: "path",
            }),
            (None, stdout, stderr) => {
                let mut redirect = String::from("exec");
                if let Some(stdout) = stdout {
                    redirect.push_str(&format!(" 1>{stdout}"));
                }
                if let Some(stderr) = stderr {
                    redirect.push_str(&format!(" 2>{stderr}"));
                }
                Ok(redirect)
            }
        }
    }

    fn conflict(&self, stream: &'static str) -> CompileError {
        CompileError::DeclarationConflict {
            origin: self.origin.clone(),
            first: "path",
            second: stream,
        }
    }

    pub(crate) fn render(&self) -> Result<Fragment, CompileError> {
        let redirect = self.redirect()?;
        let mut fragment = self.body.render_body()?;
        fragment.code(&redirect);
        Ok(fragment)
    }
}

impl Block for Log {
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
    fn logs_to_a_file() {
        let script = compile(|recipe| recipe.log_to("~/script.log")).unwrap();
        assert_eq!(script, "exec 1>~/script.log 2>&1\n");
    }

    #[test]
    fn stdout_only() {
        let script = compile(|recipe| recipe.log(|log| log.stdout("stdout.log"))).unwrap();
        assert_eq!(script, "exec 1>stdout.log\n");
    }

    #[test]
    fn stdout_and_stderr() {
        let script = compile(|recipe| {
            recipe.log(|log| {
                log.stdout("stdout.log");
                log.stderr("stderr.log");
            });
        })
        .unwrap();
        assert_eq!(script, "exec 1>stdout.log 2>stderr.log\n");
    }

    #[test]
    fn stderr_only() {
        let script = compile(|recipe| recipe.log(|log| log.stderr("stderr.log"))).unwrap();
        assert_eq!(script, "exec 2>stderr.log\n");
    }

    #[test]
    fn combined_and_split_forms_conflict() {
        let error = compile(|recipe| {
            recipe.log(|log| {
                log.path("all.log");
                log.stderr("stderr.log");
            });
        })
        .unwrap_err();
        assert!(matches!(
            error,
            CompileError::DeclarationConflict {
                first: "path",
                second: "stderr",
                ..
            }
        ));
    }

    #[test]
    fn combined_form_and_stdout_conflict() {
        let error = compile(|recipe| {
            recipe.log(|log| {
                log.stdout("stdout.log");
                log.path("all.log");
            });
        })
        .unwrap_err();
        assert!(matches!(
            error,
            CompileError::DeclarationConflict {
                first: "path",
                second: "stdout",
                ..
            }
        ));
    }

    #[test]
    fn nothing_to_redirect() {
        let error = compile(|recipe| recipe.log(|_| {})).unwrap_err();
        assert!(matches!(
            error,
            CompileError::MissingRequiredAttribute { .. }
        ));
    }
}
