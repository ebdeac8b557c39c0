use super::file::{required_path, write_file, NESTED_DECLARATIONS};
use super::Origin;
use crate::context::{Block, Context};
use crate::error::CompileError;
use crate::script::Fragment;

/// One `gem` line of a manifest
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Gem {
    pub name: String,
    pub version: Option<String>,
}

/// Bundler manifest written to `<path>/Gemfile` unless one exists
#[derive(Debug)]
pub struct Gemfile {
    origin: Origin,
    body: Context,
    path: Option<String>,
    gems: Vec<Gem>,
    source: Option<String>,
}

impl Gemfile {
    pub(crate) fn new(origin: Origin, body: Context) -> Self {
        Self {
            origin,
            body,
            path: None,
            gems: vec![],
            source: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Directory housing the manifest, defaults to the label
    pub fn path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    pub fn gem<'v>(&mut self, name: impl Into<String>, version: impl Into<Option<&'v str>>) {
        let version = version.into().map(str::to_string);
        self.gems.push(Gem::new(name.into(), version));
    }

    pub fn source(&mut self, url: impl Into<String>) {
        self.source = Some(url.into());
    }

    pub fn gems(&self) -> &[Gem] {
        &self.gems
    }

    /// Manifest text, entries sorted by name
    ///
    /// Versions of versioned entries are aligned to the same column.
    fn manifest(&self) -> String {
        let mut gems: Vec<&Gem> = self.gems.iter().collect();
        gems.sort_by(|a, b| a.name.cmp(&b.name));

        let width = gems
            .iter()
            .filter(|gem| gem.version.is_some())
            .map(|gem| gem.name.len() + 3)
            .max()
            .unwrap_or_default();

        let mut manifest = String::new();
        if let Some(source) = &self.source {
            manifest.push_str(&format!("source \"{source}\"\n"));
            if !gems.is_empty() {
                manifest.push('\n');
            }
        }

        for gem in gems {
            let name = format!("\"{}\"", gem.name);
            match &gem.version {
                Some(version) => {
                    let entry = format!("{name},");
                    manifest.push_str(&format!("gem {entry:<width$} \"{version}\"\n"));
                }
                None => {
                    manifest.push_str(&format!("gem {name}\n"));
                }
            }
        }

        manifest
    }

    pub(crate) fn render(&self) -> Result<Fragment, CompileError> {
        let directory = required_path(&self.origin, self.path.as_deref())?;
        let path = format!("{}/Gemfile", directory.trim_end_matches('/'));

        if !self.gems.is_empty() && self.body.has_declarations() {
            return Err(CompileError::DeclarationConflict {
                origin: self.origin.clone(),
                first: "gem",
                second: NESTED_DECLARATIONS,
            });
        }

        let mut body = self.body.render_body()?;
        body.append(write_file(&self.origin, &path, &self.manifest())?);

        Ok(Fragment::guarded(&format!("test -e {path}"), body))
    }
}

impl Block for Gemfile {
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
    fn creates_a_gemfile_sorted_by_name() {
        let script = compile(|recipe| {
            recipe.gemfile("/data/projects/foo", |gemfile| {
                gemfile.gem("rails", "2.3.2");
                gemfile.gem("rack", "1.0.0");
            });
        })
        .unwrap();

        assert_eq!(
            script,
            r#"if ! test -e /data/projects/foo/Gemfile; then
  cat <<'GALLEY_EOF' > /data/projects/foo/Gemfile
gem "rack",  "1.0.0"
gem "rails", "2.3.2"
GALLEY_EOF
fi
"#
        );
    }

    #[test]
    fn can_have_sources() {
        let script = compile(|recipe| {
            recipe.gemfile("/data/projects/foo", |gemfile| {
                gemfile.gem("rails", None);
                gemfile.source("http://gems.example.com/");
            });
        })
        .unwrap();

        assert_eq!(
            script,
            r#"if ! test -e /data/projects/foo/Gemfile; then
  cat <<'GALLEY_EOF' > /data/projects/foo/Gemfile
source "http://gems.example.com/"

gem "rails"
GALLEY_EOF
fi
"#
        );
    }

    #[test]
    fn equal_names_keep_declaration_order() {
        let script = compile(|recipe| {
            recipe.gemfile("/app/", |gemfile| {
                gemfile.gem("rspec", None);
                gemfile.gem("rake", "13.0");
                gemfile.gem("rake", "12.3");
            });
        })
        .unwrap();

        assert_eq!(
            script,
            r#"if ! test -e /app/Gemfile; then
  cat <<'GALLEY_EOF' > /app/Gemfile
gem "rake", "13.0"
gem "rake", "12.3"
gem "rspec"
GALLEY_EOF
fi
"#
        );
    }

    #[test]
    fn gems_and_nested_declarations_conflict() {
        let error = compile(|recipe| {
            recipe.gemfile("/app", |gemfile| {
                gemfile.echo("writing the manifest");
                gemfile.gem("rails", None);
                gemfile.execute("bundle", |execute| execute.command("bundle install"));
            });
        })
        .unwrap_err();

        assert!(matches!(
            error,
            CompileError::DeclarationConflict {
                first: "gem",
                second: "nested declarations",
                ..
            }
        ));
    }

    #[test]
    fn empty_manifest() {
        let script = compile(|recipe| recipe.gemfile("/app", |_| {})).unwrap();
        assert_eq!(
            script,
            "if ! test -e /app/Gemfile; then\n  cat <<'GALLEY_EOF' > /app/Gemfile\nGALLEY_EOF\nfi\n"
        );
    }
}
