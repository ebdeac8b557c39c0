//! recipe files
//!
//! A recipe can be written as one or more HCL documents instead of Rust closures. Each root
//! structure is kept together with the path of the file it came from, in load order, and is
//! declared onto a [Context] through the same verbs a closure would use.
//!
//! String values are hcl templates evaluated with the recipe's node data bound to `node`:
//!
//! ```hcl
//! execute "list" {
//!   command = "ls ${node.dir}"
//! }
//! ```
use crate::context::{Block, Context};
use crate::error::CompileError;
use crate::recipe::Recipe;
use crate::resource::{Directory, Execute, File, Gemfile, Log};
use hcl::eval::Evaluate;
use hcl::Structure;
use std::path::{Path, PathBuf};

#[derive(Default, Debug)]
pub struct RecipeDocuments {
    sources: Vec<Source>,
    structures: Vec<(usize, Structure)>,
}

impl RecipeDocuments {
    /// Append the root structures of a document
    pub fn insert(
        &mut self,
        document: hcl_edit::structure::Body,
        path: impl Into<Option<PathBuf>>,
    ) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        let body = hcl::Body::from(document);
        self.structures
            .extend(body.into_iter().map(|structure| (source_index, structure)));
    }

    pub fn structures(&self) -> impl Iterator<Item = (&Source, &Structure)> {
        self.structures
            .iter()
            .map(|(source_index, structure)| (&self.sources[*source_index], structure))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Declare every root structure onto `context`, in load order
    ///
    /// Problems are not returned here, they surface when `context` renders.
    pub fn declare(&self, context: &mut Context) {
        let mut eval = hcl::eval::Context::new();
        eval.declare_var("node", hcl::Value::from(context.node()));

        for (source, structure) in self.structures() {
            let scope = Scope {
                eval: &eval,
                location: source.as_deref().map_or_else(
                    || "<stdin>".to_string(),
                    |path| path.display().to_string(),
                ),
            };
            scope.structure(context, structure);
        }
    }

    pub fn into_recipe(self) -> Recipe<'static> {
        Recipe::new(move |context| self.declare(context))
    }
}

impl RecipeDocuments {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        self.insert(body, Some(file_path));
        Ok(())
    }

    /// Load every `*galley.hcl` file of a directory, ordered by file name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_recipe_file = dir_entry
                .file_name()
                .to_string_lossy()
                .ends_with("galley.hcl");
            if is_recipe_file {
                file_paths.push(dir_entry.path());
            }
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No recipe files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

impl From<hcl_edit::structure::Body> for RecipeDocuments {
    fn from(value: hcl_edit::structure::Body) -> Self {
        let mut documents = RecipeDocuments::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [RecipeDocuments]
///
/// Create from a single document
/// ```
/// # use galley::recipe_documents;
/// recipe_documents!(r#"execute "list" { command = "ls" }"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use galley::recipe_documents;
/// recipe_documents! {
///   "one.galley.hcl" => "halt_on_failed_command {}",
///   "two.galley.hcl" => r#"directory "/opt/app" {}"#
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use galley::recipe_documents;
/// recipe_documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! recipe_documents {
    // single document without source
    { $expr:expr } => {
        $crate::recipe_documents::RecipeDocuments::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::recipe_documents::RecipeDocuments::default();
        $(
            docs.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;

/// Evaluation state shared by all structures of one document
struct Scope<'a> {
    eval: &'a hcl::eval::Context<'a>,
    location: String,
}

impl Scope<'_> {
    fn structure<T: Declare>(&self, target: &mut T, structure: &Structure) {
        let result = match structure {
            Structure::Attribute(attribute) => self.attribute(target, attribute),
            Structure::Block(block) => target.block(self, block),
        };

        if let Err(reason) = result {
            target.context_mut().defer(CompileError::InvalidDeclaration {
                location: self.location.clone(),
                reason,
            });
        }
    }

    fn body<T: Declare>(&self, target: &mut T, body: &hcl::Body) {
        for structure in body.iter() {
            self.structure(target, structure);
        }
    }

    fn attribute<T: Declare>(&self, target: &mut T, attribute: &hcl::Attribute) -> Result<(), String> {
        let key = attribute.key.as_str();
        let value = attribute
            .expr
            .evaluate(self.eval)
            .map_err(|errors| format!("`{key}`: {errors}"))?;

        match key {
            "echo" => target.echo(string(key, value)?),
            _ => target.attribute(key, value)?,
        }
        Ok(())
    }

    /// Declare a resource block onto `target`
    fn resource<T: Block>(&self, target: &mut T, block: &hcl::Block) -> Result<(), String> {
        let label = block
            .labels
            .first()
            .map(|label| label.as_str().to_string())
            .unwrap_or_default();

        if block.labels.len() > 1 {
            return Err(format!(
                "`{}` takes at most one label",
                block.identifier.as_str()
            ));
        }

        match block.identifier.as_str() {
            "execute" => target.execute(label, |execute| self.body(execute, &block.body)),
            "file" => target.file(label, |file| self.body(file, &block.body)),
            "directory" => target.directory(label, |directory| self.body(directory, &block.body)),
            "gemfile" => target.gemfile(label, |gemfile| self.body(gemfile, &block.body)),
            "log" => target.log(|log| {
                if !label.is_empty() {
                    log.path(label);
                }
                self.body(log, &block.body);
            }),
            "halt_on_failed_command" => {
                if !label.is_empty() || block.body.iter().next().is_some() {
                    return Err(
                        "`halt_on_failed_command` takes no label, attributes or blocks".to_string(),
                    );
                }
                target.halt_on_failed_command();
            }
            other => return Err(format!("unknown block `{other}`")),
        }
        Ok(())
    }
}

/// What a block type accepts inside a recipe file
trait Declare: Block {
    fn attribute(&mut self, key: &str, _value: hcl::Value) -> Result<(), String> {
        Err(format!("unknown attribute `{key}`"))
    }

    fn block(&mut self, scope: &Scope<'_>, block: &hcl::Block) -> Result<(), String> {
        scope.resource(self, block)
    }
}

impl Declare for Context {}

impl Declare for Execute {
    fn attribute(&mut self, key: &str, value: hcl::Value) -> Result<(), String> {
        match key {
            "command" => match value {
                hcl::Value::Array(commands) => {
                    for command in commands {
                        self.command(string(key, command)?);
                    }
                }
                value => self.command(string(key, value)?),
            },
            "cwd" => self.cwd(string(key, value)?),
            "not_if" => self.not_if(string(key, value)?),
            "creates" => self.creates(string(key, value)?),
            _ => return Err(format!("unknown attribute `{key}` in execute")),
        }
        Ok(())
    }
}

impl Declare for File {
    fn attribute(&mut self, key: &str, value: hcl::Value) -> Result<(), String> {
        match key {
            "path" => self.path(string(key, value)?),
            "content" => self.content(string(key, value)?),
            "mode" => self.mode(mode(value)?),
            _ => return Err(format!("unknown attribute `{key}` in file")),
        }
        Ok(())
    }
}

impl Declare for Directory {
    fn attribute(&mut self, key: &str, value: hcl::Value) -> Result<(), String> {
        match key {
            "path" => self.path(string(key, value)?),
            "mode" => self.mode(mode(value)?),
            _ => return Err(format!("unknown attribute `{key}` in directory")),
        }
        Ok(())
    }
}

impl Declare for Log {
    fn attribute(&mut self, key: &str, value: hcl::Value) -> Result<(), String> {
        match key {
            "path" => self.path(string(key, value)?),
            "stdout" => self.stdout(string(key, value)?),
            "stderr" => self.stderr(string(key, value)?),
            _ => return Err(format!("unknown attribute `{key}` in log")),
        }
        Ok(())
    }
}

impl Declare for Gemfile {
    fn attribute(&mut self, key: &str, value: hcl::Value) -> Result<(), String> {
        match key {
            "path" => self.path(string(key, value)?),
            "source" => self.source(string(key, value)?),
            _ => return Err(format!("unknown attribute `{key}` in gemfile")),
        }
        Ok(())
    }

    fn block(&mut self, scope: &Scope<'_>, block: &hcl::Block) -> Result<(), String> {
        if block.identifier.as_str() != "gem" {
            return scope.resource(self, block);
        }

        let [name] = block.labels.as_slice() else {
            return Err("`gem` takes exactly one label, the gem name".to_string());
        };

        let mut version = None;
        for attribute in block.body.attributes() {
            if attribute.key.as_str() != "version" {
                return Err(format!("unknown attribute `{}` in gem", attribute.key.as_str()));
            }
            let value = attribute
                .expr
                .evaluate(scope.eval)
                .map_err(|errors| format!("`version`: {errors}"))?;
            version = Some(string("version", value)?);
        }

        self.gem(name.as_str(), version.as_deref());
        Ok(())
    }
}

fn type_name(value: &hcl::Value) -> &'static str {
    match value {
        hcl::Value::Null => "null",
        hcl::Value::Bool(_) => "bool",
        hcl::Value::Number(_) => "number",
        hcl::Value::String(_) => "string",
        hcl::Value::Array(_) => "list",
        hcl::Value::Object(_) => "object",
    }
}

fn string(key: &str, value: hcl::Value) -> Result<String, String> {
    match value {
        hcl::Value::String(s) => Ok(s),
        other => Err(format!(
            "`{key}` must be a string, found {}",
            type_name(&other)
        )),
    }
}

/// Modes are octal strings such as `"0644"`
fn mode(value: hcl::Value) -> Result<u32, String> {
    let digits = string("mode", value)?;
    u32::from_str_radix(digits.trim_start_matches("0o"), 8)
        .map_err(|_| format!("`mode` must be an octal string, found {digits:?}"))
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::error::CompileError;
    use pretty_assertions::assert_eq;

    fn render(documents: RecipeDocuments) -> Result<String, CompileError> {
        documents.into_recipe().to_script().map(ToString::to_string)
    }

    #[test]
    fn iterators() {
        let documents = recipe_documents! {r#"
        echo = "one"
        halt_on_failed_command {}
        directory "/opt" {}
        log "/tmp/out.log" {}
        "#};

        assert_eq!(documents.structures().count(), 4);
        assert_eq!(documents.source_count(), 1);
    }

    #[test]
    fn declaration_order_is_kept() {
        let documents = recipe_documents! {r#"
        halt_on_failed_command {}
        directory "/opt/app" { mode = "0755" }
        echo = "done"
        log {
          stdout = "out.log"
        }
        "#};

        assert_eq!(
            render(documents).unwrap(),
            "set -e\n\nmkdir -p /opt/app\nchmod 0755 /opt/app\n\necho 'done'\n\nexec 1>out.log\n"
        );
    }

    #[test]
    fn multiple_documents_in_load_order() {
        let documents = recipe_documents! {
            "a.galley.hcl" => r#"log "/var/log/setup.log" {}"#,
            "b.galley.hcl" => r#"execute "list" { command = ["ls", "ls -a"] }"#
        };

        assert_eq!(
            render(documents).unwrap(),
            "exec 1>/var/log/setup.log 2>&1\n\nls\nls -a\n"
        );
    }

    #[test]
    fn templates_see_node_data() {
        let documents = recipe_documents! {r#"
        execute "run a command" {
          command = "ls ${node.dir}"
        }
        "#};

        let mut recipe = documents.into_recipe();
        recipe.set_node([("dir", "/home")]);
        assert_eq!(recipe.to_script().unwrap(), "ls /home\n");
    }

    #[test]
    fn gemfile_blocks() {
        let documents = recipe_documents! {r#"
        gemfile "/data/projects/foo" {
          gem "rails" { version = "2.3.2" }
          gem "rack" {}
          source = "http://gems.example.com/"
        }
        "#};

        assert_eq!(
            render(documents).unwrap(),
            r#"if ! test -e /data/projects/foo/Gemfile; then
  cat <<'GALLEY_EOF' > /data/projects/foo/Gemfile
source "http://gems.example.com/"

gem "rack"
gem "rails", "2.3.2"
GALLEY_EOF
fi
"#
        );
    }

    #[test]
    fn nested_blocks_and_echo_attributes() {
        let documents = recipe_documents! {r#"
        execute "setup" {
          creates = "/srv/app"
          echo = "setting up"
          directory "/srv/app" {}
        }
        "#};

        assert_eq!(
            render(documents).unwrap(),
            "if ! test -e /srv/app; then\n  echo 'setting up'\n  mkdir -p /srv/app\nfi\n"
        );
    }

    #[test]
    fn unknown_block_is_reported_with_location() {
        let documents = recipe_documents! {
            "broken.galley.hcl" => r#"service "nginx" {}"#
        };

        assert_eq!(
            render(documents).unwrap_err(),
            CompileError::InvalidDeclaration {
                location: "broken.galley.hcl".to_string(),
                reason: "unknown block `service`".to_string(),
            }
        );
    }

    #[test]
    fn halt_on_failed_command_rejects_a_body() {
        let documents = recipe_documents! {
            "halt.galley.hcl" => r#"
            halt_on_failed_command {
              command = "rm -rf /"
              echo    = "hi"
              bogus   = 1
            }
            "#
        };

        assert_eq!(
            render(documents).unwrap_err(),
            CompileError::InvalidDeclaration {
                location: "halt.galley.hcl".to_string(),
                reason: "`halt_on_failed_command` takes no label, attributes or blocks".to_string(),
            }
        );
    }

    #[test]
    fn halt_on_failed_command_rejects_a_label() {
        let documents = recipe_documents! {r#"halt_on_failed_command "now" {}"#};
        assert!(matches!(
            render(documents).unwrap_err(),
            CompileError::InvalidDeclaration { .. }
        ));
    }

    #[test]
    fn wrong_value_type_is_reported() {
        let documents = recipe_documents! {r#"
        file "/etc/motd" { content = 42 }
        "#};

        let error = render(documents).unwrap_err();
        assert_eq!(
            error.to_string(),
            "<stdin>: `content` must be a string, found number"
        );
    }

    #[test]
    fn invalid_mode_is_reported() {
        let documents = recipe_documents! {r#"
        directory "/opt" { mode = "rwx" }
        "#};

        assert!(matches!(
            render(documents).unwrap_err(),
            CompileError::InvalidDeclaration { .. }
        ));
    }
}
