//! # galley - setup recipes compiled to shell
//!
//! `galley` turns a tree of declarations ("resources") into a single POSIX shell script.
//! It never runs the script.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `galley` works internally.
//!
//! ### Terms
//!
//! - a **resource** is one unit of intent: run commands, create a file, create a directory,
//!   redirect output, stop on errors, print a message, write a Gemfile
//! - a **block** is the closure configuring a resource. It receives the resource's builder
//! - a **context** ([context::Context]) holds the resources declared by one block, in order
//! - a **recipe** ([recipe::Recipe]) is the root context plus the node data
//! - **node data** ([node::NodeData]) is configuration injected by the caller
//! - a **guard** wraps a body in `if ! <test>; then ... fi` so the script can run repeatedly
//!
//! ```
//! use galley::prelude::*;
//!
//! let script = galley::compile(|recipe| {
//!     recipe.execute("bundle some project", |execute| {
//!         execute.creates("/data/projects/foo/vendor");
//!         execute.cwd("/data/projects/foo");
//!         execute.command("gem bundle");
//!     });
//!     recipe.directory("/usr/local/bin", |_| {});
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     script,
//!     "if ! test -e /data/projects/foo/vendor; then\n  cd /data/projects/foo\n  gem bundle\nfi\n\nmkdir -p /usr/local/bin\n"
//! );
//! ```
//!
//! ### Evaluation
//!
//! Compilation has two phases.
//!
//! 1. The recipe's block runs against a fresh [context::Context]. Every verb of
//!    [context::Block] creates a builder with its own nested context, runs the nested block on
//!    it and appends the finished resource to the parent. Nothing is rendered yet.
//! 2. The root context renders. Each resource turns into a [script::Fragment], top level
//!    fragments are separated by one blank line.
//!
//! Nested blocks only receive an [context::Env]: node data and the helpers defined by their
//! ancestors so far. Attributes such as `cwd` live on the builder, so they can't leak into
//! siblings.
//!
//! ### Quoting
//!
//! Messages are single quoted ([escape::single_quote]) and file content is written through a
//! quoted heredoc ([escape::heredoc]), so neither is expanded by the shell. Paths and commands
//! are emitted as authored, letting `~` and variables expand.
//!
//! ### Errors
//!
//! Conflicting or missing attributes are reported as [error::CompileError] while rendering.
//! The first error aborts compilation, no partial script is returned.
//!
//! ### Recipe files
//!
//! [recipe_documents::RecipeDocuments] loads HCL documents and declares their blocks through
//! the same verbs. Strings are hcl templates with node data bound to `node`.
//!
pub mod context;
pub mod error;
pub mod escape;
pub mod node;
pub mod recipe;
pub mod recipe_documents;
pub mod resource;
pub mod script;

pub use recipe::compile;

/// Everything needed to write recipes in Rust
pub mod prelude {
    pub use crate::context::{Block, Context};
    pub use crate::error::CompileError;
    pub use crate::node::{NodeData, Value};
    pub use crate::recipe::Recipe;
    pub use crate::resource::{Content, Directory, Execute, File, Gemfile, Log};
}
