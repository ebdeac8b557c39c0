//! declared units of shell script intent
//!
//! Every resource renders to a [Fragment]. Resources are built by the verbs of
//! [Block](crate::context::Block) and never change once their block returned.
mod directory;
mod echo;
mod execute;
mod file;
mod gemfile;
mod log;

pub use directory::Directory;
pub use echo::Echo;
pub use execute::Execute;
pub use file::{Content, File};
pub use gemfile::{Gem, Gemfile};
pub use log::Log;

use crate::error::CompileError;
use crate::script::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Execute,
    File,
    Directory,
    Log,
    HaltOnFailedCommand,
    Echo,
    Gemfile,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Execute => f.write_str("execute"),
            ResourceKind::File => f.write_str("file"),
            ResourceKind::Directory => f.write_str("directory"),
            ResourceKind::Log => f.write_str("log"),
            ResourceKind::HaltOnFailedCommand => f.write_str("halt_on_failed_command"),
            ResourceKind::Echo => f.write_str("echo"),
            ResourceKind::Gemfile => f.write_str("gemfile"),
        }
    }
}

/// Where a resource was declared
///
/// `position` is the index among the resources declared in the same block. The label is for
/// humans only, it never ends up in the script.
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Origin {
    pub kind: ResourceKind,
    pub label: String,
    pub position: usize,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "{} (#{})", self.kind, self.position)
        } else {
            write!(f, "{} {:?} (#{})", self.kind, self.label, self.position)
        }
    }
}

#[derive(Debug)]
pub enum Resource {
    Execute(Execute),
    File(File),
    Directory(Directory),
    Log(Log),
    HaltOnFailedCommand(Origin),
    Echo(Echo),
    Gemfile(Gemfile),
}

impl Resource {
    pub fn origin(&self) -> &Origin {
        match self {
            Resource::Execute(execute) => execute.origin(),
            Resource::File(file) => file.origin(),
            Resource::Directory(directory) => directory.origin(),
            Resource::Log(log) => log.origin(),
            Resource::HaltOnFailedCommand(origin) => origin,
            Resource::Echo(echo) => echo.origin(),
            Resource::Gemfile(gemfile) => gemfile.origin(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.origin().kind
    }

    #[tracing::instrument(level = "trace", skip_all, fields(origin = %self.origin()))]
    pub fn render(&self) -> Result<Fragment, CompileError> {
        let fragment = match self {
            Resource::Execute(execute) => execute.render()?,
            Resource::File(file) => file.render()?,
            Resource::Directory(directory) => directory.render()?,
            Resource::Log(log) => log.render()?,
            Resource::HaltOnFailedCommand(_) => {
                let mut fragment = Fragment::default();
                fragment.code("set -e");
                fragment
            }
            Resource::Echo(echo) => echo.render(),
            Resource::Gemfile(gemfile) => gemfile.render()?,
        };

        tracing::trace!(%fragment, "rendered");
        Ok(fragment)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn origin_display() {
        let labelled = Origin::new(ResourceKind::Execute, "say the date".into(), 2);
        assert_eq!(labelled.to_string(), r#"execute "say the date" (#2)"#);

        let unlabelled = Origin::new(ResourceKind::Log, String::new(), 0);
        assert_eq!(unlabelled.to_string(), "log (#0)");
    }
}
