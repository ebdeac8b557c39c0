use crate::resource::Origin;

/// Reasons a recipe cannot be compiled
///
/// All of them are detected while rendering. The first one found aborts compilation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{origin}: `{first}` and `{second}` cannot be declared together")]
    DeclarationConflict {
        origin: Origin,
        first: &'static str,
        second: &'static str,
    },
    #[error("{origin}: `{attribute}` is required")]
    MissingRequiredAttribute {
        origin: Origin,
        attribute: &'static str,
    },
    #[error("{origin}: content contains a line equal to the heredoc tag `{tag}`")]
    UnsafeContentCollision { origin: Origin, tag: &'static str },
    #[error("{origin}: mode {mode:o} is not a valid permission value")]
    InvalidMode { origin: Origin, mode: u32 },
    #[error("{scope}: no helper named `{name}` is defined for this kind of block")]
    UnknownHelper { scope: String, name: String },
    #[error("{location}: {reason}")]
    InvalidDeclaration { location: String, reason: String },
}
