use super::Origin;
use crate::escape::single_quote;
use crate::script::Fragment;

/// Print a message, quoted so it is never expanded
#[derive(Debug, derive_new::new)]
pub struct Echo {
    origin: Origin,
    message: String,
}

impl Echo {
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn render(&self) -> Fragment {
        let mut fragment = Fragment::default();
        fragment.line(format!("echo {}", single_quote(&self.message)));
        fragment
    }
}

#[cfg(test)]
mod test {
    use crate::context::Block;
    use crate::recipe::compile;
    use pretty_assertions::assert_eq;

    #[test]
    fn echoes_the_given_string() {
        let script = compile(|recipe| recipe.echo("I'm in bash!")).unwrap();
        assert_eq!(script, "echo 'I'\"'\"'m in bash!'\n");
    }

    #[test]
    fn expansion_is_suppressed() {
        let script = compile(|recipe| recipe.echo("$HOME `date`")).unwrap();
        assert_eq!(script, "echo '$HOME `date`'\n");
    }

    #[test]
    fn multiline_message_is_not_reindented() {
        let script = compile(|recipe| {
            recipe.execute("guarded", |execute| {
                execute.creates("/tmp/x");
                execute.echo("one\n  two");
            });
        })
        .unwrap();
        assert_eq!(script, "if ! test -e /tmp/x; then\n  echo 'one\n  two'\nfi\n");
    }
}
