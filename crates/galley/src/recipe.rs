//! root of a declaration tree
use crate::context::Context;
use crate::error::CompileError;
use crate::node::NodeData;
use std::cell::OnceCell;

/// A declaration block plus the node data it will see
///
/// The block does not run until [Recipe::to_script] is called for the first time. Node data
/// set before that is what the block observes. The script is computed at most once, later
/// changes to the node data do not affect it.
///
/// `Recipe` is not `Sync`, so one instance can't be compiled from several threads at once.
pub struct Recipe<'a> {
    node: NodeData,
    block: Box<dyn Fn(&mut Context) + 'a>,
    script: OnceCell<Result<String, CompileError>>,
}

impl<'a> Recipe<'a> {
    pub fn new(block: impl Fn(&mut Context) + 'a) -> Self {
        Self {
            node: Default::default(),
            block: Box::new(block),
            script: OnceCell::new(),
        }
    }

    pub fn node(&self) -> &NodeData {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut NodeData {
        &mut self.node
    }

    /// Replace the node data
    pub fn set_node(&mut self, node: impl Into<NodeData>) {
        self.node = node.into();
    }

    /// Run the block against the current node data
    ///
    /// Yields the declaration tree without rendering it. Not cached.
    pub fn evaluate(&self) -> Context {
        let mut context = Context::new(self.node.clone());
        (self.block)(&mut context);
        tracing::debug!(resources = context.resources().count(), "recipe evaluated");
        context
    }

    /// The compiled script
    pub fn to_script(&self) -> Result<&str, CompileError> {
        self.script
            .get_or_init(|| self.evaluate().render())
            .as_deref()
            .map_err(Clone::clone)
    }
}

/// Compile `block` with empty node data
pub fn compile(block: impl FnOnce(&mut Context)) -> Result<String, CompileError> {
    let mut context = Context::new(NodeData::default());
    block(&mut context);
    context.render()
}
