//! declaration blocks
//!
//! A [Context] collects the resources declared by one block, in declaration order. Every
//! resource builder owns a nested [Context] for its own block, so the result is a tree with a
//! single owner per node.
//!
//! Blocks never see their parent's [Context]. What flows downwards is an [Env]: the node data
//! and the helpers that were defined by enclosing blocks before the nested block was declared.
use crate::error::CompileError;
use crate::node::NodeData;
use crate::resource::{
    Directory, Echo, Execute, File, Gemfile, Log, Origin, Resource, ResourceKind,
};
use crate::script::Fragment;
use std::any::{Any, TypeId};
use std::rc::Rc;

/// A named verb usable inside blocks of builder type `T`
pub type Helper<T> = Rc<dyn Fn(&mut T, &str)>;

type Helpers = indexmap::IndexMap<(String, TypeId), Rc<dyn Any>>;

fn lookup<T: 'static>(helpers: &Helpers, name: &str) -> Option<Helper<T>> {
    helpers
        .get(&(name.to_string(), TypeId::of::<T>()))
        .and_then(|helper| helper.downcast_ref::<Helper<T>>())
        .cloned()
}

struct Frame {
    helpers: Helpers,
    parent: Option<Rc<Frame>>,
}

/// Read-only environment handed from a block to the blocks nested in it
#[derive(Clone)]
pub struct Env {
    node: Rc<NodeData>,
    frame: Option<Rc<Frame>>,
}

impl Env {
    pub fn new(node: NodeData) -> Self {
        Self {
            node: Rc::new(node),
            frame: None,
        }
    }

    pub fn node(&self) -> &NodeData {
        &self.node
    }

    fn helper<T: 'static>(&self, name: &str) -> Option<Helper<T>> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some(helper) = lookup::<T>(&current.helpers, name) {
                return Some(helper);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    fn helper_names(&self) -> Vec<&str> {
        let mut names = vec![];
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            names.extend(current.helpers.keys().map(|(name, _)| name.as_str()));
            frame = current.parent.as_deref();
        }
        names
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("node", &self.node)
            .field("helpers", &self.helper_names())
            .finish()
    }
}

#[derive(Debug)]
pub(crate) enum Child {
    Resource(Resource),
    /// Shell code declared by an [Execute] block
    Command(String),
}

pub struct Context {
    /// `None` for the root of a recipe
    owner: Option<Origin>,
    env: Env,
    helpers: Helpers,
    children: Vec<Child>,
    deferred: Option<CompileError>,
}

impl Context {
    /// Root context of a recipe
    pub fn new(node: NodeData) -> Self {
        Self::with_env(None, Env::new(node))
    }

    fn with_env(owner: Option<Origin>, env: Env) -> Self {
        Self {
            owner,
            env,
            helpers: Default::default(),
            children: Default::default(),
            deferred: None,
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.children.iter().filter_map(|child| match child {
            Child::Resource(resource) => Some(resource),
            Child::Command(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether anything besides echoes was declared here
    pub(crate) fn has_declarations(&self) -> bool {
        self.resources()
            .any(|resource| resource.kind() != ResourceKind::Echo)
    }

    /// Origin of the next resource declared here
    pub(crate) fn next_origin(&self, kind: ResourceKind, label: String) -> Origin {
        Origin::new(kind, label, self.resources().count())
    }

    /// Context for the block of a resource about to be declared here
    pub(crate) fn nested(&self, owner: Origin) -> Context {
        Context::with_env(Some(owner), self.child_env())
    }

    /// Environment for nested blocks: ours plus every helper defined so far
    fn child_env(&self) -> Env {
        if self.helpers.is_empty() {
            return self.env.clone();
        }

        Env {
            node: self.env.node.clone(),
            frame: Some(Rc::new(Frame {
                helpers: self.helpers.clone(),
                parent: self.env.frame.clone(),
            })),
        }
    }

    pub(crate) fn push(&mut self, resource: Resource) {
        tracing::debug!(origin = %resource.origin(), "declared");
        self.children.push(Child::Resource(resource));
    }

    pub(crate) fn push_command(&mut self, command: String) {
        self.children.push(Child::Command(command));
    }

    /// Record a declaration problem, reported when this context renders
    ///
    /// Only the first problem is kept.
    pub(crate) fn defer(&mut self, error: CompileError) {
        tracing::debug!(%error, "deferred");
        self.deferred.get_or_insert(error);
    }

    fn scope(&self) -> String {
        self.owner
            .as_ref()
            .map_or_else(|| "recipe".to_string(), ToString::to_string)
    }

    fn define_helper<T: 'static>(&mut self, name: String, helper: Helper<T>) {
        self.helpers
            .insert((name, TypeId::of::<T>()), Rc::new(helper));
    }

    fn helper<T: 'static>(&self, name: &str) -> Option<Helper<T>> {
        lookup::<T>(&self.helpers, name).or_else(|| self.env.helper(name))
    }

    /// Render every declared resource, separated by blank lines
    ///
    /// The result is empty when nothing rendered, otherwise it ends with exactly one newline.
    pub fn render(&self) -> Result<String, CompileError> {
        let mut script = String::new();
        for fragment in self.fragments()? {
            if !script.is_empty() {
                script.push('\n');
            }
            script.push_str(&fragment.to_string());
            script.push('\n');
        }
        Ok(script)
    }

    /// Render the children of a resource's block as one contiguous fragment
    pub(crate) fn render_body(&self) -> Result<Fragment, CompileError> {
        let mut body = Fragment::default();
        for fragment in self.fragments()? {
            body.append(fragment);
        }
        Ok(body)
    }

    fn fragments(&self) -> Result<Vec<Fragment>, CompileError> {
        if let Some(error) = &self.deferred {
            return Err(error.clone());
        }

        let mut fragments = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let fragment = match child {
                Child::Resource(resource) => resource.render()?,
                Child::Command(command) => {
                    let mut fragment = Fragment::default();
                    fragment.code(command);
                    fragment
                }
            };

            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let helpers: Vec<_> = self.helpers.keys().map(|(name, _)| name).collect();
        f.debug_struct("Context")
            .field("owner", &self.owner)
            .field("helpers", &helpers)
            .field("children", &self.children)
            .field("deferred", &self.deferred)
            .finish()
    }
}

/// Declaration verbs available in every block
///
/// Implemented by [Context] and by every resource builder. Nested resources render inside their
/// parent's body, in the order they were declared.
pub trait Block: Sized + 'static {
    fn context(&self) -> &Context;
    fn context_mut(&mut self) -> &mut Context;

    fn node(&self) -> &NodeData {
        self.context().env().node()
    }

    fn echo(&mut self, message: impl Into<String>) {
        let message = message.into();
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Echo, message.clone());
        context.push(Resource::Echo(Echo::new(origin, message)));
    }

    fn execute(&mut self, label: impl Into<String>, block: impl FnOnce(&mut Execute)) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Execute, label.into());
        let mut execute = Execute::new(origin.clone(), context.nested(origin));
        block(&mut execute);
        context.push(Resource::Execute(execute));
    }

    fn file(&mut self, label: impl Into<String>, block: impl FnOnce(&mut File)) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::File, label.into());
        let mut file = File::new(origin.clone(), context.nested(origin));
        block(&mut file);
        context.push(Resource::File(file));
    }

    fn directory(&mut self, label: impl Into<String>, block: impl FnOnce(&mut Directory)) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Directory, label.into());
        let mut directory = Directory::new(origin.clone(), context.nested(origin));
        block(&mut directory);
        context.push(Resource::Directory(directory));
    }

    /// Redirect output, configured by `block`
    fn log(&mut self, block: impl FnOnce(&mut Log)) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Log, String::new());
        let mut log = Log::new(origin.clone(), context.nested(origin));
        block(&mut log);
        context.push(Resource::Log(log));
    }

    /// Redirect stdout and stderr to `path`
    fn log_to(&mut self, path: impl Into<String>) {
        let path = path.into();
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Log, path.clone());
        let mut log = Log::new(origin.clone(), context.nested(origin));
        log.path(path);
        context.push(Resource::Log(log));
    }

    fn halt_on_failed_command(&mut self) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::HaltOnFailedCommand, String::new());
        context.push(Resource::HaltOnFailedCommand(origin));
    }

    /// Gem manifest in the directory `path`
    fn gemfile(&mut self, path: impl Into<String>, block: impl FnOnce(&mut Gemfile)) {
        let context = self.context_mut();
        let origin = context.next_origin(ResourceKind::Gemfile, path.into());
        let mut gemfile = Gemfile::new(origin.clone(), context.nested(origin));
        block(&mut gemfile);
        context.push(Resource::Gemfile(gemfile));
    }

    /// Make `helper` callable by name from this block and blocks nested in it
    ///
    /// Only blocks of builder type `T` can call it. Blocks declared before the definition
    /// don't see it.
    fn define<T, F>(&mut self, name: impl Into<String>, helper: F)
    where
        T: Block,
        F: Fn(&mut T, &str) + 'static,
    {
        let helper: Helper<T> = Rc::new(helper);
        self.context_mut().define_helper(name.into(), helper);
    }

    /// Invoke a helper defined for this kind of block
    fn call(&mut self, name: &str, argument: &str) {
        let Some(helper) = self.context().helper::<Self>(name) else {
            let context = self.context_mut();
            let error = CompileError::UnknownHelper {
                scope: context.scope(),
                name: name.to_string(),
            };
            context.defer(error);
            return;
        };

        helper(self, argument);
    }
}

impl Block for Context {
    fn context(&self) -> &Context {
        self
    }

    fn context_mut(&mut self) -> &mut Context {
        self
    }
}
