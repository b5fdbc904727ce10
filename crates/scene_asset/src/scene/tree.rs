//! Scene node tree
//!
//! Nodes live in an arena with parent indices. The asset format is flat (a
//! root plus sibling embedded nodes), so every embedded node's parent is the
//! root, but world transforms are still resolved by walking parent chains.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use approx::AbsDiffEq;

use crate::foundation::math::{Transform, DEFAULT_EPSILON};
use crate::scene::{decode, encode, Node, ParseError, ParseOptions, Payload, Renderable, ScriptRef};

/// Validated, immutable root-plus-embedded node collection
///
/// Once built a tree is never mutated; edits go through [`Self::to_builder`]
/// and produce a new tree, so shared readers never observe a change.
///
/// Equality compares nodes and instance placement; the options a tree was
/// validated with are not part of it.
#[derive(Debug, Clone)]
pub struct SceneNodeTree {
    /// Root first, then embedded nodes in declaration order
    nodes: Vec<Node>,
    /// Parent index per node; `None` for the root
    parents: Vec<Option<usize>>,
    /// Node id to arena index
    index: HashMap<String, usize>,
    /// Placement of the whole tree in the world
    instance: Transform,
    /// Options the nodes were validated with
    options: ParseOptions,
}

impl SceneNodeTree {
    /// Parse a scene from text with default options
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_with(text, &ParseOptions::default())
    }

    /// Parse a scene from text
    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        decode::decode_document(text, options)
    }

    /// Write the tree back to text
    ///
    /// `parse_with(serialize(tree), tree.options())` yields a tree equal to
    /// this one within [`DEFAULT_EPSILON`]. Trees validated under looser
    /// options than the defaults (a wider rotation tolerance, or lenient mode
    /// keeping undecodable sprite data opaque) only reparse under those
    /// options.
    pub fn serialize(&self) -> String {
        encode::encode_tree(self)
    }

    /// Start building a tree around a root script node
    pub fn builder(id: impl Into<String>, script: ScriptRef, transform: Transform) -> SceneNodeTreeBuilder {
        SceneNodeTreeBuilder::new(id, script, transform)
    }

    /// Builder pre-filled with this tree's nodes and options, for
    /// copy-on-write edits
    pub fn to_builder(&self) -> SceneNodeTreeBuilder {
        SceneNodeTreeBuilder {
            nodes: self.nodes.clone(),
            instance: self.instance.clone(),
            options: self.options.clone(),
        }
    }

    /// Options the tree was validated with
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Assemble a tree from nodes whose transforms are already validated
    ///
    /// Each node comes with the record index used in error reports. The first
    /// node is the root.
    pub(crate) fn from_validated(
        nodes: Vec<(usize, Node)>,
        instance: Transform,
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut parents = Vec::with_capacity(nodes.len());
        let mut arena = Vec::with_capacity(nodes.len());

        for (position, (record, node)) in nodes.into_iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(ParseError::DuplicateId { record, id: node.id });
            }
            parents.push(if position == 0 { None } else { Some(0) });
            arena.push(node);
        }

        Ok(Self {
            nodes: arena,
            parents,
            index,
            instance,
            options,
        })
    }

    /// Nodes in declaration order, root first
    ///
    /// The iterator is lazy and can be recreated any number of times with the
    /// same result.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// The script referenced by the root node
    pub fn script(&self) -> Option<&ScriptRef> {
        self.root().as_script()
    }

    /// Embedded nodes in declaration order
    pub fn embedded(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().skip(1)
    }

    /// Embedded renderables with their node ids
    pub fn renderables(&self) -> impl Iterator<Item = (&str, &Renderable)> + '_ {
        self.embedded()
            .filter_map(|node| node.as_renderable().map(|r| (node.id.as_str(), r)))
    }

    /// Look up a node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// The parent of a node; `None` for the root or an unknown id
    pub fn parent(&self, id: &str) -> Option<&Node> {
        let i = *self.index.get(id)?;
        self.parents[i].map(|p| &self.nodes[p])
    }

    /// Placement of the whole tree in the world
    pub fn instance_transform(&self) -> &Transform {
        &self.instance
    }

    /// Copy of this tree placed at a different world transform
    #[must_use]
    pub fn with_instance_transform(&self, instance: Transform) -> Self {
        Self {
            instance,
            ..self.clone()
        }
    }

    /// World transform of a node
    ///
    /// Composes local transforms along the containment chain, outermost first:
    /// `instance ∘ root_local ∘ child_local`. Returns `None` only when no node
    /// has the given id.
    pub fn resolve_world_transform(&self, id: &str) -> Option<Transform> {
        self.index.get(id).map(|&i| self.world_transform_at(i))
    }

    /// Every node paired with its world transform, in declaration order
    pub fn world_transforms(&self) -> impl Iterator<Item = (&Node, Transform)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(move |(i, node)| (node, self.world_transform_at(i)))
    }

    fn world_transform_at(&self, index: usize) -> Transform {
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.parents[current] {
            chain.push(parent);
            current = parent;
        }

        chain
            .iter()
            .rev()
            .fold(self.instance.clone(), |world, &i| world.combine(&self.nodes[i].transform))
    }
}

impl<'a> IntoIterator for &'a SceneNodeTree {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for SceneNodeTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.parents == other.parents && self.instance == other.instance
    }
}

impl FromStr for SceneNodeTree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SceneNodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl AbsDiffEq for SceneNodeTree {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        DEFAULT_EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.instance.abs_diff_eq(&other.instance, epsilon)
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

/// Programmatic construction of a [`SceneNodeTree`]
///
/// Applies the same validation as parsing: unique ids, well-formed
/// transforms, and sprite data given as [`Renderable::Opaque`] is decoded
/// into a [`crate::scene::Sprite`] (kept opaque only in lenient mode when it
/// does not decode). Errors use the node's position as the record index and
/// line 0.
#[derive(Debug, Clone)]
pub struct SceneNodeTreeBuilder {
    nodes: Vec<Node>,
    instance: Transform,
    options: ParseOptions,
}

impl SceneNodeTreeBuilder {
    /// Start with the root script node
    pub fn new(id: impl Into<String>, script: ScriptRef, transform: Transform) -> Self {
        Self {
            nodes: vec![Node::new(id, transform, Payload::Script(script))],
            instance: Transform::identity(),
            options: ParseOptions::default(),
        }
    }

    /// Add an embedded renderable node
    #[must_use]
    pub fn embed(mut self, id: impl Into<String>, renderable: Renderable, transform: Transform) -> Self {
        self.nodes.push(Node::new(id, transform, Payload::Renderable(renderable)));
        self
    }

    /// Drop the embedded node with the given id, if present
    #[must_use]
    pub fn remove(mut self, id: &str) -> Self {
        let mut first = true;
        self.nodes.retain(|node| std::mem::take(&mut first) || node.id != id);
        self
    }

    /// Set where the tree sits in the world
    #[must_use]
    pub fn instance_transform(mut self, instance: Transform) -> Self {
        self.instance = instance;
        self
    }

    /// Validation options (rotation policy and tolerance)
    #[must_use]
    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate and produce the tree
    pub fn build(self) -> Result<SceneNodeTree, ParseError> {
        let options = self.options;
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(record, mut node)| -> Result<(usize, Node), ParseError> {
                let Transform { position, rotation, scale } = node.transform;
                node.transform = options.validate_transform(record, position, rotation.into_inner(), scale)?;
                node.payload = match node.payload {
                    Payload::Renderable(renderable) => {
                        Payload::Renderable(decode::canonical_renderable(record, &options, renderable)?)
                    }
                    script @ Payload::Script(_) => script,
                };
                Ok((record, node))
            })
            .collect::<Result<Vec<_>, _>>()?;

        SceneNodeTree::from_validated(nodes, self.instance, options)
    }
}
