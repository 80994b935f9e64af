//! Category tree stored as a materialised path.
//!
//! Every node's `path` is its parent's path plus one fixed-width base-36
//! step, so ordering the paths lexically yields a depth-first walk of the
//! tree and "is in the subtree of" is a prefix test.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, slugify};

const STEP_LEN: usize = 4;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const SLUG_SEPARATOR: &str = "/";
pub const NAME_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    path: String,
    depth: usize,
    name: String,
    pub description: String,
    slug: String,
    full_name: String,
}

impl Category {
    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full slug, e.g. `books/fiction`.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Breadcrumb name, e.g. `Books > Fiction`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Roots have depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.depth == 1
    }

    /// Whether `other` is this category or one of its descendants.
    pub fn subtree_contains(&self, other: &Category) -> bool {
        other.path.starts_with(&self.path)
    }
}

/// Where to move a node relative to a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePosition {
    FirstChild,
    LastChild,
    Left,
    Right,
}

/// Ordered child lists keyed by parent (`None` = root level).
type Layout = BTreeMap<Option<CategoryId>, Vec<CategoryId>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
    by_path: BTreeMap<String, CategoryId>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Category> {
        self.nodes.values().find(|c| c.slug == slug)
    }

    /// All categories in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.by_path.values().filter_map(|id| self.nodes.get(id))
    }

    pub fn roots(&self) -> Vec<&Category> {
        self.iter().filter(|c| c.is_root()).collect()
    }

    pub fn parent(&self, id: CategoryId) -> Option<&Category> {
        let node = self.nodes.get(&id)?;
        if node.is_root() {
            return None;
        }
        let parent_path = &node.path[..node.path.len() - STEP_LEN];
        self.by_path
            .get(parent_path)
            .and_then(|pid| self.nodes.get(pid))
    }

    pub fn children(&self, id: CategoryId) -> Vec<&Category> {
        match self.nodes.get(&id) {
            Some(node) => self
                .subtree(node)
                .filter(|c| c.depth == node.depth + 1)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn has_children(&self, id: CategoryId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn num_children(&self, id: CategoryId) -> usize {
        self.children(id).len()
    }

    /// Root first, ending with the node itself.
    pub fn ancestors_and_self(&self, id: CategoryId) -> Vec<&Category> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        (1..=node.depth)
            .filter_map(|depth| self.by_path.get(&node.path[..depth * STEP_LEN]))
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// The node followed by its descendants, depth first.
    pub fn descendants_and_self(&self, id: CategoryId) -> Vec<&Category> {
        match self.nodes.get(&id) {
            Some(node) => self.subtree(node).collect(),
            None => Vec::new(),
        }
    }

    /// Whether `node` is `ancestor` or lies beneath it.
    pub fn is_in_subtree(&self, ancestor: CategoryId, node: CategoryId) -> bool {
        match (self.nodes.get(&ancestor), self.nodes.get(&node)) {
            (Some(a), Some(n)) => a.subtree_contains(n),
            _ => false,
        }
    }

    fn subtree<'a>(&'a self, node: &'a Category) -> impl Iterator<Item = &'a Category> + 'a {
        self.by_path
            .range(node.path.clone()..)
            .take_while(move |(path, _)| path.starts_with(&node.path))
            .filter_map(move |(_, id)| self.nodes.get(id))
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> DomainResult<CategoryId> {
        self.insert(None, name.into())
    }

    pub fn add_child(&mut self, parent: CategoryId, name: impl Into<String>) -> DomainResult<CategoryId> {
        if !self.contains(parent) {
            return Err(DomainError::not_found());
        }
        self.insert(Some(parent), name.into())
    }

    /// Create (or reuse) every category along a breadcrumb string such as
    /// `"Books > Fiction > Horror"`, returning the deepest one.
    pub fn create_from_breadcrumbs(&mut self, breadcrumbs: &str) -> DomainResult<CategoryId> {
        let mut parent: Option<CategoryId> = None;
        for name in breadcrumbs.split('>').map(str::trim).filter(|n| !n.is_empty()) {
            let existing = match parent {
                Some(pid) => self.children(pid).into_iter().find(|c| c.name == name),
                None => self.roots().into_iter().find(|c| c.name == name),
            }
            .map(Category::id_typed);

            parent = Some(match existing {
                Some(id) => id,
                None => self.insert(parent, name.to_string())?,
            });
        }
        parent.ok_or_else(|| DomainError::validation("Breadcrumbs must name at least one category."))
    }

    fn insert(&mut self, parent: Option<CategoryId>, name: String) -> DomainResult<CategoryId> {
        let name = validate_name(name)?;
        let id = CategoryId::new();
        let mut names = self.names();
        names.insert(id, (name, String::new()));

        let mut layout = self.layout();
        layout.entry(parent).or_default().push(id);

        *self = Self::build(&layout, &names)?;
        tracing::debug!(category_id = %id, "category added");
        Ok(id)
    }

    /// Rename a category; descendants' slugs and full names follow.
    pub fn rename(&mut self, id: CategoryId, name: impl Into<String>) -> DomainResult<()> {
        let name = validate_name(name.into())?;
        let mut names = self.names();
        match names.get_mut(&id) {
            Some(entry) => entry.0 = name,
            None => return Err(DomainError::not_found()),
        }
        *self = Self::build(&self.layout(), &names)?;
        Ok(())
    }

    pub fn set_description(&mut self, id: CategoryId, description: impl Into<String>) -> DomainResult<()> {
        let node = self.nodes.get_mut(&id).ok_or_else(DomainError::not_found)?;
        node.description = description.into();
        Ok(())
    }

    /// Move `id` (with its subtree) relative to `target`.
    ///
    /// The tree is left untouched when the move is rejected, including when
    /// the new slugs would collide with existing ones.
    pub fn move_node(&mut self, id: CategoryId, target: CategoryId, position: MovePosition) -> DomainResult<()> {
        if !self.contains(id) || !self.contains(target) {
            return Err(DomainError::not_found());
        }
        if self.is_in_subtree(id, target) {
            return Err(DomainError::invariant(
                "Cannot move a category into its own subtree.",
            ));
        }

        let mut layout = self.layout();
        for siblings in layout.values_mut() {
            siblings.retain(|c| *c != id);
        }

        match position {
            MovePosition::FirstChild => layout.entry(Some(target)).or_default().insert(0, id),
            MovePosition::LastChild => layout.entry(Some(target)).or_default().push(id),
            MovePosition::Left | MovePosition::Right => {
                let parent = self.parent(target).map(Category::id_typed);
                let siblings = layout.entry(parent).or_default();
                let at = siblings
                    .iter()
                    .position(|c| *c == target)
                    .ok_or_else(DomainError::not_found)?;
                let at = if position == MovePosition::Left { at } else { at + 1 };
                siblings.insert(at, id);
            }
        }

        *self = Self::build(&layout, &self.names())?;
        tracing::debug!(category_id = %id, target = %target, ?position, "category moved");
        Ok(())
    }

    /// Delete a category and all its descendants, returning the removed ids.
    pub fn remove(&mut self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        let removed: Vec<CategoryId> = self
            .descendants_and_self(id)
            .into_iter()
            .map(Category::id_typed)
            .collect();
        if removed.is_empty() {
            return Err(DomainError::not_found());
        }

        let mut layout = self.layout();
        for siblings in layout.values_mut() {
            siblings.retain(|c| !removed.contains(c));
        }
        let mut names = self.names();
        names.retain(|c, _| !removed.contains(c));

        *self = Self::build(&layout, &names)?;
        Ok(removed)
    }

    fn names(&self) -> HashMap<CategoryId, (String, String)> {
        self.nodes
            .values()
            .map(|c| (c.id, (c.name.clone(), c.description.clone())))
            .collect()
    }

    fn layout(&self) -> Layout {
        let mut layout = Layout::new();
        for node in self.iter() {
            let parent = self.parent(node.id).map(Category::id_typed);
            layout.entry(parent).or_default().push(node.id);
        }
        layout
    }

    /// Lay the tree out afresh: paths, depths, slugs and full names are all
    /// derived from the ordered child lists.
    fn build(layout: &Layout, names: &HashMap<CategoryId, (String, String)>) -> DomainResult<Self> {
        let mut tree = Self::new();
        let mut slugs: HashMap<String, CategoryId> = HashMap::new();

        // Explicit DFS; each frame is a parent and the index of its next child.
        let mut pending: Vec<(Option<CategoryId>, usize)> = vec![(None, 0)];
        while let Some((parent, index)) = pending.pop() {
            let siblings = layout.get(&parent).map(Vec::as_slice).unwrap_or(&[]);
            let Some(&id) = siblings.get(index) else {
                continue;
            };
            pending.push((parent, index + 1));

            let (name, description) = names.get(&id).cloned().ok_or_else(DomainError::not_found)?;
            let parent_node = parent.and_then(|p| tree.nodes.get(&p));
            let own_slug = match slugify(&name) {
                s if s.is_empty() => "category".to_string(),
                s => s,
            };
            let step = encode_step(index + 1)?;
            let (path, depth, slug, full_name) = match parent_node {
                Some(p) => (
                    format!("{}{step}", p.path),
                    p.depth + 1,
                    format!("{}{SLUG_SEPARATOR}{own_slug}", p.slug),
                    format!("{}{NAME_SEPARATOR}{name}", p.full_name),
                ),
                None => (step, 1, own_slug, name.clone()),
            };

            if slugs.insert(slug.clone(), id).is_some() {
                return Err(DomainError::conflict(format!(
                    "A category with slug '{slug}' already exists"
                )));
            }

            tree.by_path.insert(path.clone(), id);
            tree.nodes.insert(
                id,
                Category {
                    id,
                    path,
                    depth,
                    name,
                    description,
                    slug,
                    full_name,
                },
            );
            pending.push((Some(id), 0));
        }
        Ok(tree)
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("A category must have a name."));
    }
    Ok(name)
}

fn encode_step(mut n: usize) -> DomainResult<String> {
    let mut out = [b'0'; STEP_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[n % 36];
        n /= 36;
    }
    if n > 0 {
        return Err(DomainError::invariant("too many sibling categories"));
    }
    Ok(out.iter().map(|b| *b as char).collect())
}
