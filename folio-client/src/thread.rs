use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::ser::Error as _;

use crate::api::{Post, PostId};

/// Deepest reply nesting a `ThreadedPost` serializes to, `ThreadRow`s have no limit
pub const MAX_SERIALIZED_NESTING: usize = 256;

/// A post placed in its topic's reply tree
///
/// Reply chains have no depth limit, so `Clone`, `PartialEq`, `Debug` and `Drop` walk the
/// tree with an explicit stack.
#[derive(serde::Deserialize)]
pub struct ThreadedPost {
    #[serde(flatten)]
    pub post: Post,

    /// Number of ancestors above this post, 0 for a top-level post
    pub depth: usize,

    /// Direct replies, in the order they appeared in the input
    pub replies: Vec<ThreadedPost>,
}

impl ThreadedPost {
    pub fn id(&self) -> &PostId {
        &self.post.id
    }

    /// Number of posts in this subtree, including this one
    pub fn num_posts(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order walk over this subtree
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of reply levels below this post, 0 when it has no replies
    pub fn nesting(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.replies.iter().map(|r| (r, level + 1)));
        }
        deepest
    }
}

impl Drop for ThreadedPost {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl Clone for ThreadedPost {
    fn clone(&self) -> ThreadedPost {
        ThreadedPost {
            post: self.post.clone(),
            depth: self.depth,
            replies: clone_forest(&self.replies),
        }
    }
}

fn clone_forest(roots: &[ThreadedPost]) -> Vec<ThreadedPost> {
    struct CloneFrame<'a> {
        src: &'a ThreadedPost,
        pending: std::slice::Iter<'a, ThreadedPost>,
        replies: Vec<ThreadedPost>,
    }

    impl<'a> CloneFrame<'a> {
        fn of(src: &'a ThreadedPost) -> CloneFrame<'a> {
            CloneFrame {
                src,
                pending: src.replies.iter(),
                replies: Vec::with_capacity(src.replies.len()),
            }
        }
    }

    let mut forest = Vec::with_capacity(roots.len());
    let mut stack = Vec::new();
    for root in roots {
        stack.push(CloneFrame::of(root));
        while let Some(top) = stack.last_mut() {
            match top.pending.next() {
                Some(child) => stack.push(CloneFrame::of(child)),
                None => {
                    if let Some(done) = stack.pop() {
                        let node = ThreadedPost {
                            post: done.src.post.clone(),
                            depth: done.src.depth,
                            replies: done.replies,
                        };
                        match stack.last_mut() {
                            Some(parent) => parent.replies.push(node),
                            None => forest.push(node),
                        }
                    }
                }
            }
        }
    }
    forest
}

impl PartialEq for ThreadedPost {
    fn eq(&self, other: &ThreadedPost) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.depth != b.depth || a.replies.len() != b.replies.len() || a.post != b.post {
                return false;
            }
            stack.extend(a.replies.iter().zip(b.replies.iter()));
        }
        true
    }
}

impl Eq for ThreadedPost {}

// Printed as the pre-order list of (depth, post)
impl fmt::Debug for ThreadedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|n| (n.depth, &n.post)))
            .finish()
    }
}

impl serde::Serialize for ThreadedPost {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nesting = self.nesting();
        if nesting > MAX_SERIALIZED_NESTING {
            return Err(S::Error::custom(format!(
                "replies to post {} nest {nesting} levels deep, more than the {MAX_SERIALIZED_NESTING} a tree can be serialized with",
                self.post.id
            )));
        }
        serde::Serialize::serialize(&NestedPost::of(self), serializer)
    }
}

// Same shape as the derived serialization, once the nesting is known to be bounded
#[derive(serde::Serialize)]
struct NestedPost<'a> {
    #[serde(flatten)]
    post: &'a Post,
    depth: usize,
    #[serde(serialize_with = "serialize_replies")]
    replies: &'a [ThreadedPost],
}

impl<'a> NestedPost<'a> {
    fn of(p: &'a ThreadedPost) -> NestedPost<'a> {
        NestedPost {
            post: &p.post,
            depth: p.depth,
            replies: &p.replies,
        }
    }
}

fn serialize_replies<S: serde::Serializer>(
    replies: &&[ThreadedPost],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(replies.iter().map(NestedPost::of))
}

pub struct Iter<'a> {
    stack: Vec<&'a ThreadedPost>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ThreadedPost;

    fn next(&mut self) -> Option<&'a ThreadedPost> {
        let node = self.stack.pop()?;
        self.stack.extend(node.replies.iter().rev());
        Some(node)
    }
}

pub fn count_posts(forest: &[ThreadedPost]) -> usize {
    forest.iter().map(ThreadedPost::num_posts).sum()
}

/// One post of a flattened forest
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ThreadRow<'a> {
    #[serde(flatten)]
    pub post: &'a Post,
    pub depth: usize,
    pub num_replies: usize,
}

/// Flattens the forest in display order, whatever its depth
pub fn thread_rows(forest: &[ThreadedPost]) -> Vec<ThreadRow<'_>> {
    forest
        .iter()
        .flat_map(|t| t.iter())
        .map(|n| ThreadRow {
            post: &n.post,
            depth: n.depth,
            num_replies: n.replies.len(),
        })
        .collect()
}

/// What to do with posts whose parent is not part of the collection
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrphanPolicy {
    /// Leave them out of the forest entirely
    #[default]
    Drop,

    /// Show them as additional top-level posts, after the real ones
    Promote,
}

#[derive(Clone, Debug, Default)]
pub struct ThreadBuilder {
    orphans: OrphanPolicy,
}

impl ThreadBuilder {
    pub fn new() -> ThreadBuilder {
        ThreadBuilder::default()
    }

    pub fn orphans(mut self, policy: OrphanPolicy) -> ThreadBuilder {
        self.orphans = policy;
        self
    }

    pub fn build(&self, posts: &[Post]) -> Vec<ThreadedPost> {
        self.build_from(posts, None, 0)
    }

    /// Builds the reply forest below `parent_id`, the first level getting `depth`
    ///
    /// Siblings keep the relative order they have in `posts`. Deletion flags are not
    /// looked at: a deleted post stays in the tree so that its replies stay reachable.
    pub fn build_from<'a>(
        &self,
        posts: &'a [Post],
        parent_id: Option<&'a PostId>,
        depth: usize,
    ) -> Vec<ThreadedPost> {
        let index = ChildIndex::new(posts);
        let mut emitted = vec![false; posts.len()];
        let mut forest = assemble(posts, &index, index.children_of(parent_id), depth, &mut emitted);
        if parent_id.is_none() {
            let orphans = index.orphans(posts);
            match self.orphans {
                OrphanPolicy::Drop => {
                    if !orphans.is_empty() {
                        tracing::debug!(num_orphans = orphans.len(), "dropping orphan posts");
                    }
                }
                OrphanPolicy::Promote => {
                    forest.extend(assemble(posts, &index, &orphans, depth, &mut emitted));
                }
            }
        }
        forest
    }
}

/// Builds the reply forest of one topic's posts, see [`ThreadBuilder::build_from`]
///
/// Posts replying to a parent that is not in `posts` are dropped.
pub fn build_threaded_posts<'a>(
    posts: &'a [Post],
    parent_id: Option<&'a PostId>,
    depth: usize,
) -> Vec<ThreadedPost> {
    ThreadBuilder::new().build_from(posts, parent_id, depth)
}

/// Posts whose parent is not part of `posts`, in input order
pub fn find_orphans(posts: &[Post]) -> Vec<&Post> {
    let index = ChildIndex::new(posts);
    index
        .orphans(posts)
        .into_iter()
        .map(|i| &posts[i])
        .collect()
}

struct ChildIndex<'a> {
    ids: HashSet<&'a PostId>,
    // parent id -> positions in the input, in input order
    children: HashMap<Option<&'a PostId>, Vec<usize>>,
}

impl<'a> ChildIndex<'a> {
    fn new(posts: &'a [Post]) -> ChildIndex<'a> {
        let mut ids = HashSet::with_capacity(posts.len());
        let mut children: HashMap<Option<&'a PostId>, Vec<usize>> = HashMap::new();
        for (i, p) in posts.iter().enumerate() {
            ids.insert(&p.id);
            children.entry(p.parent_id.as_ref()).or_default().push(i);
        }
        ChildIndex { ids, children }
    }

    fn children_of(&self, parent: Option<&'a PostId>) -> &[usize] {
        self.children
            .get(&parent)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    fn orphans(&self, posts: &[Post]) -> Vec<usize> {
        posts
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(&p.parent_id, Some(parent) if !self.ids.contains(parent)))
            .map(|(i, _)| i)
            .collect()
    }
}

struct Frame<'i> {
    post: usize,
    depth: usize,
    pending: std::slice::Iter<'i, usize>,
    replies: Vec<ThreadedPost>,
}

fn assemble<'a>(
    posts: &'a [Post],
    index: &ChildIndex<'a>,
    roots: &[usize],
    depth: usize,
    emitted: &mut [bool],
) -> Vec<ThreadedPost> {
    let mut forest = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();
    for &root in roots {
        if !claim(posts, emitted, root) {
            continue;
        }
        stack.push(Frame {
            post: root,
            depth,
            pending: index.children_of(Some(&posts[root].id)).iter(),
            replies: Vec::new(),
        });
        while let Some(top) = stack.last_mut() {
            match top.pending.next() {
                Some(&child) => {
                    if claim(posts, emitted, child) {
                        let depth = top.depth + 1;
                        stack.push(Frame {
                            post: child,
                            depth,
                            pending: index.children_of(Some(&posts[child].id)).iter(),
                            replies: Vec::new(),
                        });
                    }
                }
                None => {
                    if let Some(done) = stack.pop() {
                        let node = ThreadedPost {
                            post: posts[done.post].clone(),
                            depth: done.depth,
                            replies: done.replies,
                        };
                        match stack.last_mut() {
                            Some(parent) => parent.replies.push(node),
                            None => forest.push(node),
                        }
                    }
                }
            }
        }
    }
    forest
}

// Each input post ends up at most once in the forest, which also guarantees termination
// on duplicate ids
fn claim(posts: &[Post], emitted: &mut [bool], post: usize) -> bool {
    if emitted[post] {
        tracing::warn!(post_id = %posts[post].id, "post reached twice while threading, skipping");
        return false;
    }
    emitted[post] = true;
    true
}
