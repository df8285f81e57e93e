//! Reply-tree reconstruction.
//!
//! A post's replies form a forest over the "is a reply to" relation. Given a
//! root id this module computes the transitive closure of that relation — the
//! root and every post reachable by following reply edges downwards — as an
//! iterative breadth-first fixed point over the edge index, not as recursive
//! SQL. Malformed cyclic data cannot loop: an id already collected is never
//! expanded again.

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::store::PostStore;
use crate::types::{Post, PostId};

/// Resolves the reply tree rooted at `root`.
///
/// Returns the root and all transitive replies ordered by ascending creation
/// time, ties broken by ascending id. A missing root yields an empty result;
/// absence is not an error for this operation (callers cannot distinguish
/// "not found" from "no replies" by the current contract).
pub fn resolve_hierarchy(store: &PostStore, root: PostId) -> Result<Vec<Post>> {
    if store.get(root)?.is_none() {
        return Ok(Vec::new());
    }

    // One read of the relation; the traversal runs against this snapshot.
    let children = store.children_index()?;

    let mut collected = vec![root];
    let mut seen: HashSet<PostId> = HashSet::from([root]);
    let mut frontier: VecDeque<PostId> = VecDeque::from([root]);
    while let Some(current) = frontier.pop_front() {
        let Some(replies) = children.get(&current) else {
            continue;
        };
        for &reply in replies {
            if seen.insert(reply) {
                collected.push(reply);
                frontier.push_back(reply);
            }
        }
    }

    let mut posts = store.get_many(&collected)?;
    posts.sort_by_key(|post| (post.created_at, post.id));
    Ok(posts)
}
