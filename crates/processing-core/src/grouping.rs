//! Track grouping and transition chaining.
//!
//! Normalized items are partitioned into groups. A video that declares a
//! transition effect and a chain id starts a chain: the chain id names the
//! next video, whose own chain id names the one after it, and so on. Every
//! other item is a singleton group.
//!
//! A chain id that names no video ends the chain silently. An item that
//! has already been grouped ends the chain as well, so an item never
//! belongs to two groups.

use std::collections::HashSet;

use reelgraph_project_model::Item;

/// An item together with its engine input index.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub input_index: usize,
    pub item: Item,
}

/// A transition chain (two or more members) or a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub members: Vec<GroupMember>,
}

impl Group {
    /// Whether members are joined by cross-transitions.
    pub fn is_chain(&self) -> bool {
        self.members.len() > 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Interval during which the group is visible on the composite.
    pub fn active_interval(&self) -> (f64, f64) {
        let start = self
            .members
            .iter()
            .map(|m| m.item.base.enter_begin)
            .fold(f64::INFINITY, f64::min);
        let end = self
            .members
            .iter()
            .map(|m| m.item.exit_end())
            .fold(f64::NEG_INFINITY, f64::max);
        if self.members.is_empty() {
            (0.0, 0.0)
        } else {
            (start, end)
        }
    }
}

/// Partition `items` into maximal groups, in first-occurrence order.
///
/// The engine input index of `items[i]` is `i + 1`.
pub fn group_items(items: &[Item]) -> Vec<Group> {
    let mut visited = HashSet::with_capacity(items.len());
    let mut groups = Vec::new();

    for (position, item) in items.iter().enumerate() {
        if !visited.insert(position) {
            continue;
        }

        let mut members = vec![member(items, position)];
        if item.transition_link().is_some() {
            follow_chain(items, item, &mut visited, &mut members);
        }

        tracing::trace!(
            first_input = members[0].input_index,
            size = members.len(),
            "Group formed"
        );
        groups.push(Group { members });
    }

    groups
}

fn follow_chain(
    items: &[Item],
    start: &Item,
    visited: &mut HashSet<usize>,
    members: &mut Vec<GroupMember>,
) {
    let mut next_id = start.next_in_chain();

    while let Some(id) = next_id {
        let Some(position) = items
            .iter()
            .position(|candidate| candidate.is_video() && candidate.id() == Some(id))
        else {
            tracing::debug!(chain_id = id, "Transition chain id matches no video; chain ends");
            break;
        };

        if !visited.insert(position) {
            tracing::debug!(chain_id = id, "Transition chain reaches a grouped item; chain ends");
            break;
        }

        members.push(member(items, position));
        next_id = items[position].next_in_chain();
    }
}

fn member(items: &[Item], position: usize) -> GroupMember {
    GroupMember {
        input_index: position + 1,
        item: items[position].clone(),
    }
}
