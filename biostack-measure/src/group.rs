//! Measurement groups.

use biostack_core::{typed_id, IdAllocator};

use crate::measurement::Rgb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

typed_id! {
    /// Identifies a group in a [`GroupRegistry`].
    pub struct GroupId;
}

impl GroupId {
    /// The built-in "none" group.
    pub const NONE: Self = Self(0);
}

/// A named category that measurements can be tagged with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    /// Color given to new measurements in this group.
    pub default_color: Rgb,
}

/// The set of known groups. Always contains [`GroupId::NONE`].
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    groups: Vec<Group>,
    ids: IdAllocator,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self {
            groups: vec![Group {
                id: GroupId::NONE,
                name: "none".to_string(),
                description: String::new(),
                default_color: Rgb::WHITE,
            }],
            ids: IdAllocator::starting_at(1),
        }
    }
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new group.
    pub fn create(&mut self, name: impl Into<String>, default_color: Rgb) -> GroupId {
        let id = GroupId(self.ids.allocate());
        self.groups.push(Group {
            id,
            name: name.into(),
            description: String::new(),
            default_color,
        });
        id
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_none_group() {
        let groups = GroupRegistry::new();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(GroupId::NONE).unwrap().name, "none");
    }

    #[test]
    fn test_create_and_describe() {
        let mut groups = GroupRegistry::new();
        let nuclei = groups.create("nuclei", Rgb::YELLOW);
        assert_eq!(nuclei, GroupId(1));
        groups.get_mut(nuclei).unwrap().description = "DAPI stained".into();
        assert_eq!(groups.find("nuclei").unwrap().description, "DAPI stained");
        assert!(!groups.contains(GroupId(9)));
    }
}
