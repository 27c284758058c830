use quotanl_wire::ctrl::{
    CTRL_ATTR_FAMILY_ID, CTRL_ATTR_FAMILY_NAME, CTRL_ATTR_MCAST_GROUPS, CTRL_ATTR_MCAST_GRP_ID,
    CTRL_ATTR_MCAST_GRP_NAME, CTRL_ATTR_VERSION,
};
use quotanl_wire::{Attribute, AttributeDecoder};
use serde::Serialize;

use crate::error::Result;

/// A named multicast group within a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MulticastGroup {
    pub id: u32,
    pub name: String,
}

/// A generic netlink family as reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Family {
    /// Netlink message type assigned to the family at registration.
    pub id: u16,
    pub version: u8,
    pub name: String,
    pub groups: Vec<MulticastGroup>,
}

impl Family {
    /// Parse the attributes of a `CTRL_CMD_NEWFAMILY` reply.
    ///
    /// Operations, header size and other controller attributes are skipped.
    pub fn from_attributes(data: &[u8]) -> Result<Self> {
        let mut family = Family::default();

        for attr in AttributeDecoder::new(data) {
            let attr = attr?;
            match attr.kind {
                CTRL_ATTR_FAMILY_ID => family.id = attr.u16()?,
                CTRL_ATTR_FAMILY_NAME => family.name = attr.string()?.to_string(),
                CTRL_ATTR_VERSION => family.version = attr.u32()? as u8,
                CTRL_ATTR_MCAST_GROUPS => family.groups = parse_groups(&attr)?,
                _ => {}
            }
        }

        Ok(family)
    }

    /// First group named `name`, if any.
    pub fn group(&self, name: &str) -> Option<&MulticastGroup> {
        self.groups.iter().find(|group| group.name == name)
    }
}

fn parse_groups(attr: &Attribute<'_>) -> Result<Vec<MulticastGroup>> {
    let mut groups = Vec::new();

    // Each entry is a nested attribute whose type is just an index.
    for entry in attr.nested() {
        let entry = entry?;
        let mut group = MulticastGroup {
            id: 0,
            name: String::new(),
        };
        for field in entry.nested() {
            let field = field?;
            match field.kind {
                CTRL_ATTR_MCAST_GRP_ID => group.id = field.u32()?,
                CTRL_ATTR_MCAST_GRP_NAME => group.name = field.string()?.to_string(),
                _ => {}
            }
        }
        groups.push(group);
    }

    Ok(groups)
}
