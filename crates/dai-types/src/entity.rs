use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Address of a content entity: its type name plus its id within that type.
///
/// Entity types are open-ended strings (`node`, `paragraph`, `block_content`,
/// `menu_link_content`, `media`, ...). Behavior never switches on the type
/// name; the content graph decides what an entity can do.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = TypeError;

    /// Parse the `type/id` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity_type, id) = s
            .split_once('/')
            .ok_or_else(|| TypeError::InvalidEntityRef(s.to_string()))?;
        if entity_type.is_empty() || id.is_empty() {
            return Err(TypeError::InvalidEntityRef(s.to_string()));
        }
        Ok(Self::new(entity_type, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        let e = EntityRef::new("node", "42");
        assert_eq!(e.to_string(), "node/42");
        assert_eq!("node/42".parse::<EntityRef>().unwrap(), e);
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!("node".parse::<EntityRef>().is_err());
        assert!("/42".parse::<EntityRef>().is_err());
        assert!("node/".parse::<EntityRef>().is_err());
    }
}
