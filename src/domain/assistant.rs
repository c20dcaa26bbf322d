//! Voice assistant (persona) record

use serde::{Deserialize, Serialize};

use crate::id::{ASSISTANT_PREFIX, generate_id};
use crate::storage::HasId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assistant {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    /// Assistant id on the voice provider side
    pub external_id: Option<String>,
}

impl Assistant {
    pub fn new(organization_id: impl Into<String>, name: impl Into<String>, external_id: Option<String>) -> Self {
        Self {
            id: generate_id(ASSISTANT_PREFIX),
            organization_id: organization_id.into(),
            name: name.into(),
            external_id,
        }
    }

    /// The provider id, if one is configured and non-blank
    pub fn provider_id(&self) -> Option<&str> {
        self.external_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

impl HasId for Assistant {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_rejects_blank() {
        assert_eq!(Assistant::new("org", "Léa", None).provider_id(), None);
        assert_eq!(Assistant::new("org", "Léa", Some("  ".into())).provider_id(), None);
        assert_eq!(Assistant::new("org", "Léa", Some("asst_42".into())).provider_id(), Some("asst_42"));
    }
}
