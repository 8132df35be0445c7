//! Reference data: bases and asset types.

use serde::{Deserialize, Serialize};

use armory_core::{AssetTypeId, BaseId, DomainError, DomainResult, Entity};

/// A physical location holding assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub id: BaseId,
    pub name: String,
}

impl Base {
    /// Register a new base. The name is trimmed and must not be empty.
    pub fn register(name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: BaseId::new(),
            name: normalized_name(name, "base")?,
        })
    }
}

impl Entity for Base {
    type Id = BaseId;

    fn id(&self) -> BaseId {
        self.id
    }
}

/// A category of fungible equipment or supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    pub id: AssetTypeId,
    pub name: String,
}

impl AssetType {
    /// Register a new asset type. The name is trimmed and must not be empty.
    pub fn register(name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: AssetTypeId::new(),
            name: normalized_name(name, "asset type")?,
        })
    }
}

impl Entity for AssetType {
    type Id = AssetTypeId;

    fn id(&self) -> AssetTypeId {
        self.id
    }
}

const MAX_NAME_LEN: usize = 100;

fn normalized_name(name: &str, what: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{what} name cannot be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{what} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
