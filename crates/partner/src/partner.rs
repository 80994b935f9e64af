use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_core::{PartnerId, UserId, slugify};

/// A fulfilment partner. Its users may manage the partner's stock records
/// (and, through them, the products those records belong to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    id: PartnerId,
    pub name: String,
    code: String,
    users: BTreeSet<UserId>,
}

impl Partner {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: PartnerId::new(),
            code: slugify(&name),
            name,
            users: BTreeSet::new(),
        }
    }

    pub fn id_typed(&self) -> PartnerId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn with_user(mut self, user: UserId) -> Self {
        self.users.insert(user);
        self
    }

    pub fn add_user(&mut self, user: UserId) -> bool {
        self.users.insert(user)
    }

    pub fn remove_user(&mut self, user: UserId) -> bool {
        self.users.remove(&user)
    }

    pub fn has_user(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.iter().copied()
    }
}
