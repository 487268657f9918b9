//! Premium-principal catalog used to authorize HIGH priority on the queued path.
//!
//! A caller's `X-User-Priority` header is only a claim (see
//! `ticketing_web::ClaimedPriority`); §4.5 requires the facade to
//! independently verify that claim against its own catalog of verified
//! premium/VIP principals before a request is actually enqueued at HIGH.
//! Full catalog administration (CRUD, tiers, expiry) is out of scope (§1) -
//! this is deliberately just a static set loaded once at startup.

use std::collections::HashSet;

use ticketing_core::UserId;

/// Verified premium/VIP principals, consulted when a request claims HIGH.
#[derive(Debug, Clone, Default)]
pub struct PremiumCatalog {
    users: HashSet<UserId>,
}

impl PremiumCatalog {
    /// Builds a catalog from a comma-separated list of user ids (as loaded
    /// from `PREMIUM_USER_IDS`, see [`crate::config::Config`]).
    #[must_use]
    pub fn new(user_ids: &[String]) -> Self {
        Self {
            users: user_ids
                .iter()
                .filter(|id| !id.is_empty())
                .map(|id| UserId::new(id.clone()))
                .collect(),
        }
    }

    /// Whether `user` is a verified premium/VIP principal.
    #[must_use]
    pub fn is_premium(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_listed_users_only() {
        let catalog = PremiumCatalog::new(&["vip-1".to_string(), "vip-2".to_string()]);
        assert!(catalog.is_premium(&UserId::new("vip-1")));
        assert!(!catalog.is_premium(&UserId::new("regular-1")));
    }

    #[test]
    fn empty_entries_are_ignored() {
        let catalog = PremiumCatalog::new(&[String::new()]);
        assert!(!catalog.is_premium(&UserId::new("")));
    }
}
