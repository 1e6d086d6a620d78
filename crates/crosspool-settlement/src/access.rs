//! Role membership for the pooling manager.
//!
//! Two roles exist. Admins register strategies and channels, tune slippage
//! and manage membership; relayers submit report batches. The admin role
//! administers both roles, including itself.

use std::collections::{BTreeSet, HashMap};

use alloy_primitives::Address;
use crosspool_types::{CallContext, CrosspoolError, Result, Role};
use tracing::info;

/// Role membership table.
///
/// There is no ambient sender: every check names the account explicitly,
/// usually `ctx.caller`.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    members: HashMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    /// A table where `admin` holds the admin role and nobody is a relayer.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        let mut access = Self::default();
        access.insert(Role::Admin, admin);
        access
    }

    #[must_use]
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(&account))
    }

    /// # Errors
    /// [`CrosspoolError::AccessControlUnauthorizedAccount`] if `account`
    /// lacks `role`.
    pub fn ensure_role(&self, role: Role, account: Address) -> Result<()> {
        if self.has_role(role, account) {
            return Ok(());
        }
        Err(CrosspoolError::AccessControlUnauthorizedAccount { account, role })
    }

    /// Grant `role` to `account`. Returns `false` if it already held it.
    pub fn grant_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> Result<bool> {
        self.ensure_role(Role::Admin, ctx.caller)?;
        let granted = self.insert(role, account);
        if granted {
            info!(role = %role, account = %account, by = %ctx.caller, "role granted");
        }
        Ok(granted)
    }

    /// Revoke `role` from `account`. Returns `false` if it did not hold it.
    pub fn revoke_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
    ) -> Result<bool> {
        self.ensure_role(Role::Admin, ctx.caller)?;
        let revoked = self
            .members
            .get_mut(&role)
            .is_some_and(|members| members.remove(&account));
        if revoked {
            info!(role = %role, account = %account, by = %ctx.caller, "role revoked");
        }
        Ok(revoked)
    }

    /// Holders of `role`, in address order.
    #[must_use]
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::with_last_byte(0xad)
    }

    fn relayer() -> Address {
        Address::with_last_byte(0x7e)
    }

    #[test]
    fn admin_holds_admin_role_only() {
        let access = AccessControl::new(admin());
        assert!(access.has_role(Role::Admin, admin()));
        assert!(!access.has_role(Role::Relayer, admin()));
        assert!(access.members(Role::Relayer).is_empty());
    }

    #[test]
    fn ensure_role_names_account_and_role() {
        let access = AccessControl::new(admin());
        let err = access.ensure_role(Role::Relayer, relayer()).unwrap_err();
        assert_eq!(
            err,
            CrosspoolError::AccessControlUnauthorizedAccount {
                account: relayer(),
                role: Role::Relayer,
            }
        );
    }

    #[test]
    fn grant_and_revoke() {
        let mut access = AccessControl::new(admin());
        let ctx = CallContext::new(admin());

        assert!(access.grant_role(&ctx, Role::Relayer, relayer()).unwrap());
        assert!(!access.grant_role(&ctx, Role::Relayer, relayer()).unwrap());
        access.ensure_role(Role::Relayer, relayer()).unwrap();
        assert_eq!(access.members(Role::Relayer), vec![relayer()]);

        assert!(access.revoke_role(&ctx, Role::Relayer, relayer()).unwrap());
        assert!(!access.revoke_role(&ctx, Role::Relayer, relayer()).unwrap());
        assert!(!access.has_role(Role::Relayer, relayer()));
    }

    #[test]
    fn only_admin_manages_roles() {
        let mut access = AccessControl::new(admin());
        let ctx = CallContext::new(relayer());
        let err = access
            .grant_role(&ctx, Role::Relayer, relayer())
            .unwrap_err();
        assert!(matches!(
            err,
            CrosspoolError::AccessControlUnauthorizedAccount {
                role: Role::Admin,
                ..
            }
        ));
        assert!(!access.has_role(Role::Relayer, relayer()));
    }

    #[test]
    fn admin_can_add_another_admin() {
        let mut access = AccessControl::new(admin());
        let second = Address::with_last_byte(0xae);
        access
            .grant_role(&CallContext::new(admin()), Role::Admin, second)
            .unwrap();
        access
            .grant_role(&CallContext::new(second), Role::Relayer, relayer())
            .unwrap();
        assert!(access.has_role(Role::Relayer, relayer()));
    }
}
