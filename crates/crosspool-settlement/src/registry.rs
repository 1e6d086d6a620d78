//! Append-only registry of onboarded strategies.

use std::collections::HashMap;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use crosspool_custody::Strategy;
use crosspool_types::{CrosspoolError, Result, StrategyId, StrategyRecord};

/// A strategy implementation together with what registration learned
/// about it.
pub struct RegisteredStrategy {
    pub record: StrategyRecord,
    pub strategy: Box<dyn Strategy>,
}

/// Strategies in registration order, indexed by id.
#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<RegisteredStrategy>,
    index: HashMap<StrategyId, usize>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the strategy's interface and check it answers to `manager`.
    ///
    /// # Errors
    /// - [`CrosspoolError::InvalidStrategyContract`] if any read fails
    /// - [`CrosspoolError::InvalidPoolingManager`] if the strategy reports
    ///   another manager
    pub fn inspect(
        strategy: &dyn Strategy,
        manager: Address,
        at: DateTime<Utc>,
    ) -> Result<StrategyRecord> {
        let id = strategy.id();
        let invalid = |err: CrosspoolError| CrosspoolError::InvalidStrategyContract {
            strategy: id,
            reason: err.to_string(),
        };

        let underlying_asset = strategy.underlying_asset().map_err(invalid)?;
        let yield_asset = strategy.yield_asset().map_err(invalid)?;
        let channel = strategy.channel().map_err(invalid)?;
        let actual = strategy.pooling_manager().map_err(invalid)?;
        let approve_target = strategy.address_to_approve().map_err(invalid)?;

        if actual != manager {
            return Err(CrosspoolError::InvalidPoolingManager {
                expected: manager,
                actual,
            });
        }

        Ok(StrategyRecord {
            strategy: id,
            underlying_asset,
            yield_asset,
            channel,
            approve_target,
            registered_at: at,
        })
    }

    /// Insert or replace. Re-registering keeps the original position and
    /// registration time. Returns `true` for a new strategy.
    pub fn insert(&mut self, mut record: StrategyRecord, strategy: Box<dyn Strategy>) -> bool {
        if let Some(&slot) = self.index.get(&record.strategy) {
            let entry = &mut self.entries[slot];
            record.registered_at = entry.record.registered_at;
            *entry = RegisteredStrategy { record, strategy };
            return false;
        }
        self.index.insert(record.strategy, self.entries.len());
        self.entries.push(RegisteredStrategy { record, strategy });
        true
    }

    #[must_use]
    pub fn get(&self, id: StrategyId) -> Option<&dyn Strategy> {
        self.entry(id).map(|entry| entry.strategy.as_ref())
    }

    pub fn get_mut(&mut self, id: StrategyId) -> Option<&mut (dyn Strategy + 'static)> {
        let slot = *self.index.get(&id)?;
        Some(self.entries[slot].strategy.as_mut())
    }

    #[must_use]
    pub fn record(&self, id: StrategyId) -> Option<&StrategyRecord> {
        self.entry(id).map(|entry| &entry.record)
    }

    /// All records in registration order.
    pub fn records(&self) -> impl Iterator<Item = &StrategyRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    #[must_use]
    pub fn contains(&self, id: StrategyId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: StrategyId) -> Option<&RegisteredStrategy> {
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crosspool_custody::VaultStrategy;
    use crosspool_custody::testing::{BrokenStrategy, MockVault};
    use crosspool_types::{AssetId, ChannelId};

    use super::*;

    fn manager() -> Address {
        Address::repeat_byte(0x11)
    }

    fn vault_strategy(id: u8, manager: Address) -> VaultStrategy<MockVault> {
        let vault = Arc::new(MockVault::new(
            Address::repeat_byte(0x5a),
            AssetId(Address::repeat_byte(0xee)),
        ));
        VaultStrategy::new(
            StrategyId(Address::with_last_byte(id)),
            manager,
            ChannelId(Address::repeat_byte(0xb1)),
            vault,
        )
    }

    #[test]
    fn inspect_reads_interface() {
        let strategy = vault_strategy(1, manager());
        let record = StrategyRegistry::inspect(&strategy, manager(), Utc::now()).unwrap();
        assert_eq!(record.strategy, strategy.id());
        assert_eq!(record.underlying_asset, AssetId(Address::repeat_byte(0xee)));
        assert_eq!(record.yield_asset, AssetId(Address::repeat_byte(0x5a)));
        assert_eq!(record.channel, ChannelId(Address::repeat_byte(0xb1)));
        assert_eq!(record.approve_target, Address::repeat_byte(0x5a));
    }

    #[test]
    fn inspect_rejects_foreign_manager() {
        let other = Address::repeat_byte(0x12);
        let strategy = vault_strategy(1, other);
        let err = StrategyRegistry::inspect(&strategy, manager(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            CrosspoolError::InvalidPoolingManager {
                expected: manager(),
                actual: other,
            }
        );
    }

    #[test]
    fn inspect_rejects_broken_contract() {
        let strategy = BrokenStrategy::new(StrategyId(Address::with_last_byte(9)));
        let err = StrategyRegistry::inspect(&strategy, manager(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CrosspoolError::InvalidStrategyContract { strategy, .. }
                if strategy == StrategyId(Address::with_last_byte(9))
        ));
    }

    #[test]
    fn insert_keeps_order_and_first_timestamp() {
        let mut registry = StrategyRegistry::new();
        assert!(registry.is_empty());

        let first = vault_strategy(1, manager());
        let second = vault_strategy(2, manager());
        let r1 = StrategyRegistry::inspect(&first, manager(), Utc::now()).unwrap();
        let r2 = StrategyRegistry::inspect(&second, manager(), Utc::now()).unwrap();
        let original_time = r1.registered_at;
        assert!(registry.insert(r1.clone(), Box::new(first)));
        assert!(registry.insert(r2, Box::new(second)));

        let again = vault_strategy(1, manager());
        let mut later = r1;
        later.registered_at = original_time + chrono::Duration::seconds(60);
        assert!(!registry.insert(later, Box::new(again)));

        assert_eq!(registry.len(), 2);
        let ids: Vec<_> = registry.records().map(|r| r.strategy).collect();
        assert_eq!(
            ids,
            vec![
                StrategyId(Address::with_last_byte(1)),
                StrategyId(Address::with_last_byte(2)),
            ]
        );
        let record = registry
            .record(StrategyId(Address::with_last_byte(1)))
            .unwrap();
        assert_eq!(record.registered_at, original_time);
    }

    #[test]
    fn lookups() {
        let mut registry = StrategyRegistry::new();
        let strategy = vault_strategy(1, manager());
        let id = strategy.id();
        let record = StrategyRegistry::inspect(&strategy, manager(), Utc::now()).unwrap();
        registry.insert(record, Box::new(strategy));

        assert!(registry.contains(id));
        assert_eq!(registry.get(id).map(|s| s.id()), Some(id));
        assert!(registry.get_mut(id).is_some());

        let unknown = StrategyId(Address::with_last_byte(7));
        assert!(!registry.contains(unknown));
        assert!(registry.get(unknown).is_none());
        assert!(registry.record(unknown).is_none());
    }
}
