//! The pooling manager and its report settlement loop.
//!
//! Every state-changing operation takes the ledger it acts on and an
//! explicit [`CallContext`]. Ledger writes made by a failed call are never
//! committed; the manager's own bookkeeping (registry, channels, events)
//! is only touched once the ledger side has succeeded.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use chrono::Utc;
use crosspool_codec::{DigestMode, acknowledgement_digest, acknowledgement_payload, hash_from_report};
use crosspool_custody::{Channel, Ledger, MessageRelay, Strategy, Venue, WrappedNative};
use crosspool_types::amount::wad_to_decimal;
use crosspool_types::{
    Acknowledgement, Amount, AssetId, CallContext, ChannelId, CrosspoolError, Epoch, ItemOutcome,
    ManagerConfig, PoolingEvent, ReportBatch, ReportFees, ReportHandled, Result, Role,
    SlippageConfig, StrategyAction, StrategyId, StrategyRecord, StrategyReportItem,
};
use tracing::{debug, info, warn};

use crate::{AccessControl, MessageAuthenticator, StrategyRegistry};

/// What the atomic part of a settlement produced.
struct Settlement {
    reports: Vec<StrategyReportItem>,
    outcomes: Vec<ItemOutcome>,
    acknowledgement: Acknowledgement,
}

/// Custodian of pooled underlying on the local ledger.
pub struct PoolingManager {
    config: ManagerConfig,
    access: AccessControl,
    authenticator: MessageAuthenticator,
    registry: StrategyRegistry,
    channels: HashMap<ChannelId, Arc<dyn Channel>>,
    /// Call targets of prepared deposits, keyed by venue address.
    venues: HashMap<Address, Arc<dyn Venue>>,
    relay: Arc<dyn MessageRelay>,
    /// The native channel and the wrapped asset its funds are held in.
    native: Option<(ChannelId, WrappedNative)>,
    events: Vec<PoolingEvent>,
    last_epoch: Option<Epoch>,
}

impl PoolingManager {
    /// Build a manager from a validated config. The configured relayers
    /// are granted the relayer role.
    pub fn new(config: ManagerConfig, relay: Arc<dyn MessageRelay>) -> Result<Self> {
        config.validate()?;
        let mut access = AccessControl::new(config.admin);
        let bootstrap = CallContext::new(config.admin);
        for relayer in &config.relayers {
            access.grant_role(&bootstrap, Role::Relayer, *relayer)?;
        }
        let native = config
            .native_bridge
            .map(|bridge| WrappedNative::new(bridge.wrapped_asset).map(|w| (bridge.channel, w)))
            .transpose()?;
        info!(
            manager = %config.address,
            remote = %config.remote_manager,
            relayers = config.relayers.len(),
            "pooling manager created"
        );
        Ok(Self {
            authenticator: MessageAuthenticator::from_config(&config),
            config,
            access,
            registry: StrategyRegistry::new(),
            channels: HashMap::new(),
            venues: HashMap::new(),
            relay,
            native,
            events: Vec::new(),
            last_epoch: None,
        })
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Address {
        self.config.address
    }

    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    #[must_use]
    pub fn authenticator(&self) -> &MessageAuthenticator {
        &self.authenticator
    }

    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[must_use]
    pub fn strategy(&self, id: StrategyId) -> Option<&dyn Strategy> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&Arc<dyn Channel>> {
        self.channels.get(&id)
    }

    /// Everything emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[PoolingEvent] {
        &self.events
    }

    /// Epoch of the most recently settled batch.
    #[must_use]
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.last_epoch
    }

    /// Digest of `batch` in either direction.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn hash_from_report(&self, batch: &ReportBatch, mode: DigestMode) -> B256 {
        hash_from_report(batch, mode)
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    pub fn grant_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> Result<bool> {
        self.access.grant_role(ctx, role, account)
    }

    pub fn revoke_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> Result<bool> {
        self.access.revoke_role(ctx, role, account)
    }

    /// Make a channel available to strategies and report items.
    ///
    /// The configured native bridge must carry the native asset.
    pub fn register_channel(&mut self, ctx: &CallContext, channel: Arc<dyn Channel>) -> Result<()> {
        self.access.ensure_role(Role::Admin, ctx.caller)?;
        let id = channel.id();
        if self.wrapper_for(id).is_some() && !channel.asset().is_native() {
            return Err(CrosspoolError::Configuration(format!(
                "native bridge {id} carries {}",
                channel.asset()
            )));
        }
        self.channels.insert(id, channel);
        info!(channel = %id, "channel registered");
        self.events.push(PoolingEvent::ChannelRegistered {
            channel: id,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Onboard a strategy.
    ///
    /// The manager grants an unlimited underlying allowance to the
    /// strategy's channel and to its approve target. Registering the same
    /// strategy again re-issues the same allowances and replaces the
    /// implementation.
    ///
    /// # Errors
    /// - [`CrosspoolError::AccessControlUnauthorizedAccount`] unless admin
    /// - [`CrosspoolError::InvalidStrategyContract`] if a read fails
    /// - [`CrosspoolError::InvalidPoolingManager`] if it serves another manager
    /// - [`CrosspoolError::UnknownChannel`] if its channel is not registered
    pub fn register_strategy(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        strategy: Box<dyn Strategy>,
    ) -> Result<StrategyRecord> {
        self.access.ensure_role(Role::Admin, ctx.caller)?;
        let me = self.address();
        let record = StrategyRegistry::inspect(strategy.as_ref(), me, Utc::now())?;
        let venue = strategy
            .venue()
            .map_err(|err| CrosspoolError::InvalidStrategyContract {
                strategy: record.strategy,
                reason: err.to_string(),
            })?;
        if !self.channels.contains_key(&record.channel) {
            return Err(CrosspoolError::UnknownChannel(record.channel));
        }

        ledger.approve(record.underlying_asset, me, record.channel.address(), U256::MAX);
        ledger.approve(record.underlying_asset, me, record.approve_target, U256::MAX);
        self.venues.insert(venue.address(), venue);

        let fresh = self.registry.insert(record.clone(), strategy);
        let record = self
            .registry
            .record(record.strategy)
            .cloned()
            .ok_or(CrosspoolError::UnknownStrategy(record.strategy))?;
        info!(
            strategy = %record.strategy,
            underlying = %record.underlying_asset.short(),
            channel = %record.channel,
            fresh,
            "strategy registered"
        );
        self.events.push(PoolingEvent::StrategyRegistered {
            strategy: record.strategy,
            at: Utc::now(),
        });
        Ok(record)
    }

    /// Set a swap strategy's minimum received factor (18-decimal).
    pub fn set_strategy_slippage(
        &mut self,
        ctx: &CallContext,
        strategy: StrategyId,
        factor: U256,
    ) -> Result<()> {
        self.access.ensure_role(Role::Admin, ctx.caller)?;
        let me = self.address();
        self.registry
            .get_mut(strategy)
            .ok_or(CrosspoolError::UnknownStrategy(strategy))?
            .set_min_received_factor(me, factor)?;
        info!(
            strategy = %strategy,
            factor = %wad_to_decimal(factor).map_or_else(|| factor.to_string(), |d| d.to_string()),
            "strategy slippage updated"
        );
        self.events.push(PoolingEvent::StrategySlippageUpdated {
            strategy,
            factor,
            at: Utc::now(),
        });
        Ok(())
    }

    /// [`Self::set_strategy_slippage`] from a decimal setting such as `0.98`.
    pub fn apply_slippage_config(
        &mut self,
        ctx: &CallContext,
        strategy: StrategyId,
        config: &SlippageConfig,
    ) -> Result<()> {
        let factor = config.factor_wad()?;
        self.set_strategy_slippage(ctx, strategy, factor)
    }

    /// Ask `channel` to cancel an outbound deposit the manager made.
    pub fn cancel_channel_deposit(
        &self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        channel: ChannelId,
        amount: Amount,
        nonce: U256,
    ) -> Result<()> {
        self.access.ensure_role(Role::Admin, ctx.caller)?;
        let channel = self.known_channel(channel)?;
        let me = self.address();
        ledger.transact(|tx| channel.cancel_pending_inbound(tx, me, amount, nonce))?;
        info!(channel = %channel.id(), amount = %amount, nonce = %nonce, "deposit cancel requested");
        Ok(())
    }

    /// Reclaim a cancelled deposit into the manager's balance. Funds
    /// reclaimed from the native bridge are wrapped.
    pub fn claim_cancelled_deposit(
        &self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        channel: ChannelId,
        amount: Amount,
        nonce: U256,
    ) -> Result<()> {
        self.access.ensure_role(Role::Admin, ctx.caller)?;
        let channel = self.known_channel(channel)?;
        let me = self.address();
        let asset = channel.asset();
        let wrapper = self.wrapper_for(channel.id());
        ledger.transact(|tx| {
            channel.claim_cancelled(tx, me, asset, amount, nonce)?;
            match wrapper {
                Some(wrapper) => wrapper.wrap(tx, me, amount),
                None => Ok(()),
            }
        })?;
        info!(channel = %channel.id(), amount = %amount, nonce = %nonce, "cancelled deposit claimed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Settle one report batch relayed from the remote manager.
    ///
    /// `ctx.value` must cover both fees; it moves to the manager's native
    /// balance as part of the batch. The channel fee is paid once, with the
    /// first outbound push, however many deposit items forward funds.
    /// On success the finalized reports are
    /// acknowledged through the relay and a [`PoolingEvent::ReportHandled`]
    /// is emitted. On any error the ledger is untouched and the relayed
    /// message stays pending.
    ///
    /// # Errors
    /// - [`CrosspoolError::AccessControlUnauthorizedAccount`] unless relayer
    /// - [`CrosspoolError::InsufficientFee`] if `ctx.value` is short
    /// - [`CrosspoolError::UnauthenticatedBatch`] if no message is pending
    /// - channel, relay and balance errors from funding and forwarding
    pub fn handle_report(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        batch: &ReportBatch,
        fees: ReportFees,
    ) -> Result<ReportHandled> {
        self.access.ensure_role(Role::Relayer, ctx.caller)?;
        let required = fees.total()?;
        if ctx.value < required {
            return Err(CrosspoolError::InsufficientFee {
                required,
                provided: ctx.value,
            });
        }
        if let Some(last) = self.last_epoch.filter(|last| batch.epoch <= *last) {
            warn!(epoch = %batch.epoch, last = %last, "report epoch does not advance");
        }

        let settlement = ledger.transact(|tx| self.settle(tx, ctx, batch, fees))?;

        let handled = ReportHandled {
            epoch: batch.epoch,
            reports: settlement.reports,
            outcomes: settlement.outcomes,
            acknowledgement: settlement.acknowledgement,
            handled_at: Utc::now(),
        };
        let processed = handled.reports.iter().filter(|r| r.processed).count();
        info!(
            epoch = %handled.epoch,
            reports = handled.reports.len(),
            processed,
            ack = %handled.acknowledgement.digest,
            "report handled"
        );
        self.last_epoch = Some(batch.epoch);
        self.events.push(PoolingEvent::ReportHandled(handled.clone()));
        Ok(handled)
    }

    fn settle(
        &self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        batch: &ReportBatch,
        fees: ReportFees,
    ) -> Result<Settlement> {
        let me = self.address();
        if !ctx.value.is_zero() {
            ledger.transfer(AssetId::NATIVE, ctx.caller, me, ctx.value)?;
        }

        // Consumed before any strategy or channel is called.
        let auth = self
            .authenticator
            .authenticate(self.relay.as_ref(), ledger, batch)?;

        for item in &batch.withdraw_items {
            let channel = self.known_channel(item.channel)?;
            let received = channel.pull(ledger, me, item.amount)?;
            if let Some(wrapper) = self.wrapper_for(item.channel) {
                wrapper.wrap(ledger, me, received)?;
            }
            debug!(channel = %item.channel, requested = %item.amount, received = %received, "funding pulled");
        }

        let results: Vec<Result<Amount>> = batch
            .strategy_reports
            .iter()
            .map(|report| ledger.transact(|tx| self.dispatch(tx, report)))
            .collect();

        let mut reports = Vec::with_capacity(results.len());
        let mut outcomes = Vec::with_capacity(results.len());
        let mut owed: HashMap<ChannelId, Amount> = HashMap::new();
        for (index, (report, result)) in batch.strategy_reports.iter().zip(results).enumerate() {
            let mut finalized = *report;
            let outcome = match result {
                Ok(realized) => {
                    finalized.processed = true;
                    if report.action == StrategyAction::Withdraw {
                        if let Some(record) = self.registry.record(report.strategy) {
                            let entry = owed.entry(record.channel).or_default();
                            *entry = entry.saturating_add(realized);
                        }
                    }
                    ItemOutcome {
                        index,
                        strategy: report.strategy,
                        action: report.action,
                        processed: true,
                        realized,
                        failure: None,
                    }
                }
                Err(err) => {
                    finalized.processed = false;
                    warn!(
                        epoch = %batch.epoch,
                        index,
                        strategy = %report.strategy,
                        action = %report.action,
                        error = %err,
                        "strategy report failed"
                    );
                    ItemOutcome {
                        index,
                        strategy: report.strategy,
                        action: report.action,
                        processed: false,
                        realized: Amount::ZERO,
                        failure: Some(err.to_string()),
                    }
                }
            };
            reports.push(finalized);
            outcomes.push(outcome);
        }

        // One channel fee covers the whole batch; it rides on the first push.
        let mut channel_fee = fees.inbound_channel_fee;
        for item in &batch.deposit_items {
            let available = owed.get(&item.channel).copied().unwrap_or_default();
            let amount = item.amount.min(available);
            if amount.is_zero() {
                debug!(channel = %item.channel, requested = %item.amount, "nothing realized to forward");
                continue;
            }
            let channel = self.known_channel(item.channel)?;
            if let Some(wrapper) = self.wrapper_for(item.channel) {
                wrapper.unwrap(ledger, me, amount)?;
            }
            let nonce = channel.push(ledger, me, amount, channel_fee)?;
            channel_fee = Amount::ZERO;
            owed.insert(item.channel, available - amount);
            debug!(channel = %item.channel, amount = %amount, nonce = %nonce, "realized funds forwarded");
        }

        let digest = acknowledgement_digest(&reports);
        let payload = acknowledgement_payload(batch.epoch, digest);
        let message = self.relay.send(
            ledger,
            me,
            self.config.remote_manager,
            self.config.acknowledgement_selector,
            &payload,
            fees.outbound_messaging_fee,
        )?;
        debug!(
            inbound = %auth.key,
            outbound = %message.key,
            nonce = %message.nonce,
            "acknowledgement sent"
        );

        Ok(Settlement {
            reports,
            outcomes,
            acknowledgement: Acknowledgement {
                digest,
                key: message.key,
                nonce: message.nonce,
            },
        })
    }

    /// Run one strategy report. Returns the underlying moved.
    fn dispatch(&self, ledger: &mut Ledger, report: &StrategyReportItem) -> Result<Amount> {
        let strategy = self
            .registry
            .get(report.strategy)
            .ok_or(CrosspoolError::UnknownStrategy(report.strategy))?;
        match report.action {
            StrategyAction::Deposit => {
                let prepared = strategy.deposit_preparation(ledger, report.amount)?;
                let venue =
                    self.venues
                        .get(&prepared.target)
                        .ok_or_else(|| CrosspoolError::VenueFailure {
                            venue: prepared.target,
                            reason: "unknown call target".into(),
                        })?;
                venue.execute(ledger, self.address(), &prepared.call)?;
                Ok(report.amount)
            }
            StrategyAction::Withdraw => strategy.withdraw(ledger, self.address(), report.amount),
            StrategyAction::Update => Ok(Amount::ZERO),
        }
    }

    fn wrapper_for(&self, channel: ChannelId) -> Option<&WrappedNative> {
        self.native
            .as_ref()
            .filter(|(native, _)| *native == channel)
            .map(|(_, wrapper)| wrapper)
    }

    fn known_channel(&self, id: ChannelId) -> Result<&Arc<dyn Channel>> {
        self.channels
            .get(&id)
            .ok_or(CrosspoolError::UnknownChannel(id))
    }
}

#[cfg(test)]
mod tests {
    use crosspool_custody::LedgerRelay;

    use super::*;

    fn config() -> ManagerConfig {
        ManagerConfig::new(
            Address::with_last_byte(0x0a),
            U256::from(0xbeefu64),
            Address::with_last_byte(0xad),
        )
        .with_relayer(Address::with_last_byte(0x7e))
    }

    fn manager() -> PoolingManager {
        let relay: Arc<dyn MessageRelay> = Arc::new(LedgerRelay::new(Address::repeat_byte(0x50)));
        PoolingManager::new(config(), relay).unwrap()
    }

    #[test]
    fn new_grants_configured_relayers() {
        let manager = manager();
        assert_eq!(manager.address(), Address::with_last_byte(0x0a));
        assert!(
            manager
                .access()
                .has_role(Role::Relayer, Address::with_last_byte(0x7e))
        );
        assert!(
            manager
                .access()
                .has_role(Role::Admin, Address::with_last_byte(0xad))
        );
        assert!(manager.events().is_empty());
        assert_eq!(manager.last_epoch(), None);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut bad = config();
        bad.remote_manager = U256::ZERO;
        let relay: Arc<dyn MessageRelay> = Arc::new(LedgerRelay::new(Address::repeat_byte(0x50)));
        assert!(matches!(
            PoolingManager::new(bad, relay),
            Err(CrosspoolError::Configuration(_))
        ));
    }

    #[test]
    fn hash_from_report_matches_codec() {
        let manager = manager();
        let batch = ReportBatch::new(Epoch::new(3)).with_report(
            StrategyId(Address::with_last_byte(2)),
            StrategyAction::Update,
            U256::from(1u8),
        );
        assert_eq!(
            manager.hash_from_report(&batch, DigestMode::RemoteToLocal),
            crosspool_codec::report_digest(&batch)
        );
        assert_eq!(
            manager.hash_from_report(&batch, DigestMode::LocalToRemote),
            acknowledgement_digest(&batch.strategy_reports)
        );
    }

    #[test]
    fn fee_check_precedes_authentication() {
        let mut manager = manager();
        let mut ledger = Ledger::new();
        let ctx = CallContext::new(Address::with_last_byte(0x7e));
        let err = manager
            .handle_report(
                &mut ledger,
                &ctx,
                &ReportBatch::new(Epoch::new(1)),
                ReportFees::new(U256::from(1u8), U256::ZERO),
            )
            .unwrap_err();
        assert!(matches!(err, CrosspoolError::InsufficientFee { .. }));
    }

    #[test]
    fn unrelayed_batch_is_unauthenticated() {
        let mut manager = manager();
        let mut ledger = Ledger::new();
        let ctx = CallContext::new(Address::with_last_byte(0x7e));
        let err = manager
            .handle_report(
                &mut ledger,
                &ctx,
                &ReportBatch::new(Epoch::new(1)),
                ReportFees::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CrosspoolError::UnauthenticatedBatch { .. }));
        assert!(manager.events().is_empty());
    }

    #[test]
    fn channel_registration_is_admin_only() {
        use crosspool_custody::testing::MockChannel;

        let mut manager = manager();
        let channel = Arc::new(MockChannel::new(
            ChannelId(Address::with_last_byte(1)),
            AssetId(Address::repeat_byte(0xee)),
        ));
        let err = manager
            .register_channel(&CallContext::new(Address::with_last_byte(0x7e)), channel.clone())
            .unwrap_err();
        assert!(matches!(
            err,
            CrosspoolError::AccessControlUnauthorizedAccount { .. }
        ));
        assert!(manager.channel(ChannelId(Address::with_last_byte(1))).is_none());

        manager
            .register_channel(&CallContext::new(Address::with_last_byte(0xad)), channel)
            .unwrap();
        assert!(manager.channel(ChannelId(Address::with_last_byte(1))).is_some());
        assert_eq!(manager.events().len(), 1);
    }
}
