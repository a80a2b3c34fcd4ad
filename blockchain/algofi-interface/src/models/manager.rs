use crate::common::{Address, LedgerReader};
use crate::math::ProtocolParams;
use crate::models::market::Market;
use crate::models::rewards_program::{RewardsCheckpoint, RewardsProgram};
use crate::rewards::project_unrealized_rewards;
use crate::state::keys::manager as keys;
use crate::state::LedgerState;
use common::registry::SchemaVersion;
use common::{LendingError, ManagerStorageState, UnrealizedRewards};

/// Snapshot of the manager application and its rewards program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    pub app_id: u64,
    pub address: Address,
    pub schema_version: SchemaVersion,
    pub rewards_program: RewardsProgram,
    market_counters: Vec<u64>,
}

impl Manager {
    pub fn from_state(
        app_id: u64,
        state: &LedgerState,
        schema_version: SchemaVersion,
        market_counters: &[u64],
    ) -> Self {
        Self {
            app_id,
            address: Address::for_application(app_id),
            schema_version,
            rewards_program: RewardsProgram::from_state(state, schema_version, market_counters),
            market_counters: market_counters.to_vec(),
        }
    }

    pub fn load<R: LedgerReader + ?Sized>(
        reader: &R,
        app_id: u64,
        schema_version: SchemaVersion,
        market_counters: &[u64],
    ) -> Result<Self, LendingError> {
        let state = reader.global_state(app_id)?;
        Ok(Self::from_state(app_id, &state, schema_version, market_counters))
    }

    pub fn refresh<R: LedgerReader + ?Sized>(&mut self, reader: &R) -> Result<(), LendingError> {
        let state = reader.global_state(self.app_id)?;
        self.rewards_program = RewardsProgram::from_state(&state, self.schema_version, &self.market_counters);
        Ok(())
    }

    pub fn market_counters(&self) -> &[u64] {
        &self.market_counters
    }

    /// Storage account recorded in the user's local state
    pub fn storage_address<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        user_address: &str,
    ) -> Result<Address, LendingError> {
        let local = reader.local_state(user_address, self.app_id)?;
        storage_address_from(&local, user_address)
    }

    pub fn storage_state<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        storage_address: &Address,
    ) -> Result<ManagerStorageState, LendingError> {
        let local = reader.local_state(&storage_address.encode(), self.app_id)?;
        Ok(ManagerStorageState {
            user_global_max_borrow_in_dollars: local.get_uint(keys::USER_GLOBAL_MAX_BORROW_IN_DOLLARS),
            user_global_borrowed_in_dollars: local.get_uint(keys::USER_GLOBAL_BORROWED_IN_DOLLARS),
        })
    }

    pub fn rewards_checkpoint<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        storage_address: &Address,
    ) -> Result<RewardsCheckpoint, LendingError> {
        let local = reader.local_state(&storage_address.encode(), self.app_id)?;
        Ok(RewardsCheckpoint::from_state(&local, &self.market_counters))
    }

    /// Checkpoint as of a past round, read through the historical indexer
    pub fn rewards_checkpoint_at<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        storage_address: &Address,
        round: u64,
    ) -> Result<RewardsCheckpoint, LendingError> {
        let local = reader.local_state_at(&storage_address.encode(), self.app_id, round)?;
        Ok(RewardsCheckpoint::from_state(&local, &self.market_counters))
    }

    /// Project the storage account's claimable rewards across `markets` at `now`
    pub fn unrealized_rewards<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        storage_address: &Address,
        markets: &[&Market],
        now: u64,
        protocol: &ProtocolParams,
    ) -> Result<UnrealizedRewards, LendingError> {
        let checkpoint = self.rewards_checkpoint(reader, storage_address)?;
        let accruals = markets
            .iter()
            .map(|market| {
                let user = market.storage_state(reader, storage_address, protocol)?;
                market.accrual(user, protocol)
            })
            .collect::<Result<Vec<_>, LendingError>>()?;

        project_unrealized_rewards(
            &self.rewards_program,
            &self.rewards_program.distribution(),
            &checkpoint,
            &accruals,
            now,
            protocol,
        )
    }
}

pub(crate) fn storage_address_from(local: &LedgerState, user_address: &str) -> Result<Address, LendingError> {
    let raw = local.get_bytes(keys::USER_STORAGE_ADDRESS);
    if raw.is_empty() {
        return Err(LendingError::NoStorageAccount(user_address.to_string()));
    }
    Address::from_slice(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryLedger;

    const MANAGER: u64 = 465818260;

    fn user() -> String {
        Address::new([1u8; 32]).encode()
    }

    #[test]
    fn test_storage_address_lookup() {
        let storage = Address::new([2u8; 32]);
        let ledger = MemoryLedger::new()
            .with_global_state(MANAGER, LedgerState::new())
            .with_local_state(
                &user(),
                MANAGER,
                LedgerState::new().with_bytes(keys::USER_STORAGE_ADDRESS, storage.as_bytes().to_vec()),
            );
        let manager = Manager::load(&ledger, MANAGER, SchemaVersion::V1, &[1]).unwrap();
        assert_eq!(manager.storage_address(&ledger, &user()).unwrap(), storage);
        assert!(matches!(
            manager.storage_address(&ledger, &Address::new([3u8; 32]).encode()),
            Err(LendingError::NoStorageAccount(_))
        ));
    }

    #[test]
    fn test_storage_state_and_history() {
        let storage = Address::new([2u8; 32]);
        let local = LedgerState::new()
            .with_uint(keys::USER_GLOBAL_MAX_BORROW_IN_DOLLARS, 900)
            .with_uint(keys::USER_GLOBAL_BORROWED_IN_DOLLARS, 300)
            .with_uint(keys::USER_REWARDS_PROGRAM_NUMBER, 2)
            .with_uint(keys::USER_PENDING_REWARDS, 12);
        let ledger = MemoryLedger::new()
            .with_global_state(MANAGER, LedgerState::new())
            .with_local_state(&storage.encode(), MANAGER, local.clone())
            .with_local_state_at(&storage.encode(), MANAGER, 20_000_000, local);
        let manager = Manager::load(&ledger, MANAGER, SchemaVersion::V1, &[1, 2]).unwrap();

        let state = manager.storage_state(&ledger, &storage).unwrap();
        assert_eq!(state.user_global_max_borrow_in_dollars, 900);
        assert_eq!(state.user_global_borrowed_in_dollars, 300);

        let checkpoint = manager.rewards_checkpoint_at(&ledger, &storage, 20_000_000).unwrap();
        assert_eq!(checkpoint.pending_rewards, 12);
        assert!(matches!(
            manager.rewards_checkpoint_at(&ledger, &storage, 19_000_000),
            Err(LendingError::HistoricalRoundUnavailable(19_000_000))
        ));
    }
}
