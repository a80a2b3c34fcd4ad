use crate::common::LedgerReader;
use crate::math::mul_div_floor;
use crate::math::ProtocolParams;
use common::LendingError;

/// Where an asset's price lives: a key in an oracle application's global state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleBinding {
    pub app_id: u64,
    pub price_field: Vec<u8>,
    pub scale_factor: u64,
}

/// Underlying token, its bank token and the oracle pricing it
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub underlying_asset_id: u64,
    pub bank_asset_id: u64,
    pub underlying_decimals: u32,
    pub bank_decimals: u32,
    pub oracle: Option<OracleBinding>,
    /// Oracle value cached at the last refresh
    raw_price: Option<u64>,
}

impl Asset {
    pub fn new(
        underlying_asset_id: u64,
        bank_asset_id: u64,
        underlying_decimals: u32,
        bank_decimals: u32,
        oracle: Option<OracleBinding>,
    ) -> Self {
        Self { underlying_asset_id, bank_asset_id, underlying_decimals, bank_decimals, oracle, raw_price: None }
    }

    pub fn with_raw_price(mut self, raw_price: u64) -> Self {
        self.raw_price = Some(raw_price);
        self
    }

    pub fn load<R: LedgerReader + ?Sized>(
        reader: &R,
        underlying_asset_id: u64,
        bank_asset_id: u64,
        oracle: Option<OracleBinding>,
    ) -> Result<Self, LendingError> {
        let underlying_decimals = reader.asset_decimals(underlying_asset_id)?;
        let bank_decimals = reader.asset_decimals(bank_asset_id)?;
        let mut asset =
            Self::new(underlying_asset_id, bank_asset_id, underlying_decimals, bank_decimals, oracle);
        asset.refresh_price(reader)?;
        Ok(asset)
    }

    /// Re-read the oracle value; a no-op for assets without an oracle
    pub fn refresh_price<R: LedgerReader + ?Sized>(&mut self, reader: &R) -> Result<(), LendingError> {
        if let Some(oracle) = &self.oracle {
            let state = reader.global_state(oracle.app_id)?;
            self.raw_price = Some(state.get_uint(&oracle.price_field));
        }
        Ok(())
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    fn oracle(&self) -> Result<&OracleBinding, LendingError> {
        self.oracle.as_ref().ok_or(LendingError::NoOracle(self.underlying_asset_id))
    }

    pub fn raw_price(&self) -> Result<u64, LendingError> {
        self.oracle()?;
        self.raw_price.ok_or(LendingError::NoOracle(self.underlying_asset_id))
    }

    /// Dollar price of one whole underlying token
    pub fn price(&self) -> Result<f64, LendingError> {
        let raw = self.raw_price()? as f64;
        let scale = self.oracle()?.scale_factor as f64;
        Ok(raw * 10f64.powi(self.underlying_decimals as i32) / (scale * 1e3))
    }

    /// Dollar value of `amount` base units
    pub fn to_usd(&self, amount: u64) -> Result<f64, LendingError> {
        Ok(amount as f64 * self.price()? / 10f64.powi(self.underlying_decimals as i32))
    }

    /// Dollar value of `amount` base units in integer thousandths of a dollar
    pub fn to_usd_scaled(&self, amount: u64) -> Result<u128, LendingError> {
        let raw = self.raw_price()? as u128;
        let scale = self.oracle()?.scale_factor as u128;
        mul_div_floor(amount as u128, raw, scale)?.ok_or_else(|| {
            LendingError::ProtocolError(format!(
                "oracle of asset {} has a zero scale factor",
                self.underlying_asset_id
            ))
        })
    }

    /// Display dollars of a milli-dollar amount
    pub fn usd_display(milli_usd: u128) -> f64 {
        milli_usd as f64 / ProtocolParams::USD_SCALE.as_u128() as f64
    }
}
