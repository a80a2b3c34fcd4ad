use common::LendingError;

/// A type-safe scale factor to prevent mixing the protocol's fixed-point scales.
/// Collateral factors are expressed against the parameter scale (1e3), exchange
/// rates against the base scale (1e9) and rewards coefficients against the
/// rewards scale (1e14).
///
/// # Examples
/// ```
/// use algofi_interface::math::ProtocolParams;
/// let rewards = ProtocolParams::REWARDS_SCALE; // 1e14
/// assert_eq!(rewards.as_u128(), 100_000_000_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactor(pub u128);

impl ScaleFactor {
    /// Creates a new ScaleFactor with the given value
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the underlying u128 value
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Safely multiply a value by this scale factor, handling potential overflow
    pub fn safe_mul(&self, value: u128) -> Option<u128> {
        // If either value is 0, return 0 to avoid unnecessary computation
        if self.0 == 0 || value == 0 {
            return Some(0);
        }

        value.checked_mul(self.0)
    }

    /// Safely divide a value by this scale factor, handling division by zero
    pub fn safe_div(&self, value: u128) -> Option<u128> {
        if self.0 == 0 {
            None
        } else {
            Some(value / self.0)
        }
    }

    /// `floor(value * self)`, overflow reported as [`LendingError::MathOverflow`]
    pub fn scale_up(&self, value: u128) -> Result<u128, LendingError> {
        self.safe_mul(value).ok_or(LendingError::MathOverflow)
    }

    /// `floor(value / self)`, a zero scale reported as [`LendingError::MathOverflow`]
    pub fn scale_down(&self, value: u128) -> Result<u128, LendingError> {
        self.safe_div(value).ok_or(LendingError::MathOverflow)
    }

    /// `floor(a * b / self)` with a checked intermediate product
    pub fn mul_div(&self, a: u128, b: u128) -> Result<u128, LendingError> {
        let product = a.checked_mul(b).ok_or(LendingError::MathOverflow)?;
        self.scale_down(product)
    }
}

/// `floor(a * b / denominator)`; `None` when the denominator is zero
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<Option<u128>, LendingError> {
    if denominator == 0 {
        return Ok(None);
    }
    let product = a.checked_mul(b).ok_or(LendingError::MathOverflow)?;
    Ok(Some(product / denominator))
}

/// Narrow a u128 result back to the ledger's u64 width, saturating
pub fn saturating_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
