/// Asset id the protocol uses for the ledger's native currency
pub const NATIVE_ASSET_ID: u64 = 1;

/// Decimals of the native currency
pub const NATIVE_DECIMALS: u32 = 6;

pub fn is_native_asset(asset_id: u64) -> bool {
    asset_id == NATIVE_ASSET_ID
}

/// Asset id to reference in a transfer, `None` for native payments
pub fn transfer_asset_id(asset_id: u64) -> Option<u64> {
    if is_native_asset(asset_id) {
        None
    } else {
        Some(asset_id)
    }
}

// Format large numbers for display
pub fn format_large_number(num: f64) -> String {
    const BILLION: f64 = 1_000_000_000.0;
    const MILLION: f64 = 1_000_000.0;
    const THOUSAND: f64 = 1_000.0;

    match num {
        n if n >= BILLION => format!("{:.2}bn", n / BILLION),
        n if n >= MILLION => format!("{:.2}m", n / MILLION),
        n if n >= THOUSAND => format!("{:.2}k", n / THOUSAND),
        _ => format!("{:.2}", num),
    }
}

/// Convert base units to a display amount
pub fn to_display_amount(amount: u64, decimals: u32) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
