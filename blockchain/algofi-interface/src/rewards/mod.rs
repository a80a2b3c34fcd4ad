mod projector;
#[cfg(test)]
mod tests;

pub use projector::{project_unrealized_rewards, MarketAccrual};
