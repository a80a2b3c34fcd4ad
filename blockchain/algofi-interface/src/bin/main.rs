use algofi_interface::client::AlgofiClient;
use algofi_interface::common::ClientConfig;
use anyhow::Context;
use common::{LendingClient, ObligationType, UserObligation};
use log::info;

fn print_obligations(obligations: &[UserObligation]) {
    use prettytable::{row, Table};

    if obligations.is_empty() {
        info!("No obligations found");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Protocol", "Market App", "Token", "Amount", "Type"]);

    for obligation in obligations {
        let formatted_amount = format!(
            "{:.3}",
            obligation.amount as f64 / 10_f64.powi(obligation.asset_decimals as i32)
        );
        let obligation_type = match obligation.obligation_type {
            ObligationType::Asset => "Supply",
            ObligationType::Liability => "Borrow",
        };

        table.add_row(row![
            obligation.protocol_name,
            obligation.market_app_id,
            obligation.symbol,
            formatted_amount,
            obligation_type
        ]);
    }

    table.printstd();
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ClientConfig::from_env().context("Failed to read client configuration")?;
    let client = AlgofiClient::from_config(&config)
        .with_context(|| format!("Failed to load {} markets", config.network))?;
    client.print_markets();

    if let Some(user) = &config.user_address {
        let obligations = client.get_user_obligations(user)?;
        print_obligations(&obligations);

        let rewards = client.unrealized_rewards(Some(user))?;
        info!(
            "Unrealized rewards of {}: {} primary, {} secondary",
            user, rewards.primary, rewards.secondary
        );
    }

    Ok(())
}
