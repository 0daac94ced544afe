//! Scripted walk-through of a deposit and withdrawal.

use coffer_contracts::safe::SAFE;
use coffer_types::Amount;
use coffer_vm::{kwargs, Client, ContractHandle};

use crate::config::CliConfig;

/// Balances observed at each step of the demo.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub account: String,
    pub minted: Amount,
    pub after_deposit: Amount,
    pub after_withdraw: Amount,
    pub wallet_after_withdraw: Amount,
    pub safe_holdings: Amount,
}

/// Run the demo on `client`, starting from flushed state.
///
/// `on_step` receives a line of progress after each step.
pub fn run_demo(
    client: &Client,
    config: &CliConfig,
    mut on_step: impl FnMut(&str),
) -> anyhow::Result<DemoReport> {
    let demo = &config.demo;
    let account = demo.account.as_str();

    client.flush()?;
    coffer_contracts::install(client, &config.currency_contract, &config.safe_contract)?;
    let currency = client.get_contract(&config.currency_contract)?;
    let safe = client.get_contract(&config.safe_contract)?;

    currency.call("mint", kwargs! { amount: demo.mint, to: account })?;
    let minted = balance_of(&currency, account)?;
    on_step(&format!("{}[{}] = {}", config.currency_contract, account, minted));

    // The safe pulls funds with transfer_from, so it needs an allowance first
    currency.call_as(
        account,
        "approve",
        kwargs! { amount: demo.approve, to: config.safe_contract.as_str() },
    )?;
    safe.call_as(account, "deposit", kwargs! { amount: demo.deposit })?;
    let after_deposit = get_balance(&safe, account)?;
    on_step(&format!("{}[{}] = {}", SAFE, account, after_deposit));

    safe.call_as(account, "withdraw", kwargs! { amount: demo.withdraw })?;
    let after_withdraw = get_balance(&safe, account)?;
    on_step(&format!("{}[{}] = {}", SAFE, account, after_withdraw));

    Ok(DemoReport {
        account: account.to_string(),
        minted,
        after_deposit,
        after_withdraw,
        wallet_after_withdraw: balance_of(&currency, account)?,
        safe_holdings: balance_of(&currency, &config.safe_contract)?,
    })
}

fn balance_of(currency: &ContractHandle<'_>, account: &str) -> anyhow::Result<Amount> {
    Ok(currency.query("balance_of", kwargs! { account: account })?)
}

fn get_balance(safe: &ContractHandle<'_>, account: &str) -> anyhow::Result<Amount> {
    Ok(safe.query("get_balance", kwargs! { account: account })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use coffer_vm::VmError;

    #[test]
    fn test_default_demo() {
        let config = CliConfig::default();
        let client = Client::with_config(config.client_config());
        let mut lines = Vec::new();

        let report = run_demo(&client, &config, |line| lines.push(line.to_string())).unwrap();

        assert_eq!(report.minted, Amount::from(10_000u64));
        assert_eq!(report.after_deposit, Amount::from(200u64));
        assert_eq!(report.after_withdraw, Amount::from(150u64));
        assert_eq!(report.wallet_after_withdraw, Amount::from(9_850u64));
        assert_eq!(report.safe_holdings, Amount::from(150u64));
        assert_eq!(
            lines,
            vec!["currency[alice] = 10000", "safe[alice] = 200", "safe[alice] = 150"]
        );
    }

    #[test]
    fn test_demo_is_repeatable() {
        let config = CliConfig::default();
        let client = Client::with_config(config.client_config());
        let first = run_demo(&client, &config, |_| {}).unwrap();
        let second = run_demo(&client, &config, |_| {}).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_demo_deposit_above_approval_fails() {
        let config = CliConfig {
            demo: DemoConfig {
                approve: Amount::from(100u64),
                ..DemoConfig::default()
            },
            ..CliConfig::default()
        };
        let client = Client::with_config(config.client_config());

        let err = run_demo(&client, &config, |_| {}).unwrap_err();
        let vm_err = err.downcast_ref::<VmError>().unwrap();
        assert_eq!(vm_err.assertion_message(), Some("not approved"));
    }
}
