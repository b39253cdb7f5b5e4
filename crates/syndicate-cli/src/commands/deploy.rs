// crates/syndicate-cli/src/commands/deploy.rs
//
// `syndicate deploy`: deploy the ledger from the configuration, create the
// core pool, and print the resulting addresses and role masks.

use serde::Serialize;
use syndicate_core::{AccountId, Amount, Mask, RoleOracle, SyndicateError, Units};
use syndicate_staking::Ledger;
use syndicate_token::{GatedToken, ROLE_TOKEN_CREATOR};
use tabled::Tabled;

use crate::config::DeploymentConfig;
use crate::output::{format_json, format_table, OutputFormat};

/// A deployed component.
#[derive(Debug, Serialize, Tabled)]
pub struct ComponentRow {
    #[tabled(rename = "Component")]
    pub component: String,
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Details")]
    pub details: String,
}

/// Non-empty role mask held on a token.
#[derive(Debug, Serialize, Tabled)]
pub struct RoleRow {
    #[tabled(rename = "Token")]
    pub token: String,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Roles")]
    pub roles: String,
}

#[derive(Debug, Serialize)]
pub struct DeploymentReport {
    pub block: u64,
    pub timestamp: u64,
    pub components: Vec<ComponentRow>,
    pub roles: Vec<RoleRow>,
}

/// Deploy per `config`, then create the core pool and let it mint escrowed
/// rewards.
pub fn deploy(config: &DeploymentConfig) -> Result<Ledger, SyndicateError> {
    let params = config.to_deploy_params()?;
    let mut ledger = Ledger::deploy(&params)?;
    let primary = *ledger.primary().address();
    let escrowed = *ledger.escrowed().address();

    let block = ledger.env().number;
    let core_pool = ledger.create_pool(&params.deployer, &primary, block, config.core_pool_weight)?;
    ledger.update_role(&escrowed, &params.super_admin, &core_pool, ROLE_TOKEN_CREATOR)?;
    Ok(ledger)
}

fn token_details(token: &GatedToken) -> String {
    let supply = Units(token.total_supply());
    match token.max_total_supply() {
        Some(cap) => format!("{} supply {} / max {}", token.symbol(), supply, Units(cap)),
        None => format!("{} supply {}", token.symbol(), supply),
    }
}

fn role_rows(token: &GatedToken, accounts: &[(String, AccountId)]) -> Vec<RoleRow> {
    accounts
        .iter()
        .filter_map(|(name, account)| {
            let roles: Mask = token.user_roles(account);
            (!roles.is_zero()).then(|| RoleRow {
                token: token.symbol().to_string(),
                account: name.clone(),
                address: account.short(),
                roles: format!("{:#x}", roles),
            })
        })
        .collect()
}

/// Summarize a deployed ledger.
pub fn report(config: &DeploymentConfig, ledger: &Ledger) -> Result<DeploymentReport, SyndicateError> {
    let factory = ledger.factory();
    let swap = ledger.swap_escrow();
    let mut components = vec![
        ComponentRow {
            component: "primary token".to_string(),
            address: ledger.primary().address().to_string(),
            details: token_details(ledger.primary()),
        },
        ComponentRow {
            component: "escrowed token".to_string(),
            address: ledger.escrowed().address().to_string(),
            details: token_details(ledger.escrowed()),
        },
        ComponentRow {
            component: "pool factory".to_string(),
            address: factory.address().to_string(),
            details: format!(
                "owner {}, {} per block",
                config.deployer,
                Units(factory.reward_per_block_at(ledger.env().number))
            ),
        },
    ];
    for pool in factory.pools() {
        let asset = ledger.token(pool.pool_token())?;
        components.push(ComponentRow {
            component: if pool.is_core() {
                "core pool".to_string()
            } else {
                format!("{} pool", asset.symbol())
            },
            address: pool.address().to_string(),
            details: format!("weight {}/{}", pool.weight(), factory.total_weight()),
        });
    }
    components.push(ComponentRow {
        component: "swap escrow".to_string(),
        address: swap.address().to_string(),
        details: format!("operator {}", config.super_admin),
    });

    let mut accounts = vec![
        (config.deployer.clone(), AccountId::from_label(&config.deployer)),
        (config.super_admin.clone(), AccountId::from_label(&config.super_admin)),
        (config.fund_owner.clone(), AccountId::from_label(&config.fund_owner)),
        ("factory".to_string(), *factory.address()),
        ("swap-escrow".to_string(), *swap.address()),
    ];
    accounts.extend(factory.pools().map(|pool| {
        let name = ledger
            .token(pool.pool_token())
            .map(|t| format!("pool:{}", t.symbol()))
            .unwrap_or_else(|_| "pool".to_string());
        (name, *pool.address())
    }));

    let mut roles = role_rows(ledger.primary(), &accounts);
    roles.extend(role_rows(ledger.escrowed(), &accounts));

    let env = ledger.env();
    Ok(DeploymentReport {
        block: env.number,
        timestamp: env.timestamp,
        components,
        roles,
    })
}

/// Run the deploy subcommand.
pub fn run(config: &DeploymentConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = deploy(config)?;
    let report = report(config, &ledger)?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            println!("Syndicate deployment (block {}, timestamp {})", report.block, report.timestamp);
            println!();
            println!("{}", format_table(&report.components));
            println!();
            println!("{}", format_table(&report.roles));
            let fund: Amount = ledger
                .primary()
                .balance_of(&AccountId::from_label(&config.fund_owner));
            println!();
            println!("Fund owner {} holds {} {}", config.fund_owner, Units(fund), config.primary_symbol);
        }
    }
    Ok(())
}
