// crates/syndicate-cli/src/scenario.rs
//
// TOML scenario scripts replayed against a freshly deployed ledger.
//
// A scenario is a list of `[[steps]]`, each tagged with an `op`. Accounts are
// labels ("user1"), with three reserved forms: `factory`, `swap-escrow` and
// `pool:<SYMBOL>` for the pool staking that token. Tokens and pools are named
// by symbol, amounts are whole-token decimals, role and feature masks are
// lists of names.

use std::fs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use syndicate_core::{parse_units, AccountId, RoleOracle, SyndicateError, Units};
use syndicate_staking::Ledger;
use syndicate_token::{parse_mask, GatedToken};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{0}")]
    Ledger(#[from] SyndicateError),

    #[error("expectation failed: {0}")]
    Expectation(String),

    #[error("could not read scenario: {0}")]
    Read(#[from] std::io::Error),

    #[error("could not parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &str) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(contents)?)
    }
}

fn yes() -> bool {
    true
}

fn one() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    RegisterToken {
        symbol: String,
        admin: String,
        holder: String,
        supply: String,
    },
    Transfer {
        token: String,
        from: String,
        to: String,
        amount: String,
    },
    TransferFrom {
        token: String,
        spender: String,
        from: String,
        to: String,
        amount: String,
    },
    Approve {
        token: String,
        owner: String,
        spender: String,
        amount: String,
    },
    CreatePool {
        caller: String,
        token: String,
        weight: u32,
    },
    ChangePoolWeight {
        caller: String,
        token: String,
        weight: u32,
    },
    /// `lock_seconds` counts from the latest block; 0 stakes unlocked.
    Stake {
        pool: String,
        account: String,
        amount: String,
        #[serde(default)]
        lock_seconds: u64,
        #[serde(default = "yes")]
        use_escrow: bool,
    },
    Unstake {
        pool: String,
        account: String,
        index: usize,
        amount: String,
        #[serde(default = "yes")]
        process_rewards: bool,
    },
    ProcessRewards {
        pool: String,
        account: String,
        #[serde(default)]
        reinvest: bool,
    },
    Mine {
        #[serde(default = "one")]
        blocks: u64,
    },
    IncreaseTime {
        seconds: u64,
    },
    Delegate {
        token: String,
        from: String,
        to: String,
    },
    DelegatePool {
        caller: String,
        pool: String,
        to: String,
    },
    UpdateRole {
        token: String,
        caller: String,
        account: String,
        roles: Vec<String>,
    },
    UpdateFeatures {
        token: String,
        caller: String,
        features: Vec<String>,
    },
    Swap {
        caller: String,
        account: String,
        amount: String,
    },
    ExpectBalance {
        token: String,
        account: String,
        amount: String,
    },
    ExpectPending {
        pool: String,
        account: String,
        amount: String,
    },
    ExpectVotingPower {
        token: String,
        account: String,
        amount: String,
    },
    ExpectRoles {
        token: String,
        account: String,
        roles: Vec<String>,
    },
    /// Run `step` and require it to fail. `error` names the gate
    /// ("receiver", "swap-operator") or the error kind ("stake-locked");
    /// omitted, any failure passes.
    ExpectError {
        #[serde(default)]
        error: Option<String>,
        step: Box<Step>,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::RegisterToken { .. } => "register_token",
            Step::Transfer { .. } => "transfer",
            Step::TransferFrom { .. } => "transfer_from",
            Step::Approve { .. } => "approve",
            Step::CreatePool { .. } => "create_pool",
            Step::ChangePoolWeight { .. } => "change_pool_weight",
            Step::Stake { .. } => "stake",
            Step::Unstake { .. } => "unstake",
            Step::ProcessRewards { .. } => "process_rewards",
            Step::Mine { .. } => "mine",
            Step::IncreaseTime { .. } => "increase_time",
            Step::Delegate { .. } => "delegate",
            Step::DelegatePool { .. } => "delegate_pool",
            Step::UpdateRole { .. } => "update_role",
            Step::UpdateFeatures { .. } => "update_features",
            Step::Swap { .. } => "swap",
            Step::ExpectBalance { .. } => "expect_balance",
            Step::ExpectPending { .. } => "expect_pending",
            Step::ExpectVotingPower { .. } => "expect_voting_power",
            Step::ExpectRoles { .. } => "expect_roles",
            Step::ExpectError { .. } => "expect_error",
        }
    }
}

/// Short kebab-case name of an error, matched by `expect_error`.
pub fn error_kind(err: &SyndicateError) -> String {
    match err {
        SyndicateError::Unauthorized { gate, .. } => gate.to_string(),
        SyndicateError::InsufficientBalance { .. } => "insufficient-balance".to_string(),
        SyndicateError::InsufficientAllowance { .. } => "insufficient-allowance".to_string(),
        SyndicateError::StakeLocked { .. } => "stake-locked".to_string(),
        SyndicateError::InvalidAmount(_) => "invalid-amount".to_string(),
        SyndicateError::InvalidArgument(_) => "invalid-argument".to_string(),
        SyndicateError::NotFound(_) => "not-found".to_string(),
        SyndicateError::InvalidState(_) => "invalid-state".to_string(),
        SyndicateError::Crypto(_) => "crypto".to_string(),
        SyndicateError::Serialization(_) => "serialization".to_string(),
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: String,
    pub block: u64,
    pub passed: bool,
    pub detail: String,
}

pub struct ScenarioRunner {
    ledger: Ledger,
}

impl ScenarioRunner {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply every step in order. Failed steps are reported and the replay
    /// carries on; the ledger has already rolled them back.
    pub fn run(&mut self, scenario: &Scenario) -> Vec<StepReport> {
        scenario
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = self.apply(step);
                let block = self.ledger.env().number;
                let (passed, detail) = match result {
                    Ok(detail) => (true, detail),
                    Err(e) => {
                        tracing::warn!("Step {} ({}) failed: {}", index, step.op(), e);
                        (false, e.to_string())
                    }
                };
                StepReport {
                    index,
                    op: step.op().to_string(),
                    block,
                    passed,
                    detail,
                }
            })
            .collect()
    }

    pub fn account(&self, name: &str) -> Result<AccountId, ScenarioError> {
        if let Some(symbol) = name.strip_prefix("pool:") {
            return self.pool(symbol);
        }
        Ok(match name {
            "factory" => *self.ledger.factory().address(),
            "swap-escrow" => *self.ledger.swap_escrow().address(),
            label => AccountId::from_label(label),
        })
    }

    pub fn token(&self, symbol: &str) -> Result<AccountId, ScenarioError> {
        Ok(*self.ledger.token_by_symbol(symbol)?.address())
    }

    /// Address of the pool staking the token `symbol`.
    pub fn pool(&self, symbol: &str) -> Result<AccountId, ScenarioError> {
        let asset = self.token(symbol)?;
        Ok(self.ledger.pool_address(&asset)?)
    }

    /// Apply one step, returning a description of what happened.
    pub fn apply(&mut self, step: &Step) -> Result<String, ScenarioError> {
        match step {
            Step::RegisterToken {
                symbol,
                admin,
                holder,
                supply,
            } => {
                let admin = self.account(admin)?;
                let address = AccountId::derive(&format!("token:{}", symbol), &[&admin]);
                let token = GatedToken::new(address, symbol.clone(), &[admin])
                    .with_initial_supply(&self.account(holder)?, parse_units(supply)?)?;
                self.ledger.register_token(token)?;
                Ok(format!("{} at {}", symbol, address.short()))
            }
            Step::Transfer {
                token,
                from,
                to,
                amount,
            } => {
                let value = parse_units(amount)?;
                self.ledger
                    .transfer(&self.token(token)?, &self.account(from)?, &self.account(to)?, value)?;
                Ok(format!("{} {} {} -> {}", Units(value), token, from, to))
            }
            Step::TransferFrom {
                token,
                spender,
                from,
                to,
                amount,
            } => {
                let value = parse_units(amount)?;
                self.ledger.transfer_from(
                    &self.token(token)?,
                    &self.account(spender)?,
                    &self.account(from)?,
                    &self.account(to)?,
                    value,
                )?;
                Ok(format!("{} {} {} -> {} by {}", Units(value), token, from, to, spender))
            }
            Step::Approve {
                token,
                owner,
                spender,
                amount,
            } => {
                let value = parse_units(amount)?;
                self.ledger.approve(
                    &self.token(token)?,
                    &self.account(owner)?,
                    &self.account(spender)?,
                    value,
                )?;
                Ok(format!("{} may spend {} {} of {}", spender, Units(value), token, owner))
            }
            Step::CreatePool {
                caller,
                token,
                weight,
            } => {
                let block = self.ledger.env().number;
                let pool = self
                    .ledger
                    .create_pool(&self.account(caller)?, &self.token(token)?, block, *weight)?;
                Ok(format!("pool {} for {} with weight {}", pool.short(), token, weight))
            }
            Step::ChangePoolWeight {
                caller,
                token,
                weight,
            } => {
                self.ledger
                    .change_pool_weight(&self.account(caller)?, &self.token(token)?, *weight)?;
                Ok(format!("{} pool weight {}", token, weight))
            }
            Step::Stake {
                pool,
                account,
                amount,
                lock_seconds,
                use_escrow,
            } => {
                let value = parse_units(amount)?;
                let lock_until = if *lock_seconds == 0 {
                    0
                } else {
                    self.ledger
                        .env()
                        .timestamp
                        .checked_add(*lock_seconds)
                        .ok_or_else(|| SyndicateError::InvalidArgument("lock end overflows".to_string()))?
                };
                let index = self.ledger.stake(
                    &self.pool(pool)?,
                    &self.account(account)?,
                    value,
                    lock_until,
                    *use_escrow,
                )?;
                Ok(format!("stake #{} of {} {} until {}", index, Units(value), pool, lock_until))
            }
            Step::Unstake {
                pool,
                account,
                index,
                amount,
                process_rewards,
            } => {
                let value = parse_units(amount)?;
                let rewards = self.ledger.unstake(
                    &self.pool(pool)?,
                    &self.account(account)?,
                    *index,
                    value,
                    *process_rewards,
                )?;
                Ok(format!(
                    "withdrew {} from stake #{}, rewards {}",
                    Units(value),
                    index,
                    Units(rewards)
                ))
            }
            Step::ProcessRewards {
                pool,
                account,
                reinvest,
            } => {
                let settled = self
                    .ledger
                    .process_rewards(&self.pool(pool)?, &self.account(account)?, *reinvest)?;
                Ok(format!(
                    "{} {}",
                    if *reinvest { "compounded" } else { "escrowed" },
                    Units(settled)
                ))
            }
            Step::Mine { blocks } => {
                self.ledger.mine_blocks(*blocks);
                Ok(format!("mined {} block(s)", blocks))
            }
            Step::IncreaseTime { seconds } => {
                self.ledger.increase_time(*seconds);
                Ok(format!("timestamp now {}", self.ledger.env().timestamp))
            }
            Step::Delegate { token, from, to } => {
                self.ledger
                    .delegate(&self.token(token)?, &self.account(from)?, &self.account(to)?)?;
                Ok(format!("{} delegates {} votes to {}", from, token, to))
            }
            Step::DelegatePool { caller, pool, to } => {
                self.ledger.delegate_pool_votes(
                    &self.account(caller)?,
                    &self.pool(pool)?,
                    &self.account(to)?,
                )?;
                Ok(format!("{} pool votes delegated to {}", pool, to))
            }
            Step::UpdateRole {
                token,
                caller,
                account,
                roles,
            } => {
                let applied = self.ledger.update_role(
                    &self.token(token)?,
                    &self.account(caller)?,
                    &self.account(account)?,
                    parse_mask(roles)?,
                )?;
                Ok(format!("{} roles on {} now {:#x}", account, token, applied))
            }
            Step::UpdateFeatures {
                token,
                caller,
                features,
            } => {
                let applied = self.ledger.update_features(
                    &self.token(token)?,
                    &self.account(caller)?,
                    parse_mask(features)?,
                )?;
                Ok(format!("{} features now {:#x}", token, applied))
            }
            Step::Swap {
                caller,
                account,
                amount,
            } => {
                let value = parse_units(amount)?;
                self.ledger
                    .swap(&self.account(caller)?, &self.account(account)?, value)?;
                Ok(format!("swapped {} for {}", Units(value), account))
            }
            Step::ExpectBalance {
                token,
                account,
                amount,
            } => {
                let actual = self
                    .ledger
                    .balance_of(&self.token(token)?, &self.account(account)?)?;
                expect_amount(&format!("{} balance of {}", token, account), amount, actual)
            }
            Step::ExpectPending {
                pool,
                account,
                amount,
            } => {
                let actual = self
                    .ledger
                    .pending_yield_rewards(&self.pool(pool)?, &self.account(account)?)?;
                expect_amount(&format!("pending rewards of {} in {}", account, pool), amount, actual)
            }
            Step::ExpectVotingPower {
                token,
                account,
                amount,
            } => {
                let actual = self
                    .ledger
                    .voting_power(&self.token(token)?, &self.account(account)?)?;
                expect_amount(&format!("{} voting power of {}", token, account), amount, actual)
            }
            Step::ExpectRoles {
                token,
                account,
                roles,
            } => {
                let expected = parse_mask(roles)?;
                let actual = self
                    .ledger
                    .token(&self.token(token)?)?
                    .user_roles(&self.account(account)?);
                if actual != expected {
                    return Err(ScenarioError::Expectation(format!(
                        "{} roles of {}: expected {:#x}, got {:#x}",
                        token, account, expected, actual
                    )));
                }
                Ok(format!("{} roles of {} = {:#x}", token, account, actual))
            }
            Step::ExpectError { error, step } => match self.apply(step) {
                Ok(_) => Err(ScenarioError::Expectation(format!(
                    "{} succeeded but should have failed",
                    step.op()
                ))),
                Err(ScenarioError::Ledger(e)) => {
                    let kind = error_kind(&e);
                    match error {
                        Some(expected) if !expected.eq_ignore_ascii_case(&kind) => {
                            Err(ScenarioError::Expectation(format!(
                                "{} failed with {} instead of {}",
                                step.op(),
                                kind,
                                expected
                            )))
                        }
                        _ => Ok(format!("{} rejected: {}", step.op(), e)),
                    }
                }
                Err(other) => Err(other),
            },
        }
    }
}

fn expect_amount(what: &str, expected: &str, actual: u128) -> Result<String, ScenarioError> {
    let expected = parse_units(expected)?;
    if actual != expected {
        return Err(ScenarioError::Expectation(format!(
            "{}: expected {}, got {}",
            what,
            Units(expected),
            Units(actual)
        )));
    }
    Ok(format!("{} = {}", what, Units(actual)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndicate_core::BlockEnv;
    use syndicate_staking::DeployParams;

    fn runner() -> ScenarioRunner {
        let params = DeployParams {
            genesis: BlockEnv::new(1, 1_650_000_000),
            ..DeployParams::default()
        };
        ScenarioRunner::new(Ledger::deploy(&params).unwrap())
    }

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::parse(
            r#"
            name = "parse"

            [[steps]]
            op = "stake"
            pool = "SYN"
            account = "user1"
            amount = "1000"
            lock_seconds = 31536000

            [[steps]]
            op = "mine"

            [[steps]]
            op = "expect_error"
            error = "receiver"
            step = { op = "transfer", token = "sSYN", from = "user1", to = "marketplace", amount = "1" }
            "#,
        )
        .unwrap();
        assert_eq!(scenario.steps.len(), 3);
        assert!(matches!(
            scenario.steps[0],
            Step::Stake { use_escrow: true, lock_seconds: 31_536_000, .. }
        ));
        assert!(matches!(scenario.steps[1], Step::Mine { blocks: 1 }));
        assert_eq!(scenario.steps[2].op(), "expect_error");
    }

    #[test]
    fn test_unknown_op_rejected() {
        let err = Scenario::parse("[[steps]]\nop = \"teleport\"\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_transfer_and_expect_balance() {
        let mut runner = runner();
        let scenario = Scenario::parse(
            r#"
            [[steps]]
            op = "update_features"
            token = "SYN"
            caller = "deployer"
            features = ["TRANSFERS"]

            [[steps]]
            op = "transfer"
            token = "SYN"
            from = "fund-owner"
            to = "user1"
            amount = "20000"

            [[steps]]
            op = "expect_balance"
            token = "SYN"
            account = "user1"
            amount = "20000"

            [[steps]]
            op = "expect_balance"
            token = "SYN"
            account = "user1"
            amount = "1"
            "#,
        )
        .unwrap();
        let reports = runner.run(&scenario);
        assert!(reports[..3].iter().all(|r| r.passed));
        assert!(!reports[3].passed);
        assert!(reports[3].detail.contains("expected 1"));
    }

    #[test]
    fn test_expect_error_matches_gate() {
        let mut runner = runner();
        let transfer = Step::Transfer {
            token: "SYN".to_string(),
            from: "fund-owner".to_string(),
            to: "user1".to_string(),
            amount: "1".to_string(),
        };
        let matching = Step::ExpectError {
            error: Some("receiver".to_string()),
            step: Box::new(transfer.clone()),
        };
        assert!(runner.apply(&matching).is_ok());

        let wrong = Step::ExpectError {
            error: Some("stake-locked".to_string()),
            step: Box::new(transfer),
        };
        assert!(matches!(
            runner.apply(&wrong).unwrap_err(),
            ScenarioError::Expectation(_)
        ));
    }

    #[test]
    fn test_expect_error_on_success_fails() {
        let mut runner = runner();
        let step = Step::ExpectError {
            error: None,
            step: Box::new(Step::Mine { blocks: 1 }),
        };
        assert!(matches!(
            runner.apply(&step).unwrap_err(),
            ScenarioError::Expectation(_)
        ));
    }

    #[test]
    fn test_reserved_account_names() {
        let mut runner = runner();
        assert_eq!(
            runner.account("swap-escrow").unwrap(),
            *runner.ledger().swap_escrow().address()
        );
        assert!(runner.account("pool:SYN").is_err());
        runner
            .apply(&Step::CreatePool {
                caller: "deployer".to_string(),
                token: "SYN".to_string(),
                weight: 1,
            })
            .unwrap();
        let syn = *runner.ledger().primary().address();
        assert_eq!(
            runner.account("pool:SYN").unwrap(),
            runner.ledger().pool_address(&syn).unwrap()
        );
    }

    #[test]
    fn test_register_token() {
        let mut runner = runner();
        runner
            .apply(&Step::RegisterToken {
                symbol: "SLP".to_string(),
                admin: "deployer".to_string(),
                holder: "lp".to_string(),
                supply: "50".to_string(),
            })
            .unwrap();
        runner
            .apply(&Step::ExpectBalance {
                token: "SLP".to_string(),
                account: "lp".to_string(),
                amount: "50".to_string(),
            })
            .unwrap();
    }
}
