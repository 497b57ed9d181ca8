//! Grader definitions per evaluation and the loader that materializes them.
//!
//! Definitions are plain data ([`GraderKind`]); each task gets a freshly built
//! [`GraderSet`] so no predicate state is shared between concurrently running
//! tasks.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::error::{EvalError, Result};
use crate::domain::task::GraderResult;
use crate::graders::judge::JudgeModel;
use crate::graders::predicate::{Contains, ContainsAny, Judge, Predicate};

/// Shape of a grader in the external grading vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraderKind {
    /// Passes when the response contains `value` verbatim.
    Contains { value: String },
    /// Passes when the response contains any of `values`.
    ContainsAny { values: Vec<String> },
    /// Asks the judge model a YES/NO `question` about the response.
    Judge { question: String },
}

/// A named grader definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraderDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: GraderKind,
}

pub fn contains(name: &str, needle: &str) -> GraderDefinition {
    GraderDefinition {
        name: name.to_string(),
        kind: GraderKind::Contains {
            value: needle.to_string(),
        },
    }
}

pub fn contains_any(name: &str, needles: &[&str]) -> GraderDefinition {
    GraderDefinition {
        name: name.to_string(),
        kind: GraderKind::ContainsAny {
            values: needles.iter().map(|n| n.to_string()).collect(),
        },
    }
}

pub fn judge(name: &str, question: &str) -> GraderDefinition {
    GraderDefinition {
        name: name.to_string(),
        kind: GraderKind::Judge {
            question: question.to_string(),
        },
    }
}

struct NamedGrader {
    name: String,
    predicate: Box<dyn Predicate>,
}

/// Ordered, ready-to-run predicates for one evaluation.
#[derive(Default)]
pub struct GraderSet {
    graders: Vec<NamedGrader>,
}

impl GraderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate; evaluation order follows insertion order.
    pub fn push(&mut self, name: &str, predicate: Box<dyn Predicate>) {
        self.graders.push(NamedGrader {
            name: name.to_string(),
            predicate,
        });
    }

    pub fn with(mut self, name: &str, predicate: Box<dyn Predicate>) -> Self {
        self.push(name, predicate);
        self
    }

    pub fn len(&self) -> usize {
        self.graders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graders.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.graders.iter().map(|g| g.name.as_str()).collect()
    }

    /// Run every predicate against `text`, one after another, in declared
    /// order. The first predicate error aborts the evaluation.
    pub async fn evaluate(&self, text: &str) -> Result<Vec<GraderResult>> {
        let mut results = Vec::with_capacity(self.graders.len());
        for grader in &self.graders {
            let passed = grader.predicate.check(text).await.map_err(|e| {
                EvalError::GraderExecution {
                    grader: grader.name.clone(),
                    reason: format!("{e:#}"),
                }
            })?;
            results.push(GraderResult::new(&grader.name, passed));
        }
        Ok(results)
    }
}

/// Resolves an evaluation path to a fresh [`GraderSet`].
pub trait GraderLoader: Send + Sync {
    fn load(&self, evaluation_path: &str) -> Result<GraderSet>;
}

/// In-memory catalog of grader definitions keyed by evaluation path.
#[derive(Clone, Default)]
pub struct GraderCatalog {
    definitions: HashMap<String, Vec<GraderDefinition>>,
    judge: Option<Arc<dyn JudgeModel>>,
}

impl GraderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the definitions for `evaluation_path`.
    pub fn with_evaluation(
        mut self,
        evaluation_path: &str,
        definitions: Vec<GraderDefinition>,
    ) -> Self {
        self.definitions
            .insert(evaluation_path.to_string(), definitions);
        self
    }

    /// Judge used to materialize [`GraderKind::Judge`] definitions.
    pub fn with_judge(mut self, judge: Arc<dyn JudgeModel>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Grader definitions for the bundled evaluations.
    pub fn builtin() -> Self {
        Self::new()
            .with_evaluation("evals/basic-setup", basic_setup())
            .with_evaluation("evals/authentication", authentication())
            .with_evaluation("evals/embedded-wallets", embedded_wallets())
            .with_evaluation("evals/wallet-recovery", wallet_recovery())
            .with_evaluation("evals/wallet-actions", wallet_actions())
            .with_evaluation("evals/hooks-usage", hooks_usage())
    }

    fn materialize(
        &self,
        evaluation_path: &str,
        def: &GraderDefinition,
    ) -> Result<Box<dyn Predicate>> {
        Ok(match &def.kind {
            GraderKind::Contains { value } => Box::new(Contains {
                needle: value.clone(),
            }),
            GraderKind::ContainsAny { values } => Box::new(ContainsAny {
                needles: values.clone(),
            }),
            GraderKind::Judge { question } => {
                let judge = self.judge.clone().ok_or_else(|| EvalError::GraderLoad {
                    evaluation: evaluation_path.to_string(),
                    reason: format!("grader {} needs a judge model, none configured", def.name),
                })?;
                Box::new(Judge {
                    question: question.clone(),
                    judge,
                })
            }
        })
    }
}

impl GraderLoader for GraderCatalog {
    fn load(&self, evaluation_path: &str) -> Result<GraderSet> {
        let definitions =
            self.definitions
                .get(evaluation_path)
                .ok_or_else(|| EvalError::GraderLoad {
                    evaluation: evaluation_path.to_string(),
                    reason: "no graders registered".to_string(),
                })?;

        let mut set = GraderSet::new();
        for def in definitions {
            set.push(&def.name, self.materialize(evaluation_path, def)?);
        }
        Ok(set)
    }
}

// ── bundled grader definitions ────────────────────────────────────────────

fn basic_setup() -> Vec<GraderDefinition> {
    vec![
        contains("references_openfort_react", "@openfort/react"),
        contains("includes_wagmi", "wagmi"),
        contains("includes_viem", "viem"),
        contains("includes_tanstack_query", "@tanstack/react-query"),
        contains("uses_openfort_provider", "OpenfortProvider"),
        contains_any("uses_wagmi_provider", &["WagmiProvider", "WagmiConfig"]),
        contains_any(
            "uses_query_client_provider",
            &["QueryClientProvider", "query client provider"],
        ),
        contains_any(
            "configures_wagmi",
            &["getDefaultConfig", "createClient", "createConfig"],
        ),
        contains_any("configures_base_sepolia", &["baseSepolia"]),
        contains_any("has_publishable_key", &["publishableKey", "PUBLISHABLE_KEY"]),
        contains_any(
            "has_shield_key",
            &["shieldPublishableKey", "SHIELD_PUBLISHABLE_KEY"],
        ),
        contains_any("mentions_providers_component", &["Providers", "providers"]),
        judge(
            "proper_provider_hierarchy",
            "Does the code demonstrate the correct provider hierarchy with WagmiProvider (or WagmiConfig for v1) wrapping QueryClientProvider wrapping OpenfortProvider?",
        ),
    ]
}

fn authentication() -> Vec<GraderDefinition> {
    vec![
        contains("has_openfort_provider", "OpenfortProvider"),
        contains("has_publishable_key", "publishableKey"),
        contains("has_shield_key", "shieldPublishableKey"),
        contains("has_wagmi_provider", "WagmiProvider"),
        contains("has_query_client_provider", "QueryClientProvider"),
        contains("has_ui_config", "uiConfig"),
        contains("uses_email_auth", "useEmailAuth"),
        contains("uses_oauth", "useOAuth"),
        contains("uses_oauth_provider_enum", "OAuthProvider"),
        contains("uses_wallet_auth", "useWalletAuth"),
        contains("uses_guest_auth", "useGuestAuth"),
        contains_any("uses_email_methods", &["signInEmail", "signUpEmail"]),
        contains_any("uses_oauth_methods", &["initOAuth"]),
        contains_any(
            "uses_wallet_oauth_methods",
            &["generateSiweMessage", "signInWithSiwe"],
        ),
        contains_any("uses_guest_methods", &["signUpGuest"]),
        contains("uses_user_hook", "useUser"),
        contains("uses_sign_out_hook", "useSignOut"),
    ]
}

fn embedded_wallets() -> Vec<GraderDefinition> {
    vec![
        contains("has_openfort_react_import", "@openfort/react"),
        contains_any("mentions_wallet_creation", &["createWallet"]),
        contains_any("uses_wallet_hooks", &["useWallet", "useWallets"]),
        contains_any("displays_wallet_address", &[".address", ".ownerAddress"]),
        judge(
            "handles_wallet_status",
            "Does the code demonstrate how to check or handle wallet status (connected, disconnected, etc.)?",
        ),
        judge(
            "demonstrates_wallet_operations",
            "Does the code show practical wallet operations like getting the address or checking balance?",
        ),
        judge(
            "proper_error_handling",
            "Does the code include error handling for wallet operations?",
        ),
    ]
}

fn wallet_recovery() -> Vec<GraderDefinition> {
    vec![
        contains("configures_wallet_recovery", "walletRecovery"),
        contains("uses_recovery_method_enum", "RecoveryMethod"),
        contains_any("uses_shield_key", &["publishableKey", "PUBLISHABLE_KEY"]),
        contains_any(
            "uses_publishable_key",
            &["shieldPublishableKey", "SHIELD_PUBLISHABLE_KEY"],
        ),
        contains_any("mentions_automatic_recovery", &["RecoveryMethod.AUTOMATIC"]),
        contains_any("mentions_passkey_recovery", &["RecoveryMethod.PASSKEY"]),
        contains_any("mentions_password_recovery", &["RecoveryMethod.PASSWORD"]),
        contains_any("sets_default_method", &["defaultMethod"]),
        contains_any(
            "has_encryption_session_endpoint",
            &["createEncryptedSessionEndpoint"],
        ),
        judge(
            "explains_recovery_flow",
            "Does the code explain or demonstrate how the wallet recovery process works for users?",
        ),
        judge(
            "mentions_backend_requirements",
            "Does the code mention or explain backend requirements for recovery (especially for automatic recovery)?",
        ),
    ]
}

fn wallet_actions() -> Vec<GraderDefinition> {
    vec![
        contains_any(
            "uses_wallet_client",
            &["useWalletClient", "walletClient", "wallet client"],
        ),
        contains("uses_account_hook", "useAccount"),
        contains_any("demonstrates_signing", &["signMessage", "writeContract"]),
        contains("uses_wait_transaction_receipt", "useWaitForTransactionReceipt"),
        contains_any(
            "demonstrates_transactions",
            &["useWriteContract", "writeContract"],
        ),
        contains_any("there_is_an_address", &["address"]),
        contains_any(
            "handles_transaction_status",
            &["isLoading", "isPending", "isSuccess", "isError", "status"],
        ),
        judge(
            "demonstrates_error_handling",
            "Does the code include proper error handling for transaction failures?",
        ),
        judge(
            "shows_blockchain_interaction",
            "Does the code demonstrate practical blockchain interaction (reading/writing data, sending transactions)?",
        ),
    ]
}

fn hooks_usage() -> Vec<GraderDefinition> {
    vec![
        contains("uses_use_account", "useAccount"),
        contains_any("uses_wallets_hook", &["useWallets"]),
        contains_any("uses_balance_hook", &["useBalance"]),
        contains_any("uses_chain_hooks", &["useChainId", "useSwitchChain"]),
        contains_any("demonstrates_auth_state", &["isAuthenticated"]),
        contains("uses_use_user_hook", "useUser"),
        contains("uses_wagmi", "wagmi"),
        contains("uses_openfort_react", "@openfort/react"),
    ]
}
