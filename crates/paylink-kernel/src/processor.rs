//! TransactionProcessor: decides inbound payment requests.
//!
//! The decision itself comes from an [`ApprovalPolicy`]. The processor wraps
//! it so that no failure escapes: a policy error or panic turns into a
//! rejected response for the same request id.

use paylink_types::activity::ActivityLog;
use paylink_types::config::ProcessorConfig;
use paylink_types::transaction::{TransactionRequest, TransactionResponse};
use paylink_wire::RequestHandler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

/// Decides whether a request is approved.
pub trait ApprovalPolicy: Send + Sync {
    /// `Ok(true)` approves, `Ok(false)` rejects for insufficient funds,
    /// `Err(reason)` rejects with `reason`.
    fn decide(&self, request: &TransactionRequest) -> Result<bool, String>;
}

/// Independent random draw per request.
pub struct RandomApproval {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomApproval {
    /// Approve with probability `rate` (clamped to `[0, 1]`). A `seed` makes
    /// the sequence of decisions reproducible.
    pub fn new(rate: f64, seed: Option<u64>) -> Self {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            ProcessorConfig::default().approval_rate
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl ApprovalPolicy for RandomApproval {
    fn decide(&self, _request: &TransactionRequest) -> Result<bool, String> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rng.gen_bool(self.rate))
    }
}

/// Always the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedApproval(pub bool);

impl ApprovalPolicy for FixedApproval {
    fn decide(&self, _request: &TransactionRequest) -> Result<bool, String> {
        Ok(self.0)
    }
}

/// Turns requests into responses using an [`ApprovalPolicy`].
pub struct TransactionProcessor {
    policy: Arc<dyn ApprovalPolicy>,
    log: ActivityLog,
}

impl TransactionProcessor {
    pub fn new(policy: Arc<dyn ApprovalPolicy>, log: ActivityLog) -> Self {
        Self { policy, log }
    }

    /// Random policy configured from `[processor]`.
    pub fn from_config(config: &ProcessorConfig, log: ActivityLog) -> Self {
        Self::new(
            Arc::new(RandomApproval::new(config.approval_rate, config.seed)),
            log,
        )
    }

    /// Decide `request`. The response id always equals the request id.
    pub fn process(&self, request: &TransactionRequest) -> TransactionResponse {
        let amount = request.amount;
        let decision =
            std::panic::catch_unwind(AssertUnwindSafe(|| self.policy.decide(request)));

        let response = match decision {
            Ok(Ok(true)) => {
                TransactionResponse::approved(&request.id, format!("Payment of {amount} approved"))
            }
            Ok(Ok(false)) => TransactionResponse::rejected(
                &request.id,
                format!("Payment of {amount} rejected: insufficient funds"),
            ),
            Ok(Err(reason)) => {
                self.log
                    .error(format!("Approval policy failed for {}: {reason}", request.id));
                TransactionResponse::rejected(
                    &request.id,
                    format!("Payment of {amount} rejected: {reason}"),
                )
            }
            Err(_) => {
                self.log
                    .error(format!("Approval policy panicked for {}", request.id));
                TransactionResponse::rejected(
                    &request.id,
                    format!("Payment of {amount} rejected: processing error"),
                )
            }
        };

        let verdict = if response.approved { "APPROVED" } else { "REJECTED" };
        self.log.info(format!("Processing: {verdict} - {amount}"));
        response
    }
}

impl RequestHandler for TransactionProcessor {
    fn process(&self, request: &TransactionRequest) -> TransactionResponse {
        TransactionProcessor::process(self, request)
    }
}
