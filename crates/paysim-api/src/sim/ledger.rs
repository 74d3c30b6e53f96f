use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::unix_now;

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: u64,
    pub amount: f64,
    pub currency: String,
    pub status: &'static str,
    pub timestamp: f64,
}

/// Body of `POST /api/payments`; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct NewPayment {
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: u64,
    pub payment_id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    pub timestamp: f64,
}

const TRANSACTION_KINDS: [&str; 3] = ["authorization", "capture", "refund"];
const TRANSACTION_STATUSES: [&str; 3] = ["pending", "completed", "failed"];
const SAMPLE_TRANSACTIONS: u64 = 10;

/// Process-lifetime list of created payments.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    payments: RwLock<Vec<Payment>>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<Payment> {
        self.payments.read().clone()
    }

    pub fn len(&self) -> usize {
        self.payments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a completed payment; ids are sequential from 1.
    pub fn create(&self, req: NewPayment) -> Payment {
        let mut payments = self.payments.write();
        let payment = Payment {
            id: payments.len() as u64 + 1,
            amount: req.amount.unwrap_or(100.0),
            currency: req.currency.unwrap_or_else(|| "EUR".to_string()),
            status: "completed",
            timestamp: unix_now(),
        };
        payments.push(payment.clone());
        payment
    }

    /// Fabricate a batch of transactions against the current payments.
    /// Read-only: the batch is not stored.
    pub fn sample_transactions(&self) -> Vec<Transaction> {
        let payments = self.len() as u64;
        let now = unix_now();
        let mut rng = rand::thread_rng();
        (1..=SAMPLE_TRANSACTIONS)
            .map(|id| Transaction {
                id,
                payment_id: (payments > 0).then(|| id % payments + 1),
                kind: TRANSACTION_KINDS.choose(&mut rng).copied().unwrap_or("capture"),
                status: TRANSACTION_STATUSES.choose(&mut rng).copied().unwrap_or("pending"),
                timestamp: now - rng.gen_range(0..=86_400) as f64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_defaults_apply() {
        let ledger = PaymentLedger::new();
        let a = ledger.create(NewPayment::default());
        let b = ledger.create(NewPayment {
            amount: Some(12.5),
            currency: Some("USD".into()),
        });
        assert_eq!((a.id, a.amount, a.currency.as_str()), (1, 100.0, "EUR"));
        assert_eq!((b.id, b.amount, b.currency.as_str()), (2, 12.5, "USD"));
        assert_eq!(a.status, "completed");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn transactions_reference_payments_without_storing() {
        let ledger = PaymentLedger::new();
        let txs = ledger.sample_transactions();
        assert_eq!(txs.len(), 10);
        assert!(txs.iter().all(|t| t.payment_id.is_none()));

        for _ in 0..3 {
            ledger.create(NewPayment::default());
        }
        let txs = ledger.sample_transactions();
        for t in &txs {
            assert_eq!(t.payment_id, Some(t.id % 3 + 1));
            assert!(TRANSACTION_KINDS.contains(&t.kind));
            assert!(TRANSACTION_STATUSES.contains(&t.status));
        }
        assert_eq!(ledger.len(), 3);
    }
}
