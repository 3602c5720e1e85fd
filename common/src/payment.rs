use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Default approval probability of the simulated gateway.
pub const SIMULATED_APPROVAL_RATE: f64 = 0.8;

/// What the checkout hands to a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub product_id: String,
    pub amount: f64,
    pub card_last4: String,
    pub cardholder: String,
    pub email: String,
}

/// Confirmation of an approved charge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeReceipt {
    pub reference: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Declined(String),
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Abstraction over payment backends.
///
/// The storefront only ships a simulated gateway; a real processor plugs in
/// behind the same trait.
pub trait PaymentGateway {
    /// Attempt to charge the card described by `request`.
    fn charge(&mut self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError>;

    /// Human-readable name of this gateway backend.
    fn gateway_name(&self) -> &str;
}

/// Gateway that approves a fixed fraction of charges at random.
///
/// No money moves; this stands in for a processor during development.
pub struct SimulatedGateway<R = StdRng> {
    rng: R,
    approval_rate: f64,
    counter: u64,
}

impl SimulatedGateway<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), SIMULATED_APPROVAL_RATE)
    }

    pub fn seeded(seed: u64, approval_rate: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), approval_rate)
    }
}

impl Default for SimulatedGateway<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SimulatedGateway<R> {
    pub fn with_rng(rng: R, approval_rate: f64) -> Self {
        Self {
            rng,
            approval_rate: approval_rate.clamp(0.0, 1.0),
            counter: 0,
        }
    }
}

impl<R: Rng> PaymentGateway for SimulatedGateway<R> {
    fn charge(&mut self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        self.counter += 1;
        if self.rng.gen_bool(self.approval_rate) {
            Ok(ChargeReceipt {
                reference: format!("sim-{}-{}", request.product_id, self.counter),
                amount: request.amount,
            })
        } else {
            Err(PaymentError::Declined("Payment declined by bank".to_string()))
        }
    }

    fn gateway_name(&self) -> &str {
        "simulated"
    }
}
