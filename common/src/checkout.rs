//! Checkout modal state machine.
//!
//! ```text
//! Closed --open--> Idle --submit(valid)--> Processing --resolve--> Succeeded --finish--> Closed
//!                   ^ |                                   \
//!                   | +--close--> Closed                   +-----> Failed --retry--> Idle
//!                   +----------------------------------------------------+--close--> Closed
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::payment::{ChargeReceipt, ChargeRequest, PaymentError};

/// Delay of the simulated payment round trip.
pub const PAYMENT_ROUND_TRIP_MS: u32 = 2_000;
/// How long the success panel stays up before the modal closes itself.
pub const SUCCESS_DISMISS_MS: u32 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutField {
    CardNumber,
    Expiry,
    Cvv,
    Name,
    Email,
    Address,
}

impl CheckoutField {
    pub fn all() -> &'static [CheckoutField] {
        &[
            CheckoutField::CardNumber,
            CheckoutField::Expiry,
            CheckoutField::Cvv,
            CheckoutField::Name,
            CheckoutField::Email,
            CheckoutField::Address,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckoutField::CardNumber => "Card Number",
            CheckoutField::Expiry => "Expiry Date",
            CheckoutField::Cvv => "CVV",
            CheckoutField::Name => "Cardholder Name",
            CheckoutField::Email => "Email",
            CheckoutField::Address => "Billing Address",
        }
    }

    fn error_message(self) -> &'static str {
        match self {
            CheckoutField::CardNumber => "Enter a valid 16-digit card number",
            CheckoutField::Expiry => "Enter expiry in MM/YY format",
            CheckoutField::Cvv => "Enter a valid CVV (3-4 digits)",
            CheckoutField::Name => "Name is required",
            CheckoutField::Email => "Enter a valid email",
            CheckoutField::Address => "Enter a valid address (min 10 characters)",
        }
    }
}

/// Validation failures keyed by field.
pub type FieldErrors = BTreeMap<CheckoutField, &'static str>;

/// Payment details as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub name: String,
    pub email: String,
    pub address: String,
}

impl CheckoutForm {
    pub fn get(&self, field: CheckoutField) -> &str {
        match field {
            CheckoutField::CardNumber => &self.card_number,
            CheckoutField::Expiry => &self.expiry,
            CheckoutField::Cvv => &self.cvv,
            CheckoutField::Name => &self.name,
            CheckoutField::Email => &self.email,
            CheckoutField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: CheckoutField, value: String) {
        let slot = match field {
            CheckoutField::CardNumber => &mut self.card_number,
            CheckoutField::Expiry => &mut self.expiry,
            CheckoutField::Cvv => &mut self.cvv,
            CheckoutField::Name => &mut self.name,
            CheckoutField::Email => &mut self.email,
            CheckoutField::Address => &mut self.address,
        };
        *slot = value;
    }

    /// Check every field in one pass so all problems surface together.
    pub fn validate(&self) -> FieldErrors {
        CheckoutField::all()
            .iter()
            .copied()
            .filter(|field| !self.field_is_valid(*field))
            .map(|field| (field, field.error_message()))
            .collect()
    }

    fn field_is_valid(&self, field: CheckoutField) -> bool {
        match field {
            CheckoutField::CardNumber => is_card_number(&self.card_number),
            CheckoutField::Expiry => is_expiry(&self.expiry),
            CheckoutField::Cvv => is_cvv(&self.cvv),
            CheckoutField::Name => !self.name.trim().is_empty(),
            CheckoutField::Email => is_email(&self.email),
            CheckoutField::Address => self.address.trim().chars().count() >= 10,
        }
    }

    pub fn charge_request(&self, product_id: &str, amount: f64) -> ChargeRequest {
        let last4_start = self.card_number.len().saturating_sub(4);
        ChargeRequest {
            product_id: product_id.to_string(),
            amount,
            card_last4: self.card_number.get(last4_start..).unwrap_or_default().to_string(),
            cardholder: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn is_card_number(s: &str) -> bool {
    s.len() == 16 && all_digits(s)
}

fn is_cvv(s: &str) -> bool {
    (3..=4).contains(&s.len()) && all_digits(s)
}

/// `MM/YY` with month 01–12.
fn is_expiry(s: &str) -> bool {
    let Some((month, year)) = s.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 || !all_digits(month) || !all_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

/// `local@domain.tld`: no whitespace anywhere, something before the `@`,
/// and a dot inside the domain with text on both sides.
fn is_email(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some(at) = s.find('@') else {
        return false;
    };
    let (local, domain) = (&s[..at], &s[at + 1..]);
    if local.is_empty() {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutStatus {
    Closed,
    Idle,
    Processing,
    Succeeded(ChargeReceipt),
    Failed { reason: String },
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutStatus::Closed => write!(f, "closed"),
            CheckoutStatus::Idle => write!(f, "idle"),
            CheckoutStatus::Processing => write!(f, "processing"),
            CheckoutStatus::Succeeded(_) => write!(f, "success"),
            CheckoutStatus::Failed { .. } => write!(f, "error"),
        }
    }
}

/// Why a submit did not start a payment.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRejected {
    /// The form has field errors; they are now stored on the checkout.
    Invalid,
    /// Submit only works from the idle form.
    NotIdle,
}

/// Checkout modal owned by one product detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    form: CheckoutForm,
    errors: FieldErrors,
    status: CheckoutStatus,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkout {
    pub fn new() -> Self {
        Self {
            form: CheckoutForm::default(),
            errors: FieldErrors::new(),
            status: CheckoutStatus::Closed,
        }
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: CheckoutField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn status(&self) -> &CheckoutStatus {
        &self.status
    }

    pub fn is_open(&self) -> bool {
        self.status != CheckoutStatus::Closed
    }

    pub fn is_processing(&self) -> bool {
        self.status == CheckoutStatus::Processing
    }

    /// Show the modal. Fields typed before a cancel are kept.
    pub fn open(&mut self) {
        if self.status == CheckoutStatus::Closed {
            self.status = CheckoutStatus::Idle;
        }
    }

    /// Update a field and clear its error.
    pub fn edit(&mut self, field: CheckoutField, value: String) {
        if self.status != CheckoutStatus::Idle {
            return;
        }
        self.form.set(field, value);
        self.errors.remove(&field);
    }

    /// Validate and, if clean, enter `Processing`.
    pub fn submit(&mut self) -> Result<(), SubmitRejected> {
        if self.status != CheckoutStatus::Idle {
            return Err(SubmitRejected::NotIdle);
        }
        self.errors = self.form.validate();
        if !self.errors.is_empty() {
            return Err(SubmitRejected::Invalid);
        }
        self.status = CheckoutStatus::Processing;
        Ok(())
    }

    /// Record the gateway's answer. Ignored unless a payment is in flight.
    pub fn resolve(&mut self, outcome: Result<ChargeReceipt, PaymentError>) {
        if self.status != CheckoutStatus::Processing {
            return;
        }
        self.status = match outcome {
            Ok(receipt) => CheckoutStatus::Succeeded(receipt),
            Err(e) => {
                tracing::warn!("payment error: {e}");
                CheckoutStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
    }

    /// Dismiss the success panel: close and wipe the form.
    pub fn finish(&mut self) {
        if matches!(self.status, CheckoutStatus::Succeeded(_)) {
            self.form = CheckoutForm::default();
            self.errors.clear();
            self.status = CheckoutStatus::Closed;
        }
    }

    /// "Try Again": back to the form with every field intact.
    pub fn retry(&mut self) {
        if matches!(self.status, CheckoutStatus::Failed { .. }) {
            self.status = CheckoutStatus::Idle;
        }
    }

    /// Cancel button, overlay click or Escape. No-op while a payment is in
    /// flight or the success panel is showing; returns whether it closed.
    pub fn close(&mut self) -> bool {
        match self.status {
            CheckoutStatus::Idle | CheckoutStatus::Failed { .. } => {
                self.status = CheckoutStatus::Closed;
                self.errors.clear();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            card_number: "1234567890123456".into(),
            expiry: "12/25".into(),
            cvv: "123".into(),
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            address: "123 Main Street".into(),
        }
    }

    fn filled_checkout() -> Checkout {
        let mut checkout = Checkout::new();
        checkout.open();
        let form = valid_form();
        for field in CheckoutField::all() {
            checkout.edit(*field, form.get(*field).to_string());
        }
        checkout
    }

    fn receipt() -> ChargeReceipt {
        ChargeReceipt {
            reference: "sim-k1-1".into(),
            amount: 10.0,
        }
    }

    #[test]
    fn valid_form_has_no_errors_and_starts_processing() {
        assert!(valid_form().validate().is_empty());
        let mut checkout = filled_checkout();
        assert_eq!(checkout.submit(), Ok(()));
        assert_eq!(checkout.status(), &CheckoutStatus::Processing);
    }

    #[test]
    fn short_card_number_reports_only_that_field() {
        let form = CheckoutForm {
            card_number: "123".into(),
            ..valid_form()
        };
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(&CheckoutField::CardNumber),
            Some(&"Enter a valid 16-digit card number")
        );
    }

    #[test]
    fn every_invalid_field_is_reported_at_once() {
        let errors = CheckoutForm::default().validate();
        assert_eq!(errors.len(), 6);

        let form = CheckoutForm {
            card_number: "123".into(),
            cvv: "12".into(),
            email: "jane@x".into(),
            ..valid_form()
        };
        let fields: Vec<_> = form.validate().into_keys().collect();
        assert_eq!(
            fields,
            vec![
                CheckoutField::CardNumber,
                CheckoutField::Cvv,
                CheckoutField::Email
            ]
        );
    }

    #[test]
    fn expiry_rules() {
        for ok in ["01/30", "09/24", "12/99"] {
            assert!(is_expiry(ok), "{ok}");
        }
        for bad in ["00/25", "13/25", "1/25", "12/2025", "12-25", "ab/cd", ""] {
            assert!(!is_expiry(bad), "{bad}");
        }
    }

    #[test]
    fn card_and_cvv_rules() {
        assert!(!is_card_number("1234 5678 9012 3456"));
        assert!(!is_card_number("12345678901234567"));
        assert!(is_cvv("1234"));
        assert!(!is_cvv("12345"));
        assert!(!is_cvv("12a"));
    }

    #[test]
    fn email_rules() {
        for ok in ["a@b.co", "jane.doe@mail.example.com"] {
            assert!(is_email(ok), "{ok}");
        }
        for bad in ["", "jane", "@x.com", "jane@.com", "jane@com.", "jane doe@x.com", "jane@x"] {
            assert!(!is_email(bad), "{bad}");
        }
    }

    #[test]
    fn address_is_measured_after_trimming() {
        let form = CheckoutForm {
            address: "   short    ".into(),
            ..valid_form()
        };
        assert!(form.validate().contains_key(&CheckoutField::Address));
    }

    #[test]
    fn invalid_submit_stays_idle_and_edit_clears_error() {
        let mut checkout = Checkout::new();
        checkout.open();
        assert_eq!(checkout.submit(), Err(SubmitRejected::Invalid));
        assert_eq!(checkout.status(), &CheckoutStatus::Idle);
        assert!(checkout.error(CheckoutField::Name).is_some());

        checkout.edit(CheckoutField::Name, "Jane".into());
        assert!(checkout.error(CheckoutField::Name).is_none());
        assert!(checkout.error(CheckoutField::Email).is_some());
    }

    #[test]
    fn success_then_finish_clears_form() {
        let mut checkout = filled_checkout();
        checkout.submit().unwrap();
        checkout.resolve(Ok(receipt()));
        assert!(matches!(checkout.status(), CheckoutStatus::Succeeded(_)));
        assert!(!checkout.close(), "success panel closes on its own");

        checkout.finish();
        assert_eq!(checkout.status(), &CheckoutStatus::Closed);
        assert_eq!(checkout.form(), &CheckoutForm::default());
    }

    #[test]
    fn failure_then_retry_keeps_fields() {
        let mut checkout = filled_checkout();
        checkout.submit().unwrap();
        checkout.resolve(Err(PaymentError::Declined("Payment declined by bank".into())));
        assert_eq!(
            checkout.status(),
            &CheckoutStatus::Failed {
                reason: "Payment declined by bank".into()
            }
        );

        checkout.retry();
        assert_eq!(checkout.status(), &CheckoutStatus::Idle);
        assert_eq!(checkout.form(), &valid_form());
    }

    #[test]
    fn close_is_ignored_while_processing() {
        let mut checkout = filled_checkout();
        checkout.submit().unwrap();
        assert!(!checkout.close());
        assert!(checkout.is_processing());

        checkout.edit(CheckoutField::Name, "Mallory".into());
        assert_eq!(checkout.form().name, "Jane Doe");
        assert_eq!(checkout.submit(), Err(SubmitRejected::NotIdle));
    }

    #[test]
    fn close_from_failure_and_reopen() {
        let mut checkout = filled_checkout();
        checkout.submit().unwrap();
        checkout.resolve(Err(PaymentError::Unavailable("timeout".into())));
        assert!(checkout.close());
        assert!(!checkout.is_open());

        checkout.open();
        assert_eq!(checkout.status(), &CheckoutStatus::Idle);
    }

    #[test]
    fn late_resolution_after_close_is_dropped() {
        let mut checkout = filled_checkout();
        assert!(checkout.close());
        checkout.resolve(Ok(receipt()));
        assert_eq!(checkout.status(), &CheckoutStatus::Closed);
    }

    #[test]
    fn charge_request_masks_card() {
        let request = valid_form().charge_request("k1", 499.0);
        assert_eq!(request.card_last4, "3456");
        assert_eq!(request.cardholder, "Jane Doe");
    }
}
