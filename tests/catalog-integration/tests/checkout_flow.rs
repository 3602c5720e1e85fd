use rand::rngs::mock::StepRng;

use mobiflex_common::checkout::{Checkout, CheckoutField, CheckoutStatus, SubmitRejected};
use mobiflex_common::payment::{PaymentGateway, SimulatedGateway};
use mobiflex_common::store::MemoryStore;

use futures::executor::block_on;
use mobiflex_catalog_integration::make_dummy_document;
use mobiflex_common::store::CatalogStore;

fn fill(checkout: &mut Checkout) {
    checkout.edit(CheckoutField::CardNumber, "4111111111111111".into());
    checkout.edit(CheckoutField::Expiry, "08/29".into());
    checkout.edit(CheckoutField::Cvv, "321".into());
    checkout.edit(CheckoutField::Name, "Asha Rao".into());
    checkout.edit(CheckoutField::Email, "asha@example.in".into());
    checkout.edit(CheckoutField::Address, "42 MG Road, Bengaluru".into());
}

/// Buy a product from a loaded catalog through an always-approving gateway.
#[test]
fn purchase_succeeds_and_resets() {
    let store = MemoryStore::seeded(21);
    store.insert("k1", make_dummy_document("Pixel 8a", 52999.0));
    let catalog = block_on(store.load_catalog());
    let product = catalog.find("k1").unwrap();

    let mut gateway = SimulatedGateway::seeded(1, 1.0);
    let mut checkout = Checkout::new();
    checkout.open();
    fill(&mut checkout);
    checkout.submit().unwrap();
    assert!(checkout.is_processing());

    let request = checkout.form().charge_request(product.id.as_str(), product.price);
    assert_eq!(request.card_last4, "1111");
    checkout.resolve(gateway.charge(&request));

    match checkout.status() {
        CheckoutStatus::Succeeded(receipt) => assert_eq!(receipt.amount, 52999.0),
        other => panic!("expected success, got {other}"),
    }
    assert!(!checkout.close(), "success panel cannot be cancelled");

    checkout.finish();
    assert!(!checkout.is_open());
    assert_eq!(checkout.form().card_number, "");
}

/// A decline keeps the typed values so "Try Again" resubmits them.
#[test]
fn declined_payment_can_be_retried() {
    // StepRng(u64::MAX) makes gen_bool(p) false for any p < 1.
    let mut declining = SimulatedGateway::with_rng(StepRng::new(u64::MAX, 0), 0.8);
    let mut checkout = Checkout::new();
    checkout.open();
    fill(&mut checkout);
    checkout.submit().unwrap();
    let request = checkout.form().charge_request("k1", 999.0);
    checkout.resolve(declining.charge(&request));

    assert!(matches!(checkout.status(), CheckoutStatus::Failed { .. }));
    checkout.retry();
    assert_eq!(checkout.status(), &CheckoutStatus::Idle);
    assert_eq!(checkout.form().name, "Asha Rao");
    assert_eq!(checkout.submit(), Ok(()));
}

#[test]
fn invalid_form_never_reaches_the_gateway() {
    let mut checkout = Checkout::new();
    checkout.open();
    checkout.edit(CheckoutField::CardNumber, "1234".into());
    assert_eq!(checkout.submit(), Err(SubmitRejected::Invalid));
    assert_eq!(checkout.errors().len(), CheckoutField::all().len());
    assert_eq!(checkout.status(), &CheckoutStatus::Idle);
}
