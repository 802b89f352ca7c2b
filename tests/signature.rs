use support_gateway::error::PaymentError;
use support_gateway::gateways::signature::{sign, SignatureMaterial};

const ESEWA_UAT_KEY: &str = "8gBm/:&EnhH.1/q";

#[test]
fn sign_is_deterministic() {
    let a = sign("secret-key", "a=1,b=2").unwrap();
    let b = sign("secret-key", "a=1,b=2").unwrap();
    assert_eq!(a, b);
}

#[test]
fn matches_independent_hmac_sha256_implementation() {
    // Vectors produced with an independent HMAC-SHA256 + base64 implementation.
    assert_eq!(
        sign("secret-key", "a=1,b=2").unwrap(),
        "B7t/MPvmIsOpHceBylbiYvND80+RJJ2Pw9/QD+AoeX8="
    );
    assert_eq!(
        sign(
            ESEWA_UAT_KEY,
            "total_amount=100,transaction_uuid=11-201-13,product_code=EPAYTEST"
        )
        .unwrap(),
        "5DZywcrTKD0gia/rsSMcrRHmJl+4Tbol6S+lWgdJ94E="
    );
}

#[test]
fn esewa_scenario_produces_stable_signature() {
    let mut material = SignatureMaterial::new();
    material.push("total_amount", "500");
    material.push("transaction_uuid", "2f3e9c6a-4b1d-4d2e-9f3a-8c7b6a5d4e3f");
    material.push("product_code", "EPAYTEST");

    assert_eq!(
        material.message(),
        "total_amount=500,transaction_uuid=2f3e9c6a-4b1d-4d2e-9f3a-8c7b6a5d4e3f,product_code=EPAYTEST"
    );
    assert_eq!(
        sign(ESEWA_UAT_KEY, &material.message()).unwrap(),
        "Ww2pGjfbTWHQACjbgcd//estzGMvvaQbYpp7MWy1rMA="
    );
}

#[test]
fn field_order_changes_the_message() {
    let mut a = SignatureMaterial::new();
    a.push("total_amount", "500");
    a.push("transaction_uuid", "t1");

    let mut b = SignatureMaterial::new();
    b.push("transaction_uuid", "t1");
    b.push("total_amount", "500");

    assert_ne!(a.message(), b.message());
    assert_ne!(
        sign("k", &a.message()).unwrap(),
        sign("k", &b.message()).unwrap()
    );
}

#[test]
fn signed_field_names_follow_insertion_order() {
    let mut material = SignatureMaterial::new();
    material.push("total_amount", "500");
    material.push("transaction_uuid", "t1");
    material.push("product_code", "EPAYTEST");
    assert_eq!(material.field_names(), "total_amount,transaction_uuid,product_code");
}

#[test]
fn empty_secret_is_a_configuration_error() {
    let out = sign("", "a=1");
    assert!(matches!(out, Err(PaymentError::Configuration(_))));
}
