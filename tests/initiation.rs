use support_gateway::config::{Environment, EsewaConfig};
use support_gateway::domain::contribution::{validate_intent, ContributionStatus, PaymentIntent};
use support_gateway::gateways::esewa::EsewaGateway;
use support_gateway::gateways::mock::MockGateway;
use support_gateway::gateways::{RedirectInstruction, SupportGateway, VerificationRef};
use support_gateway::money::{format_rupees, parse_rupees};
use uuid::Uuid;

fn intent(amount_paisa: i64) -> PaymentIntent {
    PaymentIntent {
        amount_paisa,
        creator_id: "c1".to_string(),
        supporter_id: "s1".to_string(),
        message: Some("keep going".to_string()),
        tier_level: Some(2),
    }
}

fn esewa() -> EsewaGateway {
    EsewaGateway {
        config: EsewaConfig::resolve(Environment::Test, None, None, None, None, 5000).unwrap(),
        success_url: "http://localhost:3000/contributions/callback/success".to_string(),
        failure_url: "http://localhost:3000/contributions/callback/failure".to_string(),
        client: reqwest::Client::new(),
    }
}

fn field<'a>(fields: &'a [support_gateway::gateways::FormField], name: &str) -> &'a str {
    &fields
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("missing form field {name}"))
        .value
}

#[test]
fn builder_rejects_invalid_intents_before_any_gateway_work() {
    assert!(validate_intent(&intent(0)).is_err());
    assert!(validate_intent(&intent(-1)).is_err());

    let mut missing_creator = intent(100);
    missing_creator.creator_id = String::new();
    assert!(validate_intent(&missing_creator).is_err());
}

#[test]
fn esewa_form_carries_the_signed_contract_fields() {
    let id = Uuid::parse_str("2f3e9c6a-4b1d-4d2e-9f3a-8c7b6a5d4e3f").unwrap();
    let (action_url, fields) = esewa().build_form(&intent(50_000), id).unwrap();

    assert_eq!(action_url, "https://rc-epay.esewa.com.np/api/epay/main/v2/form");
    assert_eq!(field(&fields, "total_amount"), "500");
    assert_eq!(field(&fields, "amount"), "500");
    assert_eq!(field(&fields, "transaction_uuid"), id.to_string());
    assert_eq!(field(&fields, "product_code"), "EPAYTEST");
    assert_eq!(
        field(&fields, "signed_field_names"),
        "total_amount,transaction_uuid,product_code"
    );
    // Same vector as the independent HMAC implementation in tests/signature.rs.
    assert_eq!(
        field(&fields, "signature"),
        "Ww2pGjfbTWHQACjbgcd//estzGMvvaQbYpp7MWy1rMA="
    );
    assert_eq!(
        field(&fields, "success_url"),
        format!("http://localhost:3000/contributions/callback/success/{id}")
    );
}

#[test]
fn gateway_request_amount_round_trips_exactly() {
    for paisa in [1i64, 99, 100, 50_000, 50_050, 999_999_99] {
        let formatted = format_rupees(paisa);
        assert_eq!(parse_rupees(&formatted).unwrap(), paisa);
    }

    let id = Uuid::new_v4();
    let (_, fields) = esewa().build_form(&intent(50_050), id).unwrap();
    assert_eq!(parse_rupees(field(&fields, "total_amount")).unwrap(), 50_050);
}

#[tokio::test]
async fn mock_gateway_drives_the_initiation_seam() {
    let gateway: &dyn SupportGateway = &MockGateway {
        behavior: "ALWAYS_COMPLETE".to_string(),
    };
    let id = Uuid::new_v4();

    let outcome = gateway.initiate(&intent(100), id).await.unwrap();
    match outcome.redirect {
        RedirectInstruction::Url { payment_url } => {
            assert_eq!(payment_url, format!("mock://pay/{id}"));
        }
        RedirectInstruction::Form { .. } => panic!("mock gateway redirects by url"),
    }
    assert_eq!(outcome.gateway_ref.as_deref(), Some(format!("mock_{id}").as_str()));
}

#[tokio::test]
async fn canceled_verification_never_reads_as_success() {
    let gateway = MockGateway {
        behavior: "ALWAYS_CANCELED".to_string(),
    };

    let result = gateway
        .verify(&VerificationRef::Esewa {
            transaction_uuid: "t1".to_string(),
            total_amount_paisa: 100,
        })
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, ContributionStatus::Canceled);
}
