//! End-to-end webhook flows through the use-case handlers, with the real
//! Tally verifier and mocked providers elsewhere.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;

use funnelwire::adapters::tally::TallyVerifier;
use funnelwire::application::handlers::{
    FormWebhookHandler, MailerIdentity, PaymentWebhookHandler, WebhookError,
};
use funnelwire::domain::{Catalogue, EmailTouchpoint, Product, Waitlist};
use funnelwire::ports::{
    ContactRequest, DnsResolver, EmailApiError, EmailProvider, LineItem, MailAddress, MailRequest,
    PaymentError, PaymentEvent, PaymentEventType, PaymentProvider,
};

const TALLY_SECRET: &str = "tally_signing_secret";

fn tally_signature(payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TALLY_SECRET.as_bytes()).unwrap();
    mac.update(payload);
    BASE64.encode(mac.finalize().into_bytes())
}

#[derive(Default)]
struct RecordingEmailProvider {
    upserts: Mutex<Vec<ContactRequest>>,
    sends: Mutex<Vec<MailRequest>>,
    fail_sends: bool,
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    async fn upsert_contact(
        &self,
        request: &ContactRequest,
    ) -> Result<Option<String>, EmailApiError> {
        self.upserts.lock().unwrap().push(request.clone());
        Ok(Some("job-1".to_string()))
    }

    async fn send_template(&self, request: MailRequest) -> Result<(), EmailApiError> {
        self.sends.lock().unwrap().push(request);
        if self.fail_sends {
            Err(EmailApiError::Network("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    async fn create_list(&self, _name: &str) -> Result<(), EmailApiError> {
        Ok(())
    }
}

struct AlwaysResolves;

#[async_trait]
impl DnsResolver for AlwaysResolves {
    async fn has_mx_records(&self, _host: &str) -> bool {
        true
    }

    async fn has_ip_records(&self, _host: &str) -> bool {
        true
    }
}

struct ScriptedPaymentProvider {
    event: PaymentEvent,
    line_items: Vec<LineItem>,
}

#[async_trait]
impl PaymentProvider for ScriptedPaymentProvider {
    fn construct_event(
        &self,
        _payload: &[u8],
        _signature: &str,
    ) -> Result<PaymentEvent, PaymentError> {
        Ok(self.event.clone())
    }

    async fn list_line_items(&self, _session_id: &str) -> Result<Vec<LineItem>, PaymentError> {
        Ok(self.line_items.clone())
    }
}

fn catalogue() -> Arc<Catalogue> {
    Arc::new(Catalogue::new(
        vec![
            Product {
                name: "Starter Kit".into(),
                stripe_id: "prod_a".into(),
                url: "https://shop.example.com/starter".into(),
                purchase_thankyou: EmailTouchpoint {
                    list_ids: vec!["list-a".into()],
                    template_id: "d-starter".into(),
                },
            },
            Product {
                name: "Pro Kit".into(),
                stripe_id: "prod_b".into(),
                url: "https://shop.example.com/pro".into(),
                purchase_thankyou: EmailTouchpoint {
                    list_ids: vec!["list-b".into()],
                    template_id: "d-pro".into(),
                },
            },
        ],
        vec![Waitlist {
            name: "beta".into(),
            form_id: "form_abc".into(),
            list_ids: vec!["list-waitlist".into()],
        }],
    ))
}

fn mailer() -> MailerIdentity {
    MailerIdentity {
        from: MailAddress::new("noreply@example.com", "Shop"),
        reply_to: MailAddress::new("help@example.com", ""),
    }
}

fn line_item(id: &str, product: &str) -> LineItem {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "quantity": 1,
        "price": {"id": format!("price_{id}"), "product": product},
    }))
    .unwrap()
}

fn form_handler(email: Arc<RecordingEmailProvider>) -> FormWebhookHandler {
    FormWebhookHandler::new(
        Arc::new(TallyVerifier::new(SecretString::new(
            TALLY_SECRET.to_string(),
        ))),
        email,
        Arc::new(AlwaysResolves),
        catalogue(),
    )
}

#[tokio::test]
async fn tally_signup_flows_from_signed_body_to_upsert() {
    let body = serde_json::json!({
        "eventId": "ev_1",
        "eventType": "FORM_RESPONSE",
        "createdAt": "2024-05-01T12:00:00Z",
        "data": {
            "responseId": "resp_1",
            "formId": "form_abc",
            "fields": [
                {"key": "q1", "label": "Name", "type": "INPUT_TEXT", "value": "Jane"},
                {"key": "q2", "label": "Your Email", "type": "INPUT_EMAIL", "value": "Jane@Example.com"},
            ],
        },
    })
    .to_string();

    let email = Arc::new(RecordingEmailProvider::default());
    form_handler(email.clone())
        .handle(body.as_bytes(), &tally_signature(body.as_bytes()))
        .await
        .unwrap();

    let upserts = email.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].list_ids, vec!["list-waitlist".to_string()]);
    assert_eq!(upserts[0].contacts[0].email, "jane@example.com");
}

#[tokio::test]
async fn tally_delivery_with_bad_signature_is_rejected() {
    let body = br#"{"eventId": "ev_1", "eventType": "FORM_RESPONSE"}"#;

    let email = Arc::new(RecordingEmailProvider::default());
    let err = form_handler(email.clone())
        .handle(body, "bm90IGEgcmVhbCBzaWduYXR1cmU=")
        .await
        .unwrap_err();

    assert!(matches!(err, WebhookError::Rejected(_)));
    assert!(email.upserts.lock().unwrap().is_empty());
}

fn checkout_event() -> PaymentEvent {
    PaymentEvent {
        id: "evt_1".into(),
        event_type: PaymentEventType::CheckoutSessionCompleted,
        created: 1_700_000_000,
        data: serde_json::json!({
            "id": "cs_1",
            "mode": "payment",
            "payment_status": "paid",
            "customer_details": {"name": "Jane Q Public", "email": "jane@example.com"}
        }),
    }
}

#[tokio::test]
async fn paid_checkout_fans_out_per_line_item_in_order() {
    let email = Arc::new(RecordingEmailProvider::default());
    let handler = PaymentWebhookHandler::new(
        Arc::new(ScriptedPaymentProvider {
            event: checkout_event(),
            line_items: vec![line_item("li_1", "prod_a"), line_item("li_2", "prod_b")],
        }),
        email.clone(),
        catalogue(),
        mailer(),
    );

    handler.handle(b"{}", "sig").await.unwrap();

    let upserts = email.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[0].list_ids, vec!["list-a".to_string()]);
    assert_eq!(upserts[1].list_ids, vec!["list-b".to_string()]);

    let sends = email.sends.lock().unwrap();
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[0].template_id, "d-starter");
    assert_eq!(sends[1].template_id, "d-pro");
    assert_eq!(sends[0].from.email, "noreply@example.com");
    assert_eq!(
        sends[0].personalizations[0].custom_args["checkout_session_id"],
        "cs_1"
    );
    assert_eq!(
        sends[1].personalizations[0].custom_args["line_item_id"],
        "li_2"
    );
}

#[tokio::test]
async fn downstream_send_failures_still_acknowledge_the_webhook() {
    let email = Arc::new(RecordingEmailProvider {
        fail_sends: true,
        ..RecordingEmailProvider::default()
    });
    let handler = PaymentWebhookHandler::new(
        Arc::new(ScriptedPaymentProvider {
            event: checkout_event(),
            line_items: vec![line_item("li_1", "prod_a"), line_item("li_2", "prod_b")],
        }),
        email.clone(),
        catalogue(),
        mailer(),
    );

    // Both sends fail, but the delivery is still acknowledged.
    handler.handle(b"{}", "sig").await.unwrap();
    assert_eq!(email.sends.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unrecognized_payment_event_is_acknowledged_without_work() {
    let email = Arc::new(RecordingEmailProvider::default());
    let handler = PaymentWebhookHandler::new(
        Arc::new(ScriptedPaymentProvider {
            event: PaymentEvent {
                id: "evt_9".into(),
                event_type: PaymentEventType::Unrecognized("customer.created".into()),
                created: 1_700_000_000,
                data: serde_json::Value::Null,
            },
            line_items: vec![],
        }),
        email.clone(),
        catalogue(),
        mailer(),
    );

    handler.handle(b"{}", "sig").await.unwrap();
    assert!(email.upserts.lock().unwrap().is_empty());
    assert!(email.sends.lock().unwrap().is_empty());
}
