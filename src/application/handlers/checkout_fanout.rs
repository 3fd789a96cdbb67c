//! Per-line-item fan-out for a paid checkout session.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Catalogue, PersonName};
use crate::ports::{
    Contact, ContactRequest, EmailApiError, EmailProvider, LineItem, MailAddress, MailRequest,
    Personalization, VerifiedCheckoutSession,
};

/// From/reply-to identity stamped on every outbound mail.
#[derive(Debug, Clone)]
pub struct MailerIdentity {
    pub from: MailAddress,
    pub reply_to: MailAddress,
}

/// Which step of an item's processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutStage {
    ContactUpsert,
    TemplateSend,
}

impl std::fmt::Display for FanoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ContactUpsert => "contact upsert",
            Self::TemplateSend => "template send",
        })
    }
}

/// One failed step, tied to the line item it belongs to.
#[derive(Debug, Clone)]
pub struct FanoutFailure {
    pub item_index: usize,
    pub stage: FanoutStage,
    pub source: EmailApiError,
}

/// Aggregated outcome of a fan-out run.
///
/// Every line item is attempted; failures accumulate instead of aborting
/// the run, so one provider hiccup cannot starve the remaining items.
#[derive(Debug, Default)]
pub struct FanoutReport {
    pub items_processed: usize,
    pub errors: Vec<FanoutFailure>,
}

impl FanoutReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failure in item order, if any.
    pub fn first_error(&self) -> Option<&FanoutFailure> {
        self.errors.first()
    }

    /// Collapse the report into success or its first failure, for callers
    /// that do not need the full list.
    pub fn into_result(mut self) -> Result<(), FanoutFailure> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.remove(0))
        }
    }
}

/// Runs the purchase follow-up for each line item of a paid session:
/// subscribe the buyer to the product's mailing lists, then send the
/// product's thank-you template.
pub struct CheckoutFanout {
    email: Arc<dyn EmailProvider>,
    catalogue: Arc<Catalogue>,
    mailer: MailerIdentity,
}

impl CheckoutFanout {
    pub fn new(
        email: Arc<dyn EmailProvider>,
        catalogue: Arc<Catalogue>,
        mailer: MailerIdentity,
    ) -> Self {
        Self {
            email,
            catalogue,
            mailer,
        }
    }

    /// Process the session's line items sequentially, in provider order.
    ///
    /// Each item gets one upsert and one send; an upsert failure is recorded
    /// and the send still goes out, so a marketing-list hiccup cannot hold
    /// back the purchase confirmation.
    pub async fn run(
        &self,
        session: &VerifiedCheckoutSession,
        items: &[LineItem],
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        let name = PersonName::split(&session.customer_name);

        for (item_index, item) in items.iter().enumerate() {
            report.items_processed += 1;
            let product = self.catalogue.product_by_stripe_id(&item.price.product);
            debug!(
                session_id = %session.session_id,
                item_id = %item.id,
                product = %product.name,
                "processing line item"
            );

            let contact_request = ContactRequest {
                list_ids: product.purchase_thankyou.list_ids.clone(),
                contacts: vec![Contact {
                    email: session.customer_email.clone(),
                    first_name: non_empty(&name.first),
                    last_name: non_empty(&name.last),
                }],
            };
            match self.email.upsert_contact(&contact_request).await {
                Ok(Some(job_id)) => debug!(%job_id, "contact upsert accepted"),
                Ok(None) => {}
                Err(source) => {
                    warn!(item_id = %item.id, error = %source, "contact upsert failed");
                    report.errors.push(FanoutFailure {
                        item_index,
                        stage: FanoutStage::ContactUpsert,
                        source,
                    });
                }
            }

            let mail = self.thank_you_mail(session, item, &product, &name);
            if let Err(source) = self.email.send_template(mail).await {
                warn!(item_id = %item.id, error = %source, "thank-you send failed");
                report.errors.push(FanoutFailure {
                    item_index,
                    stage: FanoutStage::TemplateSend,
                    source,
                });
            }
        }

        report
    }

    fn thank_you_mail(
        &self,
        session: &VerifiedCheckoutSession,
        item: &LineItem,
        product: &crate::domain::Product,
        name: &PersonName,
    ) -> MailRequest {
        // Key names are part of the template contract; the configured
        // templates reference them verbatim.
        let mut template_data = serde_json::Map::new();
        template_data.insert("firstName".into(), name.first.clone().into());
        template_data.insert("productName".into(), product.name.clone().into());
        template_data.insert("productUrl".into(), product.url.clone().into());

        let mut custom_args = HashMap::new();
        custom_args.insert(
            "checkout_session_id".to_string(),
            session.session_id.clone(),
        );
        custom_args.insert("line_item_id".to_string(), item.id.clone());

        MailRequest {
            personalizations: vec![Personalization {
                to: vec![MailAddress::new(
                    session.customer_email.clone(),
                    session.customer_name.clone(),
                )],
                subject: None,
                dynamic_template_data: template_data,
                custom_args,
            }],
            from: self.mailer.from.clone(),
            reply_to: self.mailer.reply_to.clone(),
            template_id: product.purchase_thankyou.template_id.clone(),
            mail_settings: None,
            tracking_settings: None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
