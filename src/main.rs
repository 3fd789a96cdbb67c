use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use funnelwire::adapters::dns::HickoryDnsResolver;
use funnelwire::adapters::http::{router, AppState};
use funnelwire::adapters::sendgrid::{SendGridClient, SendGridConfig};
use funnelwire::adapters::stripe::{StripeClient, StripeConfig};
use funnelwire::adapters::tally::TallyVerifier;
use funnelwire::application::handlers::{
    FormWebhookHandler, MailerIdentity, PaymentWebhookHandler,
};
use funnelwire::config::AppConfig;
use funnelwire::domain::Catalogue;
use funnelwire::ports::MailAddress;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("funnelwire=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let catalogue = Arc::new(Catalogue::new(
        config.products.clone(),
        config.waitlists.clone(),
    ));
    let payments = Arc::new(StripeClient::new(StripeConfig::new(
        config.stripe.api_key.clone(),
        config.stripe.webhook_secret.clone(),
    )));
    let forms = Arc::new(TallyVerifier::new(config.tally.signing_secret.clone()));
    let email = Arc::new(SendGridClient::new(SendGridConfig::new(
        config.sendgrid.api_key.clone(),
        config.sendgrid.sandbox,
    )));
    let dns = Arc::new(HickoryDnsResolver::new());

    let mailer = MailerIdentity {
        from: MailAddress::new(
            config.sendgrid.from_email.clone(),
            config.sendgrid.from_name.clone(),
        ),
        reply_to: MailAddress::new(config.sendgrid.reply_to().to_string(), ""),
    };

    // Everything the handlers need exists before the listener opens.
    let state = AppState {
        payment_webhook: Arc::new(PaymentWebhookHandler::new(
            payments,
            email.clone(),
            catalogue.clone(),
            mailer,
        )),
        form_webhook: Arc::new(FormWebhookHandler::new(forms, email, dns, catalogue)),
    };

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        sandbox = config.sendgrid.sandbox,
        "funnelwire listening"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
