use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use fcm_push::{
    AccessTokenProvider, FcmClient, HttpTransport, ReqwestTransport, ServiceAccountKey,
    ServiceCredential,
};
use push_service::{handlers::register_routes, Config, PushDispatcher, RestDeviceTokenStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting push service");

    let config = Config::from_env().context("loading configuration")?;

    // Credential is parsed once and shared read-only by every request
    let account = ServiceAccountKey::from_json(&config.firebase.account_secrets)
        .context("loading Firebase service account")?;
    let credential = Arc::new(ServiceCredential::from_service_account(&account)?);
    tracing::info!(project_id = %account.project_id, "Firebase credentials loaded");

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    let tokens = AccessTokenProvider::new(credential, transport.clone());
    let mut fcm = FcmClient::new(account.project_id.clone(), tokens, transport.clone());
    if let Some(base_url) = &config.firebase.base_url {
        fcm = fcm.with_base_url(base_url.clone());
    }

    let store = Arc::new(RestDeviceTokenStore::new(config.supabase.clone(), transport));
    let dispatcher = Arc::new(PushDispatcher::new(store, fcm));

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!(env = %config.app.env, "Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(dispatcher.clone()))
            .wrap(middleware::Logger::default())
            .configure(register_routes)
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
