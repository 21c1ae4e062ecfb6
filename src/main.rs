#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use payslip::{
    auth::{hash_password, UserDirectory},
    build_dispatcher, dispatch_request,
    router::InitState,
    session::TokenStore,
    settings::PayslipSettings,
    Dispatcher, VERSION,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // `payslip hash-password <password>` prints a PHC string for Settings.toml
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, password] = args.as_slice() {
        if command == "hash-password" {
            let hash = hash_password(password).context("Failed to hash password")?;
            println!("{hash}");
            return Ok(());
        }
    }

    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = PayslipSettings::load().context("Failed to load settings")?;

    let directory = Arc::new(
        UserDirectory::from_settings(&settings.users).context("Failed to load users")?,
    );
    if directory.is_empty() {
        log::warn!("No users configured; every login will be rejected");
    }

    let store = Arc::new(TokenStore::new(settings.token_config()));
    let init = Arc::new(InitState::default());
    init.set_payroll_period(
        settings
            .payroll_period()
            .context("Failed to load payroll period")?,
    );

    let dispatcher = build_dispatcher(&settings, store, directory, init)
        .context("Failed to register routes")?;

    start_server(dispatcher, settings).await
}

/// Start the HTTP server with the dispatcher as the catch-all service
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(dispatcher: Dispatcher, settings: PayslipSettings) -> anyhow::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings, &dispatcher);

    let dispatcher = web::Data::new(dispatcher);
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .max_age(3600);

        App::new()
            .app_data(dispatcher.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .default_service(web::route().to(dispatch_request))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server error")
}

fn print_startup_info(bind_address: &str, settings: &PayslipSettings, dispatcher: &Dispatcher) {
    println!("Starting Payslip gateway v{VERSION} on http://{bind_address}");
    println!(
        "Access tokens: {}m, refresh tokens: {}h",
        settings.session.access_ttl_minutes, settings.session.refresh_ttl_hours
    );
    println!();
    println!("Routes:");
    for (method, path) in dispatcher.registry().routes() {
        let access = if dispatcher.public_paths().is_public(&path) {
            "public"
        } else {
            "bearer"
        };
        println!("  {:<6} {path:<16} ({access})", method.as_str());
    }
}
