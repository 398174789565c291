#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use sessiongate::app::app_router;
    use sessiongate::core::auth::{AuthApiState, JwtService};
    use sessiongate::core::config::Config;

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let addr = config.socket_addr()?;

    tracing::info!(
        "Config loaded: site_root={}, users_file={}, hashing={}",
        config.site_root,
        config.has_users_file(),
        config.password_hashing
    );

    let state = AuthApiState::from_config(&config, JwtService::from_env()).await?;
    let app = app_router(state, &config.site_root);

    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // the server needs the `ssr` feature; the library's session layer is
    // usable without it
}
