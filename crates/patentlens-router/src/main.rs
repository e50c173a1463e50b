//! patentlens-router: patent proxy and sign-in server.

use patentlens_router::{config::RouterConfig, start_server, RouterError};

const CONFIG_ENV: &str = "PATENTLENS_ROUTER_CONFIG";

const USAGE: &str = "\
patentlens-router - patent page proxy with structured extraction

USAGE:
    patentlens-router [--config <router.toml>]

The config path may also come from PATENTLENS_ROUTER_CONFIG. Without one the
server starts on the built-in development config.

CONFIG KEYS:
    bind_address, bind_port   listen address
    jwt_secret                session signing secret (PATENTLENS_JWT_SECRET overrides)
    token_expiry_secs         session lifetime, default 3600
    cors_origins              browser origins allowed to call the API
    [fetch]                   upstream timeouts and request headers
    [extractor]               document host, extension and URL templates
    [rendering]               optional rendering service for challenged pages

Log verbosity follows RUST_LOG, e.g. RUST_LOG=patentlens_router=debug.
";

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let config_path = match args.next().as_deref() {
        Some("--help" | "-h") => {
            print!("{USAGE}");
            return;
        }
        Some("--config") => args.next(),
        Some(other) => {
            eprintln!("Unexpected argument: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
        None => std::env::var(CONFIG_ENV).ok().filter(|path| !path.is_empty()),
    };

    if let Err(e) = serve(config_path).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(config_path: Option<String>) -> Result<(), RouterError> {
    let config = match config_path {
        Some(path) => RouterConfig::from_file(&path)?,
        None => {
            eprintln!("No config given; using the development config");
            RouterConfig::default_test_config()
        }
    };
    start_server(config).await
}
