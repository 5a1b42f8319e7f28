//! EchoTLS - A Minimal One-Client-at-a-Time TLS Request/Response Server
//!
//! This is the main entry point for the EchoTLS server.
//! It parses the configuration, loads the TLS credentials, binds the
//! listener, and runs the sequential accept loop until a client issues
//! the shutdown sentinel or the operator presses Ctrl+C.

use anyhow::Context;
use echotls::server::Server;
use echotls::{DEFAULT_CERT_PATH, DEFAULT_HOST, DEFAULT_KEY_PATH, DEFAULT_PORT};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Path of the PEM certificate chain
    cert: PathBuf,
    /// Path of the PEM private key
    key: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cert: PathBuf::from(DEFAULT_CERT_PATH),
            key: PathBuf::from(DEFAULT_KEY_PATH),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--cert" => {
                    if i + 1 < args.len() {
                        config.cert = PathBuf::from(&args[i + 1]);
                        i += 2;
                    } else {
                        eprintln!("Error: --cert requires a value");
                        std::process::exit(1);
                    }
                }
                "--key" => {
                    if i + 1 < args.len() {
                        config.key = PathBuf::from(&args[i + 1]);
                        i += 2;
                    } else {
                        eprintln!("Error: --key requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("EchoTLS version {}", echotls::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
EchoTLS - A Minimal One-Client-at-a-Time TLS Request/Response Server

USAGE:
    echotls [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 0.0.0.0)
    -p, --port <PORT>    Port to listen on (default: 11111)
        --cert <FILE>    PEM certificate chain (default: certs/server.crt)
        --key <FILE>     PEM private key (default: certs/server.key)
    -v, --version        Print version information
        --help           Print this help message

EXAMPLES:
    echotls                              # Start on 0.0.0.0:11111
    echotls --port 8443                  # Start on port 8443
    echotls --cert my.crt --key my.key   # Use your own credentials

CONNECTING:
    Any TLS client works; with openssl:
    $ openssl s_client -connect 127.0.0.1:11111 -quiet
    hello
    I hear ya fa shizzle!

    Sending a payload that starts with "shutdown" stops the server
    after it replies.
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"

        ███████╗ ██████╗██╗  ██╗ ██████╗ ████████╗██╗     ███████╗
        ██╔════╝██╔════╝██║  ██║██╔═══██╗╚══██╔══╝██║     ██╔════╝
        █████╗  ██║     ███████║██║   ██║   ██║   ██║     ███████╗
        ██╔══╝  ██║     ██╔══██║██║   ██║   ██║   ██║     ╚════██║
        ███████╗╚██████╗██║  ██║╚██████╔╝   ██║   ███████╗███████║
        ╚══════╝ ╚═════╝╚═╝  ╚═╝ ╚═════╝    ╚═╝   ╚══════╝╚══════╝

EchoTLS v{} - Minimal One-Client-at-a-Time TLS Server
──────────────────────────────────────────────────────────────
Server starting on {}
One client is served at a time; send "shutdown" to stop.

Use Ctrl+C to shutdown gracefully.
"#,
        echotls::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Fail-fast setup: credentials and listener, or a clear startup error
    let server = Server::bind(&config.bind_address(), &config.cert, &config.key)
        .await
        .with_context(|| format!("failed to start server on {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Serve until a client sends the shutdown sentinel or Ctrl+C arrives
    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}
