use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use certbundle::config::{CertificateSettings, Config, DEFAULT_KEY_BITS, DEFAULT_VALIDITY_DAYS};
use certbundle::engine::{CryptoEngine, NativeEngine, OpensslCli};
use certbundle::orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineKind {
    /// In-process RustCrypto implementation
    Native,
    /// The openssl command line tool
    Openssl,
}

/// Create certificates for configuring APIService.
///
/// Generates self-signed certificate bundles for the apiserver and db
/// components into the output directory, e.g.
/// `certbundle --name nameofservice --namespace mysystemnamespace`.
#[derive(Debug, Parser)]
#[command(name = "certbundle", version)]
struct Args {
    /// logical name of the service
    #[arg(long, default_value = "")]
    name: String,
    /// namespace the service runs in
    #[arg(long, default_value = "")]
    namespace: String,
    /// directory to output the bundles to
    #[arg(long, default_value = certbundle::config::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,
    /// cryptography engine
    #[arg(long, value_enum, default_value_t = EngineKind::Native)]
    engine: EngineKind,
    /// openssl binary used by the openssl engine
    #[arg(long, default_value = "openssl")]
    openssl: PathBuf,
    /// kill an openssl invocation after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// RSA key size
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    key_bits: usize,
    /// certificate validity in days
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    days: u32,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::builder()
        .name(args.name)
        .namespace(args.namespace)
        .output(args.output)
        .settings(CertificateSettings {
            key_bits: args.key_bits,
            validity_days: args.days,
        })
        .build();

    let engine: Box<dyn CryptoEngine> = match args.engine {
        EngineKind::Native => Box::new(NativeEngine::new()),
        EngineKind::Openssl => {
            let mut openssl = OpensslCli::new(args.openssl);
            if let Some(secs) = args.timeout_secs {
                openssl = openssl.with_timeout(Duration::from_secs(secs));
            }
            Box::new(openssl)
        }
    };

    Orchestrator::new(engine.as_ref(), &config)
        .run()
        .with_context(|| format!("provisioning bundles in {}", config.output.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
