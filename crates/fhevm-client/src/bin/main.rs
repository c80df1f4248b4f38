//! fhevm-client CLI
//!
//! Run with:
//! ```bash
//! cargo run -p fhevm-client -- --rpc-url http://localhost:8545 --value 12345
//! ```
//!
//! Loads an instance for the chain, encrypts `--value` for
//! (`--contract`, wallet) and decrypts the handle back.

use alloy_primitives::{Address, U256};
use clap::Parser;
use fhevm_client::{
    BackendLoader, DecryptOptions, DecryptionAuthorizer, FhevmManager, InputEncryptor,
    LocalWallet, RpcMetadataSource,
};
use fhevm_core::{FhevmConfig, HandleContractPair, MetadataSource, WalletProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fhevm-client")]
#[command(about = "Encrypt and decrypt values against an fhEVM network")]
struct Args {
    /// Wallet RPC URL
    #[arg(long, default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Chain ID (default: 31337 local dev chain)
    #[arg(long, default_value = "31337")]
    chain_id: u64,

    /// Hex private key of the submitting account (random if omitted)
    #[arg(long)]
    private_key: Option<String>,

    /// Contract the input is bound to
    #[arg(long, default_value = "0x000000000000000000000000000000000000aaaa")]
    contract: Address,

    /// Plaintext value to encrypt
    #[arg(long, default_value = "12345")]
    value: U256,

    /// Bit width of the value (1, 8, 16, 32, 64, 128, 160, 256)
    #[arg(long, default_value = "64")]
    bits: u16,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Just check backend metadata and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fhevm_client=info".parse()?))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FhevmConfig::load(path)?,
        None => FhevmConfig::default(),
    };

    if args.check {
        match config.mock_rpc_url(args.chain_id) {
            Some(url) => {
                let source = RpcMetadataSource::new(config.metadata_method.clone());
                match source.fetch_metadata(url).await {
                    Some(m) => {
                        println!("[OK] Local backend metadata from {}", url);
                        println!("  ACL:            {}", m.acl_address);
                        println!("  InputVerifier:  {}", m.input_verifier_address);
                        println!("  KMSVerifier:    {}", m.kms_verifier_address);
                    }
                    None => anyhow::bail!("no backend metadata at {}", url),
                }
            }
            None => {
                println!("[OK] Chain {} uses the relayer backend", args.chain_id);
                println!("{}", serde_json::to_string_pretty(&config.relayer)?);
            }
        }
        return Ok(());
    }

    let wallet = match &args.private_key {
        Some(key) => LocalWallet::from_private_key_hex(key)?,
        None => LocalWallet::random(),
    };

    let manager = FhevmManager::new(Arc::new(BackendLoader::new(&config)));
    manager.set_chain_id(Some(args.chain_id));
    manager.set_provider(Some(WalletProvider::new(args.rpc_url.clone())));
    let instance = manager.wait_ready().await?;
    println!(
        "[OK] {} instance ready on chain {}",
        instance.backend(),
        instance.chain_id()
    );

    let input = InputEncryptor::new(manager.clone())
        .encrypt_value(args.contract, wallet.address(), args.value, args.bits)
        .await?;
    println!("handle: {}", input.handle);
    println!("proof:  {}", input.proof);

    let key = input.handle.to_string();
    let authorizer = DecryptionAuthorizer::new(manager)
        .with_default_duration(config.decrypt_duration_days);
    let values = authorizer
        .user_decrypt(
            &wallet,
            &[HandleContractPair::new(key.clone(), args.contract)],
            DecryptOptions::default(),
        )
        .await?;
    match values.get(&key) {
        Some(v) => println!("[OK] decrypted: {}", v),
        None => anyhow::bail!("no cleartext for {}", key),
    }

    Ok(())
}
