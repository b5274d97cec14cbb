//! aes-tool: AES-256 mode envelopes from the command line
//!
//! Usage:
//!   aes-tool --operation encrypt --mode CBC --key secret -i message.txt -o message.enc
//!   aes-tool --operation decrypt --mode CBC --key secret -i message.enc
//!   aes-tool --operation tamper  --mode GCM --key secret -i message.enc
//!   aes-tool --operation generate-key

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use aes_modes::payload::{self, ImageKind};
use aes_modes::{envelope, generate_passphrase, CipherModeError, Engine, Mode, TraceEntry};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{info, warn};

/// Encrypt and decrypt with AES-256 under ECB, CBC, CTR, CFB, OFB or GCM
#[derive(Parser)]
#[command(
    name = "aes-tool",
    about = "Encrypt and decrypt with AES-256 under ECB, CBC, CTR, CFB, OFB or GCM",
    long_about = "
The key is the SHA-256 of the given passphrase. Encryption writes a single
line envelope of colon-separated hex fields:

  ECB            CIPHERTEXT
  CBC, CFB, OFB  IV:CIPHERTEXT
  CTR            NONCE:CIPHERTEXT
  GCM            IV:AUTHTAG:CIPHERTEXT

Decryption reads that envelope back. Logs go to stderr; stdout only ever
carries the result.
"
)]
#[command(version)]
struct Cli {
    /// Operation to perform
    #[arg(long, value_enum)]
    operation: Operation,

    /// Mode of operation (ECB, CBC, CTR, CFB, OFB, GCM)
    #[arg(short, long, default_value = "GCM")]
    mode: Mode,

    /// Input file (stdin when absent)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout when absent)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Passphrase the key is derived from
    #[arg(short, long, env = "AES_TOOL_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Associated data bound into the GCM tag
    #[arg(long, value_name = "TEXT")]
    aad: Option<String>,

    /// Treat the payload as an image (base64-wrapped before encryption)
    #[arg(long)]
    image: bool,

    /// Write every intermediate state as JSON to this file
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Operation {
    Encrypt,
    Decrypt,
    /// Flip the last ciphertext digit and try to decrypt the result
    Tamper,
    /// Print a random 256-bit passphrase
    GenerateKey,
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn read_envelope(path: Option<&Path>) -> Result<String> {
    String::from_utf8(read_input(path)?).context("envelope is not UTF-8 text")
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, bytes).with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("writing stdout")?;
            stdout.flush().context("writing stdout")
        }
    }
}

fn write_trace(path: &Path, trace: &[TraceEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(trace).context("serializing trace")?;
    fs::write(path, json).with_context(|| format!("writing trace {}", path.display()))?;
    info!(entries = trace.len(), path = %path.display(), "trace written");
    Ok(())
}

fn passphrase(cli: &Cli) -> Result<&str> {
    match cli.key.as_deref() {
        Some(key) => Ok(key),
        None => bail!("a passphrase is required: pass --key or set AES_TOOL_KEY"),
    }
}

fn engine(cli: &Cli) -> Engine {
    match &cli.aad {
        Some(aad) => Engine::new().with_associated_data(aad.as_bytes()),
        None => Engine::new(),
    }
}

fn encrypt(cli: &Cli) -> Result<()> {
    let key = passphrase(cli)?;
    let input = read_input(cli.input.as_deref())?;

    let plaintext = if cli.image {
        match ImageKind::sniff(&input) {
            Some(kind) => info!(content_type = kind.content_type(), "encrypting image"),
            None => warn!("--image given but the input is not a JPEG, PNG or GIF"),
        }
        payload::encode_image(&input).into_bytes()
    } else {
        input
    };

    let engine = engine(cli);
    let envelope = match &cli.trace {
        Some(path) => {
            let encrypted = engine.encrypt_traced(&plaintext, key, cli.mode)?;
            write_trace(path, &encrypted.trace)?;
            encrypted.envelope
        }
        None => engine.encrypt(&plaintext, key, cli.mode)?,
    };

    write_output(cli.output.as_deref(), format!("{envelope}\n").as_bytes())
}

fn decrypt(cli: &Cli) -> Result<()> {
    let key = passphrase(cli)?;
    let wire = read_envelope(cli.input.as_deref())?;

    let engine = engine(cli);
    let plaintext = match &cli.trace {
        Some(path) => {
            let decrypted = engine.decrypt_traced(&wire, key, cli.mode)?;
            write_trace(path, &decrypted.trace)?;
            decrypted.plaintext
        }
        None => engine.decrypt(&wire, key, cli.mode)?,
    };

    let plaintext = if cli.image {
        let bytes = payload::decode_image(&plaintext)?;
        match ImageKind::sniff(&bytes) {
            Some(kind) => info!(content_type = kind.content_type(), "decrypted image"),
            None => warn!("decrypted payload is not a JPEG, PNG or GIF"),
        }
        bytes
    } else {
        plaintext
    };

    write_output(cli.output.as_deref(), &plaintext)
}

fn tamper(cli: &Cli) -> Result<()> {
    let key = passphrase(cli)?;
    let wire = read_envelope(cli.input.as_deref())?;

    let tampered = envelope::tamper(&wire)?;
    write_output(cli.output.as_deref(), format!("{tampered}\n").as_bytes())?;

    match engine(cli).decrypt(&tampered, key, cli.mode) {
        Err(CipherModeError::AuthenticationFailed) => {
            eprintln!("tampering detected: {}", CipherModeError::AuthenticationFailed);
            Ok(())
        }
        Err(e) => {
            eprintln!("tampered envelope rejected: {e}");
            Ok(())
        }
        Ok(_) if cli.mode == Mode::Gcm => bail!("tampered GCM envelope decrypted without error"),
        Ok(plaintext) => {
            eprintln!(
                "{} has no integrity check: the tampered envelope decrypted to {} bytes",
                cli.mode,
                plaintext.len()
            );
            Ok(())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match cli.operation {
        Operation::Encrypt => encrypt(cli),
        Operation::Decrypt => decrypt(cli),
        Operation::Tamper => tamper(cli),
        Operation::GenerateKey => {
            write_output(cli.output.as_deref(), format!("{}\n", generate_passphrase()).as_bytes())
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        operation = ?cli.operation,
        mode = %cli.mode,
        "aes-tool starting"
    );

    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aes-tool").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let parsed = cli(&["--operation", "generate-key"]);
        assert_eq!(parsed.operation, Operation::GenerateKey);
        assert_eq!(parsed.mode, Mode::Gcm);
        assert!(parsed.input.is_none());
        assert!(!parsed.image);
        assert_eq!(parsed.verbose, 0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(cli(&["--operation", "encrypt", "-m", "cbc"]).mode, Mode::Cbc);
        assert!(Cli::try_parse_from(["aes-tool", "--operation", "encrypt", "-m", "XTS"]).is_err());
    }

    #[test]
    fn test_encrypt_then_decrypt_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        let sealed = dir.path().join("plain.enc");
        let opened = dir.path().join("plain.out");
        let trace = dir.path().join("trace.json");
        fs::write(&plain, "HELLO WORLD").unwrap();

        let path = |p: &Path| p.to_str().unwrap().to_string();
        run(&cli(&[
            "--operation", "encrypt", "-m", "CBC", "-k", "mykey123",
            "-i", &path(&plain), "-o", &path(&sealed),
        ]))
        .unwrap();
        let envelope = fs::read_to_string(&sealed).unwrap();
        assert_eq!(envelope.trim().split(':').count(), 2);

        run(&cli(&[
            "--operation", "decrypt", "-m", "CBC", "-k", "mykey123",
            "-i", &path(&sealed), "-o", &path(&opened), "--trace", &path(&trace),
        ]))
        .unwrap();
        assert_eq!(fs::read(&opened).unwrap(), b"HELLO WORLD");

        let entries: Vec<TraceEntry> = serde_json::from_str(&fs::read_to_string(&trace).unwrap()).unwrap();
        assert!(!entries.is_empty());
        assert_eq!(entries[0].block_index, 0);
    }

    #[test]
    fn test_image_roundtrip_with_aad() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("pixel.gif");
        let sealed = dir.path().join("pixel.enc");
        let opened = dir.path().join("pixel.out");
        fs::write(&image, b"GIF89a\x01\x00\x01\x00").unwrap();

        let path = |p: &Path| p.to_str().unwrap().to_string();
        let common = ["-k", "secret", "--aad", "upload-7", "--image"];
        let mut args = vec!["--operation", "encrypt"];
        args.extend(common);
        let (input, output) = (path(&image), path(&sealed));
        args.extend(["-i", input.as_str(), "-o", output.as_str()]);
        run(&cli(&args)).unwrap();

        let mut args = vec!["--operation", "decrypt"];
        args.extend(common);
        let (input, output) = (path(&sealed), path(&opened));
        args.extend(["-i", input.as_str(), "-o", output.as_str()]);
        run(&cli(&args)).unwrap();

        assert_eq!(fs::read(&opened).unwrap(), b"GIF89a\x01\x00\x01\x00");
    }

    #[test]
    fn test_tamper_gcm_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let sealed = dir.path().join("msg.enc");
        let tampered = dir.path().join("msg.tampered");
        let wire = Engine::new().encrypt(b"test", "k", Mode::Gcm).unwrap();
        fs::write(&sealed, &wire).unwrap();

        let path = |p: &Path| p.to_str().unwrap().to_string();
        run(&cli(&[
            "--operation", "tamper", "-k", "k",
            "-i", &path(&sealed), "-o", &path(&tampered),
        ]))
        .unwrap();

        let flipped = fs::read_to_string(&tampered).unwrap();
        assert_ne!(flipped.trim(), wire);
        assert_eq!(flipped.trim().len(), wire.len());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let parsed = Cli {
            key: None,
            ..cli(&["--operation", "encrypt"])
        };
        let err = run(&parsed).unwrap_err();
        assert!(err.to_string().contains("passphrase is required"));
    }
}
