#![forbid(unsafe_code)]
//! Command-line front end for sealpack.
//!
//! Drives the library through the task protocol (one worker per
//! invocation), printing progress to stderr. `--stream` switches the file
//! paths to constant-memory disk streaming.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use sealpack::{
    DEFAULT_CHUNK_SIZE, Keypair, Mode, Scheme, SealOptions, TaskEvent, TaskRequest,
    armor_encode, dearmor_decode, decrypt_file_streaming, default_decrypt_output_path,
    default_out_path, encrypt_file_streaming, load_public, load_secret, spawn_task,
    write_all_atomic,
};

#[derive(Parser, Debug)]
#[command(
    name = "sealpack",
    version,
    about = "Encrypt/decrypt files and messages into chunked containers"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a file or a short text message
    Enc(EncArgs),
    /// Decrypt a container
    Dec(DecArgs),
    /// Generate an X25519 keypair for the asymmetric scheme
    Keygen(KeygenArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemeChoice {
    Symmetric,
    Asymmetric,
}

impl From<SchemeChoice> for Scheme {
    fn from(v: SchemeChoice) -> Self {
        match v {
            SchemeChoice::Symmetric => Scheme::Symmetric,
            SchemeChoice::Asymmetric => Scheme::Asymmetric,
        }
    }
}

#[derive(Args, Debug)]
struct EncArgs {
    /// Input file
    #[arg(short = 'i', long = "in", conflicts_with = "message")]
    input: Option<PathBuf>,

    /// Encrypt a short text message instead of a file (prints armored output)
    #[arg(short = 'm', long)]
    message: Option<String>,

    /// Output file (encrypted). If omitted, ".enc" is appended.
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    #[arg(short = 's', long, value_enum, default_value_t = SchemeChoice::Symmetric)]
    scheme: SchemeChoice,

    /// Recipient public key file (asymmetric scheme)
    #[arg(long = "public-key")]
    public_key: Option<PathBuf>,

    /// ASCII armor the output (Base64) for copy/paste
    #[arg(long)]
    armor: bool,

    /// Overwrite output if it exists
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Stream the file from disk in constant memory
    #[arg(long)]
    stream: bool,

    /// Chunk size in bytes. Default: 5 MiB.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Read password from file instead of interactive prompt
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecArgs {
    /// Input file (container)
    #[arg(short = 'i', long = "in", conflicts_with = "message")]
    input: Option<PathBuf>,

    /// Decrypt an armored text message instead of a file (prints the text)
    #[arg(short = 'm', long)]
    message: Option<String>,

    /// Output file (plaintext). If omitted, ".enc" is stripped or ".dec" is appended.
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    #[arg(short = 's', long, value_enum, default_value_t = SchemeChoice::Symmetric)]
    scheme: SchemeChoice,

    /// Secret key file (asymmetric scheme)
    #[arg(long = "secret-key")]
    secret_key: Option<PathBuf>,

    /// Overwrite the output file if it already exists
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Stream the container from disk in constant memory
    #[arg(long)]
    stream: bool,

    /// Read password from file instead of interactive prompt
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct KeygenArgs {
    /// Where to write the public key (hex)
    #[arg(long, default_value = "sealpack.pub")]
    public: PathBuf,

    /// Where to write the secret key (hex, 0600 on Unix)
    #[arg(long, default_value = "sealpack.key")]
    secret: PathBuf,

    /// Overwrite existing key files
    #[arg(short = 'f', long = "force")]
    force: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Enc(a) => cmd_enc(a),
        Command::Dec(a) => cmd_dec(a),
        Command::Keygen(a) => cmd_keygen(a),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_password(password_file: &Option<PathBuf>, prompt: &str) -> Result<SecretString> {
    if let Some(path) = password_file {
        let mut s = String::new();
        fs::File::open(path)?.read_to_string(&mut s)?;

        // Create SecretString directly from trimmed slice to avoid intermediate copies
        let secret = SecretString::new(
            s.trim_end_matches(&['\r', '\n'][..])
                .to_owned()
                .into_boxed_str(),
        );

        // Zero the original string that contained the password
        use zeroize::Zeroize;
        s.zeroize();
        Ok(secret)
    } else {
        let pw = rpassword::prompt_password(prompt)?;
        Ok(SecretString::new(pw.into_boxed_str()))
    }
}

fn print_progress(percent: u8, stage: &str) -> bool {
    eprintln!("{percent:>3}% {stage}");
    true
}

fn options_for(scheme: SchemeChoice, chunk_size: usize, armor: bool, force: bool) -> SealOptions {
    SealOptions {
        scheme: scheme.into(),
        chunk_size,
        armor,
        force,
        ..Default::default()
    }
}

/// Drain a task's events, printing progress; return the terminal output.
fn drive_task(request: TaskRequest) -> Result<sealpack::TaskOutput> {
    let handle = spawn_task(request).context("failed to start worker")?;
    for event in handle.events.iter() {
        match event {
            TaskEvent::Progress { percent, stage } => {
                eprintln!("{percent:>3}% {stage}");
            }
            TaskEvent::Completed(output) => return Ok(output),
            TaskEvent::Failed(error) => return Err(error.into()),
        }
    }
    anyhow::bail!("worker exited without a result")
}

fn cmd_enc(a: EncArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;
    let opts = options_for(a.scheme, a.chunk_size, a.armor, a.force);

    let recipient = match opts.scheme {
        Scheme::Asymmetric => Some(
            load_public(
                a.public_key
                    .as_deref()
                    .context("asymmetric scheme requires --public-key")?,
            )
            .context("failed to load public key")?,
        ),
        Scheme::Symmetric => None,
    };

    if let Some(message) = a.message {
        let output = drive_task(TaskRequest {
            mode: Mode::Encrypt,
            password: pw,
            payload: message.into_bytes(),
            filename: "message.txt".into(),
            options: opts,
            recipient,
            secret: None,
        })?;
        let armored = armor_encode(&output.bytes);
        println!("{}", String::from_utf8_lossy(&armored));
        return Ok(());
    }

    let input = a.input.context("provide --in FILE or --message TEXT")?;

    if a.stream {
        let out = encrypt_file_streaming(
            &input,
            a.output.as_deref(),
            pw,
            &opts,
            recipient.as_ref(),
            &mut print_progress,
        )
        .context("encryption failed")?;
        eprintln!("Wrote {}", out.display());
        return Ok(());
    }

    let payload = fs::read(&input)?;
    let filename = embedded_name(&input)?;
    let output = drive_task(TaskRequest {
        mode: Mode::Encrypt,
        password: pw,
        payload,
        filename,
        options: opts.clone(),
        recipient,
        secret: None,
    })?;

    let out_path = default_out_path(&input, a.output.as_deref());
    let bytes = if opts.armor {
        armor_encode(&output.bytes)
    } else {
        output.bytes
    };
    write_output(&out_path, &bytes, opts.force)?;
    eprintln!("Wrote {}", out_path.display());
    Ok(())
}

fn cmd_dec(a: DecArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;
    let opts = options_for(a.scheme, DEFAULT_CHUNK_SIZE, false, a.force);

    let secret = match opts.scheme {
        Scheme::Asymmetric => Some(
            load_secret(
                a.secret_key
                    .as_deref()
                    .context("asymmetric scheme requires --secret-key")?,
            )
            .context("failed to load secret key")?,
        ),
        Scheme::Symmetric => None,
    };

    if let Some(message) = a.message {
        let container = dearmor_decode(message.as_bytes()).context("invalid armored message")?;
        let output = drive_task(TaskRequest {
            mode: Mode::Decrypt,
            password: pw,
            payload: container,
            filename: String::new(),
            options: opts,
            recipient: None,
            secret,
        })?;
        println!("{}", String::from_utf8_lossy(&output.bytes));
        return Ok(());
    }

    let input = a.input.context("provide --in FILE or --message TEXT")?;

    if a.stream {
        let (out, name) = decrypt_file_streaming(
            &input,
            a.output.as_deref(),
            pw,
            &opts,
            secret.as_ref(),
            &mut print_progress,
        )
        .context("decryption failed")?;
        eprintln!("Wrote {} (original name: {name})", out.display());
        return Ok(());
    }

    let mut data = fs::read(&input)?;
    if sealpack::looks_armored(&data) {
        data = dearmor_decode(&data).context("invalid armored container")?;
    }
    let output = drive_task(TaskRequest {
        mode: Mode::Decrypt,
        password: pw,
        payload: data,
        filename: String::new(),
        options: opts.clone(),
        recipient: None,
        secret,
    })?;

    let out_path = default_decrypt_output_path(&input, a.output.as_deref());
    write_output(&out_path, &output.bytes, opts.force)?;
    eprintln!(
        "Wrote {} (original name: {})",
        out_path.display(),
        output.filename
    );
    Ok(())
}

fn cmd_keygen(a: KeygenArgs) -> Result<()> {
    for path in [&a.public, &a.secret] {
        if path.exists() && !a.force {
            anyhow::bail!("{} exists; use --force to overwrite", path.display());
        }
    }
    let pair = Keypair::generate().context("keypair generation failed")?;
    pair.save(&a.public, &a.secret)
        .context("failed to write key files")?;
    eprintln!(
        "Wrote {} (public) and {} (secret)",
        a.public.display(),
        a.secret.display()
    );
    println!("{}", hex::encode(pair.public().as_bytes()));
    Ok(())
}

fn embedded_name(input: &Path) -> Result<String> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .context("input filename is not valid UTF-8")
}

fn write_output(path: &Path, bytes: &[u8], force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("output exists; use --force to overwrite");
    }
    write_all_atomic(path, bytes, false).context("failed to write output")?;
    Ok(())
}
