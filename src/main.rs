use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use utxo_compiler::serde_bytes::hex_vec_list;
use utxo_compiler::log_error;
use utxo_compiler::utils::logging::enable_debug;
use utxo_compiler::{
    compile_with_signatures, compile_with_signatures_and_pubkey_type, plan, pre_image_hashes, sign, ApiResponse,
    CompilerError, CompilerResult, PublicKeyType, SigningInput,
};

#[derive(Parser, Debug)]
#[command(name = "utxo-compiler")]
#[command(about = "Plan, hash and assemble UTXO transactions for external signers", long_about = None)]
struct Cli {
    /// Print debug log lines to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select inputs and settle fee and change
    Plan(InputArgs),
    /// Print the hashes an external signer must sign
    PreimageHashes(InputArgs),
    /// Assemble a transaction from external signatures
    Compile(InputArgs),
    /// Sign with the request's private keys and assemble
    Sign(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Request JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,
}

/// Body of the `compile` subcommand
#[derive(Debug, Deserialize)]
struct CompileRequest {
    input: SigningInput,
    #[serde(with = "hex_vec_list")]
    signatures: Vec<Vec<u8>>,
    #[serde(with = "hex_vec_list")]
    public_keys: Vec<Vec<u8>>,
    #[serde(default)]
    public_key_type: Option<PublicKeyType>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.debug {
        enable_debug();
    }

    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log_error!("cli", "request could not be read", reason = format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Dispatch one subcommand; `Ok(false)` means the request itself failed
fn run(command: &Command) -> anyhow::Result<bool> {
    let ok = match command {
        Command::Plan(args) => emit(parse::<SigningInput>(args)?.and_then(|input| plan(&input))),
        Command::PreimageHashes(args) => match parse::<SigningInput>(args)? {
            Ok(input) => {
                let output = pre_image_hashes(&input);
                let success = output.error.is_ok();
                let error = (!success).then(|| CompilerError::new(output.error, output.error_message.clone()));
                println!(
                    "{}",
                    ApiResponse {
                        success,
                        data: Some(output),
                        error,
                    }
                    .to_json()
                );
                success
            }
            Err(e) => emit::<()>(Err(e)),
        },
        Command::Compile(args) => emit(parse::<CompileRequest>(args)?.and_then(|request| match request.public_key_type {
            Some(key_type) => compile_with_signatures_and_pubkey_type(
                &request.input,
                &request.signatures,
                &request.public_keys,
                key_type,
            ),
            None => compile_with_signatures(&request.input, &request.signatures, &request.public_keys),
        })),
        Command::Sign(args) => emit(parse::<SigningInput>(args)?.and_then(|input| sign(&input))),
    };
    Ok(ok)
}

/// Read the request; I/O failures abort, malformed JSON becomes a response
fn parse<T: for<'de> Deserialize<'de>>(args: &InputArgs) -> anyhow::Result<CompilerResult<T>> {
    let raw = if args.input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading request from stdin")?;
        buf
    } else {
        fs::read_to_string(&args.input).with_context(|| format!("reading request from {}", args.input))?
    };
    Ok(serde_json::from_str(&raw).map_err(CompilerError::from))
}

fn emit<T: Serialize>(result: CompilerResult<T>) -> bool {
    let response = ApiResponse::from(result);
    println!("{}", response.to_json());
    response.success
}
