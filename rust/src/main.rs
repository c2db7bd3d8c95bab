//! Small operator CLI over the credential primitives. Each command maps to a
//! single library call so its behavior is easy to audit.

use std::env;
use std::process::ExitCode;

use serde_json::json;
use tracing_subscriber::EnvFilter;
use warden_rs::config::{load_config, SecurityConfig};
use warden_rs::crypto::digest::{CredentialHasher, StoredCredential};
use warden_rs::crypto::entropy::shared_source;
use warden_rs::crypto::passwords::{hash_credential, verify_credential};
use warden_rs::crypto::tokens::{AntiForgeryTokenGenerator, OneTimeCodeGenerator};
use warden_rs::sanitize::{sanitize, SQL_SERVER_ALLOWED};

fn print_usage() -> ExitCode {
    eprintln!("Commands:\n  csrf-token\n  otp-code [length]\n  hash-store <algorithm> <password>\n  hash-compare <algorithm> <password> <salt>\n  verify-store <algorithm> <password> <hash> <salt>\n  check-password <password> [config.json]\n  hash-credential <password>\n  verify-credential <password> <hash-set>\n  sanitize <max-length> <input>\n  show-config <path>");
    ExitCode::from(2)
}

fn fail(context: &str, err: impl std::fmt::Display) -> ExitCode {
    eprintln!("{context}: {err}");
    ExitCode::FAILURE
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return print_usage();
    }

    match args[1].as_str() {
        "csrf-token" => match AntiForgeryTokenGenerator::default().generate() {
            Ok(token) => {
                println!("{token}");
                ExitCode::SUCCESS
            }
            Err(err) => fail("token generation failed", err),
        },
        "otp-code" => {
            let generator = match args.get(2) {
                None => Ok(OneTimeCodeGenerator::default()),
                Some(raw) => match raw.parse::<i64>() {
                    Ok(length) => OneTimeCodeGenerator::with_length(shared_source(), length),
                    Err(err) => return fail("invalid length", err),
                },
            };
            match generator.and_then(|g| g.generate()) {
                Ok(code) => {
                    println!("{code}");
                    ExitCode::SUCCESS
                }
                Err(err) => fail("code generation failed", err),
            }
        }
        "hash-store" => {
            if args.len() != 4 {
                return print_usage();
            }
            let hasher = match CredentialHasher::new(&args[2]) {
                Ok(h) => h,
                Err(err) => return fail("hasher setup failed", err),
            };
            match hasher.hash_for_storage(&args[3]) {
                Ok(stored) => match serde_json::to_string_pretty(&stored) {
                    Ok(text) => {
                        println!("{text}");
                        ExitCode::SUCCESS
                    }
                    Err(err) => fail("encoding failed", err),
                },
                Err(err) => fail("hashing failed", err),
            }
        }
        "hash-compare" => {
            if args.len() != 5 {
                return print_usage();
            }
            match CredentialHasher::new(&args[2]) {
                Ok(hasher) => {
                    println!("{}", hasher.hash_for_comparison(&args[3], &args[4]));
                    ExitCode::SUCCESS
                }
                Err(err) => fail("hasher setup failed", err),
            }
        }
        "verify-store" => {
            if args.len() != 6 {
                return print_usage();
            }
            let hasher = match CredentialHasher::new(&args[2]) {
                Ok(h) => h,
                Err(err) => return fail("hasher setup failed", err),
            };
            let stored = StoredCredential {
                hash: args[4].clone(),
                salt: args[5].clone(),
            };
            match hasher.verify_stored(&args[3], &stored) {
                Ok(matches) => {
                    println!("{}", if matches { "match" } else { "no-match" });
                    ExitCode::SUCCESS
                }
                Err(err) => fail("verification failed", err),
            }
        }
        "check-password" => {
            if args.len() != 3 && args.len() != 4 {
                return print_usage();
            }
            let config = match args.get(3) {
                Some(path) => match load_config(path) {
                    Ok(cfg) => cfg,
                    Err(err) => return fail("config load failed", err),
                },
                None => SecurityConfig::default(),
            };
            let result = config
                .build_policy()
                .map_err(|e| e.to_string())
                .and_then(|policy| policy.is_valid(&args[2]).map_err(|e| e.to_string()));
            match result {
                Ok(valid) => {
                    println!("{}", if valid { "accepted" } else { "rejected" });
                    ExitCode::SUCCESS
                }
                Err(err) => fail("policy check failed", err),
            }
        }
        "hash-credential" => {
            if args.len() != 3 {
                return print_usage();
            }
            match hash_credential(&args[2]) {
                Ok(hash_set) => {
                    println!("{hash_set}");
                    ExitCode::SUCCESS
                }
                Err(err) => fail("hashing failed", err),
            }
        }
        "verify-credential" => {
            if args.len() != 4 {
                return print_usage();
            }
            match verify_credential(&args[2], &args[3]) {
                Ok(matches) => {
                    println!("{}", if matches { "match" } else { "no-match" });
                    ExitCode::SUCCESS
                }
                Err(err) => fail("verification failed", err),
            }
        }
        "sanitize" => {
            if args.len() != 4 {
                return print_usage();
            }
            let max_length = match args[2].parse::<usize>() {
                Ok(n) => n,
                Err(err) => return fail("invalid max length", err),
            };
            match sanitize(&args[3], max_length, SQL_SERVER_ALLOWED) {
                Ok(clean) => {
                    println!("{clean}");
                    ExitCode::SUCCESS
                }
                Err(err) => fail("sanitize failed", err),
            }
        }
        "show-config" => {
            if args.len() != 3 {
                return print_usage();
            }
            match load_config(&args[2]) {
                Ok(cfg) => {
                    let printable = json!({
                        "passwordPolicy": {
                            "minLength": cfg.password_policy.min_length,
                            "blacklist": cfg.password_policy.blacklist,
                            "whitelist": cfg.password_policy.whitelist,
                            "requiresNumber": cfg.password_policy.requires_number,
                            "requiresLetter": cfg.password_policy.requires_letter,
                            "requiresSpecial": cfg.password_policy.requires_special
                        },
                        "hashAlgorithm": cfg.hash_algorithm,
                        "codeLength": cfg.code_length
                    });
                    match serde_json::to_string_pretty(&printable) {
                        Ok(text) => {
                            println!("{text}");
                            ExitCode::SUCCESS
                        }
                        Err(err) => fail("encoding failed", err),
                    }
                }
                Err(err) => fail("config load failed", err),
            }
        }
        _ => print_usage(),
    }
}
