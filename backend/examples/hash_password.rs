//! Print a bcrypt hash suitable for `ADMIN_PASSWORD_HASH`.
//!
//! Usage: cargo run --example hash_password -- <password>

use std::process::ExitCode;

use cbm_backend::services::auth_service::AuthService;

fn main() -> ExitCode {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: hash_password <password>");
        return ExitCode::from(2);
    };

    let checked = AuthService::hash_password(&password).and_then(|hashed| {
        AuthService::verify_password(&password, &hashed).map(|ok| (hashed, ok))
    });
    match checked {
        Ok((hashed, true)) => {
            println!("{hashed}");
            ExitCode::SUCCESS
        }
        Ok((_, false)) => {
            eprintln!("Generated hash does not verify");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
