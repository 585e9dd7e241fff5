use crate::remote::Credentials;

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};

const USER_ENV: &str = "TEXBUMP_ABF_USER";
const PASSWORD_ENV: &str = "TEXBUMP_ABF_PASSWORD";

/// Ask a yes/no question. Always true if `assume_yes` is set
pub fn ask_confirm(assume_yes: bool, msg: &str) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    let prefix = super::gen_prefix("");
    let msg = format!("{prefix}{msg}");
    let res = Confirm::new().with_prompt(msg).interact()?;
    Ok(res)
}

/// Credentials for the file-store, taken from the environment if possible
pub fn ask_credentials() -> Result<Credentials> {
    let prefix = super::gen_prefix("");
    let email = match std::env::var(USER_ENV) {
        Ok(email) => email,
        Err(_) => Input::<String>::new()
            .with_prompt(format!("{prefix}File-store username (email)"))
            .validate_with(|s: &String| -> Result<(), &str> {
                if s.contains('@') {
                    Ok(())
                } else {
                    Err("Username must be an email address")
                }
            })
            .interact_text()?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => Password::new()
            .with_prompt(format!("{prefix}File-store password"))
            .interact()?,
    };

    Ok(Credentials {
        email: email.trim().to_owned(),
        password,
    })
}
