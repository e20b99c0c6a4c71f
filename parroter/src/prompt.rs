//! Interactive terminal prompts for credentials and confirmations.

use anyhow::{ensure, Result};
use dialoguer::{Confirm, Input};

pub fn team() -> Result<String> {
    let team: String = Input::new().with_prompt("Slack Team").interact_text()?;
    Ok(team.trim().to_lowercase())
}

pub fn email() -> Result<String> {
    let email: String = Input::new().with_prompt("Slack Email").interact_text()?;
    Ok(email.trim().to_string())
}

pub fn confirm(question: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(question).interact()?)
}

/// Ask for the emailed 6-digit confirmation code. Dashes are tolerated
/// ("123-456"); anything else than six digits aborts authentication.
pub fn confirmation_code() -> Result<String> {
    let code: String = Input::new()
        .with_prompt("Check your email for a 6-digit confirmation code")
        .interact_text()?;
    let digits = code.trim().replace('-', "");
    ensure!(
        digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit()),
        "invalid confirmation code"
    );
    Ok(digits)
}
