//! 终端凭据输入

use dialoguer::{Input, Password, Select};

use crate::error::Result;
use crate::services::host_service::{AuthMethod, CredentialPrompt};

/// 基于 dialoguer 的终端提示
#[derive(Debug, Default)]
pub struct DialoguerPrompt;

impl CredentialPrompt for DialoguerPrompt {
    fn username(&mut self) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt("Enter username")
            .interact_text()?)
    }

    fn auth_method(&mut self) -> Result<AuthMethod> {
        let choice = Select::new()
            .with_prompt("Select authentication method")
            .items(&["Password", "Private Key"])
            .default(0)
            .interact()?;

        Ok(match choice {
            0 => AuthMethod::Password,
            _ => AuthMethod::PrivateKey,
        })
    }

    fn password(&mut self) -> Result<String> {
        Ok(Password::new().with_prompt("Enter password").interact()?)
    }

    fn key_path(&mut self) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt("Enter private key file path")
            .interact_text()?)
    }

    fn notice(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
