use super::Context;
use anyhow::{Context as _, Result};
use podchat_core::account::AccountRequest;
use podchat_interaction::CredentialProvisioner;

pub async fn run(
    context: &Context,
    random: bool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let request = if random {
        AccountRequest::random()
    } else {
        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => AccountRequest::new(name, email, password),
            _ => anyhow::bail!("--name, --email and --password are required without --random"),
        }
    };

    let provisioner = CredentialProvisioner::new(&context.config);
    let account = provisioner
        .register(&request)
        .await
        .with_context(|| format!("Could not register at {}", provisioner.server_url()))?;

    // Check the new account can obtain credentials before keeping it.
    provisioner
        .issue_credentials(&account)
        .await
        .context("Account created but client credentials could not be issued")?;

    let store = context.account_store();
    store.save(&account)?;

    println!("Registered {}", account.name);
    println!("WebID: {}", account.web_id);
    println!("Pod:   {}", account.pod_base_url);
    println!("Saved to {}", store.path().display());
    Ok(())
}
