use anyhow::Result;
use colored::Colorize;
use salonads_client::{AuthService, Credentials, RegisterRequest};

use crate::cli::{ForgotPasswordArgs, LoginArgs, OutputFormat, RegisterArgs, ResetPasswordArgs};
use crate::hint::SignInHint;
use crate::output::{print_success, print_value};

pub async fn login(auth: &AuthService, args: &LoginArgs, server: &str) -> Result<()> {
    auth.login(&Credentials::new(&args.email, &args.password))
        .await?;
    match auth.current_user_sync() {
        Some(user) => print_success(&format!(
            "Logged in to {} as {}",
            server.cyan(),
            user.display_name().cyan()
        )),
        None => print_success(&format!("Logged in to {}", server.cyan())),
    }
    Ok(())
}

pub async fn logout(auth: &AuthService, hint: &SignInHint, profile: &str) -> Result<()> {
    hint.expect_logout();
    auth.logout().await;
    if crate::session::remove(profile)? {
        print_success("Logged out (session removed)");
    } else {
        println!("No stored session for profile \"{profile}\"");
    }
    Ok(())
}

pub async fn whoami(auth: &AuthService, profile: &str, format: OutputFormat) -> Result<()> {
    match auth.current_user().await {
        Some(user) => match format {
            OutputFormat::Json => print_value(&serde_json::to_value(&user)?, format),
            OutputFormat::Table => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!("{}: {}", "User".cyan(), user.display_name());
                println!("{}: {}", "Email".cyan(), user.email);
                println!("{}: {}", "Role".cyan(), user.role.as_deref().unwrap_or("-"));
            }
        },
        None => anyhow::bail!("Not logged in (profile: \"{profile}\")"),
    }
    Ok(())
}

pub async fn register(auth: &AuthService, args: &RegisterArgs, format: OutputFormat) -> Result<()> {
    let request = RegisterRequest {
        email: args.email.clone(),
        password: args.password.clone(),
        name: args.name.clone(),
        phone: args.phone.clone(),
        extra: serde_json::Map::new(),
    };
    let created = auth.register(&request).await?;
    print_success(&format!("Registered {}", args.email.cyan()));
    print_value(&created, format);
    Ok(())
}

pub async fn forgot_password(auth: &AuthService, args: &ForgotPasswordArgs) -> Result<()> {
    auth.request_password_reset(&args.email).await?;
    print_success(&format!("Password reset email sent to {}", args.email.cyan()));
    Ok(())
}

pub async fn reset_password(auth: &AuthService, args: &ResetPasswordArgs) -> Result<()> {
    auth.reset_password(&args.token, &args.password).await?;
    print_success("Password updated; log in with the new password");
    Ok(())
}
