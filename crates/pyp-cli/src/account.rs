//! Account commands. The session token is saved locally and reused by later
//! runs until `logout`.

use clap::{Subcommand, ValueEnum};
use pyp_core::OtpPurpose;
use pyp_storefront::{SignupForm, Storefront};

use crate::print_notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OtpKind {
    Signup,
    ForgotPassword,
}

impl From<OtpKind> for OtpPurpose {
    fn from(kind: OtpKind) -> Self {
        match kind {
            OtpKind::Signup => OtpPurpose::Signup,
            OtpKind::ForgotPassword => OtpPurpose::ForgotPassword,
        }
    }
}

/// Sub-commands available under `auth`.
#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "PYP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Email a signup OTP
    Signup { email: String },
    /// Finish signup with the emailed OTP
    Verify {
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "PYP_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Email an OTP for signup or a password reset
    SendOtp {
        email: String,
        #[arg(long, value_enum, default_value = "forgot-password")]
        purpose: OtpKind,
    },
    /// Check an OTP without using it
    CheckOtp {
        email: String,
        #[arg(long)]
        otp: String,
    },
    /// Set a new password with an emailed OTP
    ResetPassword {
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long, env = "PYP_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
    /// Show who is signed in
    Whoami,
    /// Sign out and empty the cart
    Logout,
}

pub(crate) async fn run(store: &mut Storefront, command: AuthCommands) -> anyhow::Result<()> {
    match command {
        AuthCommands::Login { email, password } => store.login(&email, &password).await?,
        AuthCommands::Signup { email } => store.start_signup(&email).await?,
        AuthCommands::Verify {
            email,
            otp,
            name,
            password,
            phone,
        } => {
            let form = SignupForm {
                name,
                email,
                password,
                phone,
            };
            store.complete_signup(&form, &otp).await?;
        }
        AuthCommands::SendOtp { email, purpose } => {
            store.send_otp(&email, purpose.into()).await?;
        }
        AuthCommands::CheckOtp { email, otp } => store.verify_otp(&email, &otp).await?,
        AuthCommands::ResetPassword {
            email,
            otp,
            new_password,
        } => store.reset_password(&email, &otp, &new_password).await?,
        AuthCommands::Whoami => {
            match store.user() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role.as_str()),
                None => println!("not signed in"),
            }
            return Ok(());
        }
        AuthCommands::Logout => store.logout(),
    }

    print_notification(store);
    Ok(())
}
