//! Sign-in, signup with OTP, password reset and logout.

use pyp_core::OtpPurpose;

use crate::client::{AuthSession, SignupForm};
use crate::error::StoreError;
use crate::shipping::ShipmentProvider;

use super::Storefront;

impl<S: ShipmentProvider> Storefront<S> {
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] for refused credentials (401) or a blocked
    /// admin login (403); the message is also raised as a notification.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), StoreError> {
        match self.api.login(email.trim(), password).await {
            Ok(session) => {
                self.start_session(session);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Create an account without an OTP and sign straight in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the server refuses the signup.
    pub async fn register(&mut self, form: &SignupForm) -> Result<(), StoreError> {
        match self.api.register(form).await {
            Ok(session) => {
                self.start_session(session);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// First signup step: mail an OTP to `email`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the address is taken or malformed.
    pub async fn start_signup(&mut self, email: &str) -> Result<(), StoreError> {
        match self.api.signup_initiate(email.trim()).await {
            Ok(message) => {
                self.notifier.success(message);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Second signup step: create the account if the OTP checks out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for a wrong or expired OTP.
    pub async fn complete_signup(
        &mut self,
        form: &SignupForm,
        otp: &str,
    ) -> Result<(), StoreError> {
        match self.api.signup_complete(form, otp.trim()).await {
            Ok(session) => {
                self.start_session(session);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the server refuses to issue the OTP.
    pub async fn send_otp(&mut self, email: &str, purpose: OtpPurpose) -> Result<(), StoreError> {
        match self.api.send_otp(email.trim(), purpose).await {
            Ok(message) => {
                self.notifier.success(message);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Check an OTP without using it up.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for a wrong or expired OTP.
    pub async fn verify_otp(&mut self, email: &str, otp: &str) -> Result<(), StoreError> {
        match self.api.verify_otp(email.trim(), otp.trim()).await {
            Ok(message) => {
                self.notifier.success(message);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] for a wrong OTP or a too-short password.
    pub async fn reset_password(
        &mut self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), StoreError> {
        match self
            .api
            .reset_password(email.trim(), otp.trim(), new_password)
            .await
        {
            Ok(message) => {
                self.notifier.success(message);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Forget the session and empty the cart.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(user_id = %session.user.id, "signed out");
        }
        self.api.set_token(None);
        self.cart.clear();
        self.applied_coupon = None;
        self.persist_session();
        self.persist_cart();
        self.notifier.success("Logged out successfully");
    }

    /// Re-check a restored session against the server. A rejected token
    /// signs the user out quietly; other failures keep the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than a rejected token.
    pub async fn refresh_session(&mut self) -> Result<(), StoreError> {
        if self.session.is_none() {
            return Ok(());
        }

        match self.api.me().await {
            Ok(user) => {
                if let Some(session) = self.session.as_mut() {
                    session.user = user;
                }
                self.persist_session();
                Ok(())
            }
            Err(StoreError::Api { status: 401, .. }) => {
                tracing::info!("stored session expired");
                self.session = None;
                self.api.set_token(None);
                self.persist_session();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not refresh session");
                Err(e)
            }
        }
    }

    fn start_session(&mut self, session: AuthSession) {
        tracing::info!(user_id = %session.user.id, role = session.user.role.as_str(), "signed in");
        let greeting = format!("Welcome back, {}!", session.user.name);
        self.api.set_token(Some(session.token.clone()));
        self.session = Some(session);
        self.persist_session();
        self.notifier.success(greeting);
    }
}
