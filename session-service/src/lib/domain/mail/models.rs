/// Transactional mail sent by the service, one variant per template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mail {
    UserWelcome {
        full_name: String,
        activation_token: String,
    },
    ActivationToken {
        username: String,
        activation_token: String,
    },
    PasswordResetToken {
        password_reset_token: String,
    },
}

impl Mail {
    pub fn template_name(&self) -> &'static str {
        match self {
            Mail::UserWelcome { .. } => "user_welcome",
            Mail::ActivationToken { .. } => "activation_token",
            Mail::PasswordResetToken { .. } => "password_reset_token",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Mail::UserWelcome { .. } => "Welcome!",
            Mail::ActivationToken { .. } => "Activate your account",
            Mail::PasswordResetToken { .. } => "Reset your password",
        }
    }

    /// Plain text body.
    pub fn body(&self) -> String {
        match self {
            Mail::UserWelcome {
                full_name,
                activation_token,
            } => format!(
                "Hi {full_name},\n\n\
                 Thanks for signing up. To activate your account, send a PUT request to \
                 /v1/users/activate with the following body:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 This token is single use and expires in a few hours.\n"
            ),
            Mail::ActivationToken {
                username,
                activation_token,
            } => format!(
                "Hi {username},\n\n\
                 Send a PUT request to /v1/users/activate with the following body to \
                 activate your account:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 This token is single use and expires in a few hours.\n"
            ),
            Mail::PasswordResetToken {
                password_reset_token,
            } => format!(
                "Hi,\n\n\
                 Send a PUT request to /v1/users/password with the following body to set \
                 a new password:\n\n\
                 {{\"token\": \"{password_reset_token}\", \"password\": \"your new password\"}}\n\n\
                 This token is single use and expires in 45 minutes.\n"
            ),
        }
    }
}
