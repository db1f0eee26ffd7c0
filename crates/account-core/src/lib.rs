//! Account-identity core
//!
//! The authentication and account-linking logic: one physical person maps
//! to exactly one account record across the email, phone, and Google
//! sign-in channels. This crate holds the domain model, the error
//! taxonomy, the collaborator traits (storage, OAuth provider, credential
//! issuer), and the `AccountService` orchestrator that implements the
//! business rules. Durable implementations of the traits live in the
//! `account-store` crate; the Google adapter lives in the service binary.

pub mod credentials;
pub mod error;
pub mod model;
pub mod provider;
pub mod repository;
pub mod service;

pub use credentials::{CredentialIssuer, Credentials, RefreshedAccess};
pub use error::{Error, Result};
pub use model::{
    Account, AccountConfig, CreateInput, GoogleLink, ProviderLink, SignInProvider,
    UpdateProviderTokens,
};
pub use provider::{IdentityProvider, ProviderIdentity};
pub use repository::AccountRepository;
pub use service::{
    AccountService, AuthOutput, CreateFromEmail, CreateFromGoogle, CreateFromPhone, ExchangeCode,
    Iam, IamOutput, RefreshOutput, RefreshToken,
};
