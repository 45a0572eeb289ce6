//! Process exit codes

use cfddns_core::{CredentialField, Error, RunStatus};
use std::process::ExitCode;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfddnsExitCode {
    /// Every record is up to date (missing records only warn)
    Success = 0,
    /// Bad or unknown argument, invalid configuration
    BadArgument = 1,
    /// The HTTP transport could not be set up
    MissingTool = 2,
    /// The current address could not be detected
    AddressDetection = 10,
    /// `CLOUDFLARE_EMAIL` missing
    MissingEmail = 20,
    /// `CLOUDFLARE_API_KEY` missing
    MissingApiKey = 21,
    /// `CLOUDFLARE_ZONE_ID` missing
    MissingZoneId = 22,
    /// The DNS provider could not be queried
    ProviderQuery = 25,
    /// One or more record updates were refused
    UpdatesFailed = 98,
    /// Anything else
    Unspecified = 99,
}

impl From<CfddnsExitCode> for ExitCode {
    fn from(code: CfddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Error> for CfddnsExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidInput(_) => CfddnsExitCode::BadArgument,
            Error::MissingCredential(CredentialField::Email) => CfddnsExitCode::MissingEmail,
            Error::MissingCredential(CredentialField::ApiKey) => CfddnsExitCode::MissingApiKey,
            Error::MissingCredential(CredentialField::ZoneId) => CfddnsExitCode::MissingZoneId,
            Error::AddressDetection(_) => CfddnsExitCode::AddressDetection,
            Error::Provider { .. } => CfddnsExitCode::ProviderQuery,
            Error::HttpClient(_) => CfddnsExitCode::MissingTool,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => CfddnsExitCode::Unspecified,
        }
    }
}

impl From<RunStatus> for CfddnsExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => CfddnsExitCode::Success,
            RunStatus::PartialFailure => CfddnsExitCode::UpdatesFailed,
        }
    }
}
