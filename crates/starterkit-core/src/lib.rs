// starterkit-core: find-or-create provisioning and device bring-up for IoT starter kits.

pub mod bringup;
pub mod button;
pub mod complete;
pub mod context;
pub mod error;
pub mod function_app;
pub mod prompt;
pub mod provision;
pub mod reconcile;
pub mod twin;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bringup::{
    ACCESS_POINT_ADDRESS, BringupPlan, BringupReport, BringupState, DeviceBringup, SCRIPTS_URL,
};
pub use button::{ButtonConfigurator, ButtonReport};
pub use context::{HubSku, LOCATIONS, RegistrySku, SessionContext, WifiCredentials};
pub use error::CoreError;
pub use function_app::FunctionAppReport;
pub use prompt::PromptProvider;
pub use provision::Provisioner;
