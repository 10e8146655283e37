pub mod audit;
pub mod upgrade;

pub use audit::{handle_audit, run_audit, AuditConfig};
pub use upgrade::{handle_upgrade, UpgradeConfig};
