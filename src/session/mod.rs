pub mod driver;
pub mod notifier;
pub mod report;

pub use driver::{
    Driver,
    Phase,
    ShutdownHandle,
};
pub use notifier::{
    ConsoleNotifier,
    Notifier,
};
pub use report::{
    sync_and_export,
    CycleReport,
};
