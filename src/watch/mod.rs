pub mod poller;
pub mod waiter;

pub use poller::{
    poll_any,
    poll_until,
    Attempts,
    Condition,
    Hit,
    WatchHandle,
    WatchTarget,
};
pub use waiter::{
    wait_for_element,
    wait_for_element_timeout,
    wait_for_fresh_element,
};
