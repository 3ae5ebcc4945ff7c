pub(crate) mod request;
pub(crate) mod response;

pub use request::{NavigateOptions, DEFAULT_NAVIGATION_TIMEOUT};
pub use response::{PageSnapshot, PlayerPages};
