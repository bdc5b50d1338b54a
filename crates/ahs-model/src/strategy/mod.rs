mod backoff;
pub use backoff::BackoffStrategy;

mod naming;
pub use naming::NamingStrategy;
