pub mod comments;
pub mod error;
pub mod feed;
pub mod identity;
pub mod ports;
pub mod posts;
pub mod query;
pub mod reactions;
pub mod sync;
#[cfg(test)]
pub mod testing;
pub mod users;
pub mod util;
pub mod visibility;

pub type DomainResult<T> = Result<T, error::DomainError>;
