pub mod authority;
pub mod collaborators;
pub mod error;
pub mod fetcher;
pub mod testing;

#[cfg(feature = "http")]
pub mod http;

pub use authority::LocalAuthority;
pub use collaborators::{
    ActorDirectory, GrantSource, HandlerInvoker, ListenerReceipt, ListenerRegistrar,
    LocalResources, PodResources, PodResponse,
};
pub use error::ProviderError;
pub use fetcher::{Fetcher, ResourceFetcher, ScopedFetcher};
