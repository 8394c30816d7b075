// ── Polling / query layer ──
//
// Decides when endpoint bindings run: on subscription, on interval, on
// focus, on manual refresh, and after invalidation. Results are cached per
// `QueryKey` and pushed to observers through `watch` channels.

mod client;
mod fetcher;
mod key;
mod state;
mod subscription;

pub use client::{QueryClient, RefreshPolicy};
pub use fetcher::QueryFetcher;
pub use key::QueryKey;
pub use state::{QueryData, QueryError, QueryState};
pub use subscription::{QueryStream, Subscription};
