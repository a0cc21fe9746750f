pub mod client_ext;
pub mod dashboard;
pub mod debounce;
pub mod schema;
pub mod suggest;

pub mod prelude {
    pub use crate::client_ext::{MarketData, RelayClient, DEFAULT_RELAY_URL};
    pub use crate::dashboard::{Dashboard, DashboardState, Notice, Phase};
    pub use crate::debounce::Debouncer;
    pub use crate::schema::{Field, HistoryPoint, Overview, Range};
    pub use crate::suggest::{fetch_ticker_suggestions, Suggester};
}
