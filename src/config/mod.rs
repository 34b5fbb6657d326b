mod filter;
mod loader;

pub use filter::PathFilter;
pub use loader::{
    AssetsConfig, Config, DiscoveryConfig, LimitsConfig, ReportConfig, ScanConfig,
    DEFAULT_CONFIG_NAMES,
};
