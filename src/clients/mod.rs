pub mod scan_client;

pub use scan_client::ScanClient;
