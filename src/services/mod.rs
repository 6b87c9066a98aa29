pub mod lookup;
pub use lookup::{LookupResult, LookupService, MetadataLookup};

pub mod transfer;
pub use transfer::{DownloadHandle, DownloadRequest, TransferError, TransferService};
