pub mod events;

pub use events::TransferEvent;
