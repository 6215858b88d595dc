pub mod codec;
pub mod constants;
pub mod error;
pub mod invoice;
pub mod mint;
pub mod proof;
pub mod token;
pub mod transaction;
pub mod types;

pub use codec::*;
pub use constants::*;
pub use error::WalletError;
pub use invoice::*;
pub use mint::*;
pub use proof::*;
pub use token::*;
pub use transaction::*;
pub use types::*;
