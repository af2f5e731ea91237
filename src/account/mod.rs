// Account module - Who holds and who may govern
// Ed25519 keypairs and the ledger addresses derived from them

mod address;
mod keypair;

pub use address::{Address, AddressError};
pub use keypair::{Keypair, KeypairError, PublicKey};
