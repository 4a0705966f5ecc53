//! Wallet signature verification

use types::ids::WalletAddress;

/// Checks that `signature` over `message` was produced by `wallet`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, wallet: &WalletAddress, message: &str, signature: &str) -> bool;
}

/// Accepts every well-formed wallet.
///
/// Deployments that expose authentication publicly must plug in a real
/// verifier for their wallet scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _wallet: &WalletAddress, _message: &str, _signature: &str) -> bool {
        true
    }
}
