pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod evaluation;
pub mod feedback;
pub mod output;
pub mod rubric;
pub mod scoring;
pub mod session;
pub mod store;

/// Install the ring crypto provider for rustls. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
