/// One-way password transform with a matching verification.
///
/// Implementations are CPU-bound; the service calls them on the
/// blocking thread pool.
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` into an opaque, self-describing string.
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Constant-time check of `plaintext` against a stored hash.
    /// A malformed hash never matches.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}
