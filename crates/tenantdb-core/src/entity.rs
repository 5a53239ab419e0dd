//! Persistable entity abstraction.

/// Trait for tenant-owned entities stored by a repository.
///
/// The logical identifier is always exposed as `id`; each backend maps it
/// to its native key field.
pub trait Entity: Send + Sync + 'static {
    /// Returns the logical entity identifier.
    fn id(&self) -> &str;

    /// Returns the identifier of the owning tenant.
    fn tenant_id(&self) -> &str;
}
