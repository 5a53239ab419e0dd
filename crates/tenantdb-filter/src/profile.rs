//! Per-backend field naming.

/// The logical identifier field used in filters and entities.
pub const LOGICAL_ID_FIELD: &str = "id";

/// Field holding the tenant identifier in every store.
pub const TENANT_ID_FIELD: &str = "tenantId";

/// Native field names of one storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    key_field: String,
    tenant_field: String,
}

impl BackendProfile {
    /// Creates a profile with explicit key and tenant field names.
    #[must_use]
    pub fn new(key_field: impl Into<String>, tenant_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            tenant_field: tenant_field.into(),
        }
    }

    /// Profile of the document store: `id` is stored as `_id`.
    #[must_use]
    pub fn document() -> Self {
        Self::new("_id", TENANT_ID_FIELD)
    }

    /// Profile of the graph store: `id` stays a plain node property.
    #[must_use]
    pub fn graph() -> Self {
        Self::new(LOGICAL_ID_FIELD, TENANT_ID_FIELD)
    }

    /// The native primary-key field.
    #[must_use]
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// The tenant field.
    #[must_use]
    pub fn tenant_field(&self) -> &str {
        &self.tenant_field
    }

    /// Rewrites the logical `id` field to the native key; other names pass through.
    #[must_use]
    pub fn native_field<'a>(&'a self, field: &'a str) -> &'a str {
        if field == LOGICAL_ID_FIELD {
            &self.key_field
        } else {
            field
        }
    }
}
