/// Channel primary keys are random (v4) UUIDs generated on creation.
pub type ChannelId = uuid::Uuid;

/// Organizations are owned by the host platform and referenced by name.
pub type OrganizationId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
