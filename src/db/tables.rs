use redb::TableDefinition;

/// Shares table: share id (UUID string) -> ShareRecord (serialized)
pub const SHARES: TableDefinition<&str, &[u8]> = TableDefinition::new("shares");

/// Caller tokens table: SHA-256 of bearer token -> CallerRecord (serialized)
pub const CALLER_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("caller_tokens");

/// Profiles table: caller id -> ProfileRecord (serialized)
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
