//! Guild partition resolution: the single source of tenancy truth.

/// User id of the designated super-administrator. State written by this
/// identity lives in the global partition and survives guild removal.
pub const SUPER_ADMIN_USER_ID: i64 = 1_382_187_068_373_074_001;

/// Partition key for global (guild-less) state.
pub const GLOBAL_GUILD_ID: i64 = 0;

/// Resolves the partition a user's state lives in: the super-administrator
/// always lands in the global partition no matter which guild the command
/// arrived from, everyone else lands in the calling guild.
pub fn resolve_partition(user_id: i64, guild_id: i64) -> i64 {
    if user_id == SUPER_ADMIN_USER_ID {
        GLOBAL_GUILD_ID
    } else {
        guild_id
    }
}
