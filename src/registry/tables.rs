use redb::TableDefinition;

/// Project records: id -> Project (msgpack)
pub const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");

/// Host index: hostname (lowercase) -> project id
pub const PROJECT_HOSTS: TableDefinition<&str, &str> = TableDefinition::new("project_hosts");

/// Folder index: folder -> project id (enforces global folder uniqueness)
pub const PROJECT_FOLDERS: TableDefinition<&str, &str> = TableDefinition::new("project_folders");
