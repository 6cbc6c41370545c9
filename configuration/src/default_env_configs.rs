// Configuration template used when no config file is present.
// Every value is taken from the environment; unset variables fall back to defaults,
// except `DATABASE_URL` which is required.

pub const DEFAULT_CONFIG: &str = r#"
[general]
log_filter = "${LOG_FILTER}"
log_format = "${LOG_FORMAT}"

[database]
database_url = "${DATABASE_URL}"
database_user = "${DATABASE_USER}"
database_password = "${DATABASE_PASSWORD}"
database_name = "${DATABASE_NAME}"
read_only = "${DATABASE_READ_ONLY}"

[database.pool]
pool_size = "${DATABASE_POOL_SIZE}"
max_overflow = "${DATABASE_MAX_OVERFLOW}"
pool_timeout = "${DATABASE_POOL_TIMEOUT}"
idle_timeout = "${DATABASE_IDLE_TIMEOUT}"

[database.bootstrap]
create_database = "${DATABASE_CREATE}"
poll_interval_ms = "${DATABASE_POLL_INTERVAL_MS}"

[database.write]
max_retry = "${DATABASE_MAX_RETRY}"
retry_base_delay_ms = "${DATABASE_RETRY_BASE_DELAY_MS}"
"#;
