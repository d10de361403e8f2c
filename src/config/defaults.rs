//! Default value providers for `Config`, following the teacher's pattern of
//! one `default_*` function per `#[serde(default = "...")]` field.

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_app_path() -> String {
    "./data/apps".to_string()
}

pub fn default_policy_path() -> String {
    "./data/policies".to_string()
}

pub fn default_max_conn_time_secs() -> u64 {
    3600
}

pub fn default_max_idle_conns() -> usize {
    100
}

pub fn default_max_idle_conns_per_host() -> usize {
    2
}

pub fn default_proxy_default_timeout_secs() -> u64 {
    30
}

pub fn default_flush_interval_ms() -> i64 {
    200
}

pub fn default_hash_key_function() -> String {
    "murmur64".to_string()
}

pub fn default_basic_auth_hash_key_function() -> String {
    "bcrypt".to_string()
}

pub fn default_oauth_token_expire_secs() -> i64 {
    3600
}

pub fn default_oauth_token_expired_retain_secs() -> i64 {
    0
}

pub fn default_reload_debounce_ms() -> u64 {
    1000
}
