use serde_json::json;
use vestibule_domain::config::{ApiConfig, DatabaseConfig, ServerConfig};

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8000);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "vestibule");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_none());
    assert_eq!(db.readiness.check_interval_secs, 1);
    assert!(db.readiness.max_attempts.is_none());
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": {
            "url": "ws://localhost:8001",
            "namespace": "n",
            "database": "d",
            "credentials": null,
            "readiness": { "check_interval_secs": 2, "max_attempts": 30 }
        },
        "auth": { "jwt": { "secret": "s3cret", "issuer": "test", "ttl_seconds": 60 } }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.database.readiness.max_attempts, Some(30));
    assert_eq!(cfg.auth.jwt.issuer, "test");
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: ApiConfig = serde_json::from_value(json!({})).expect("empty config");
    assert_eq!(cfg.server.port, 8000);
    assert_eq!(cfg.auth.jwt.ttl_seconds, 3600);
}
