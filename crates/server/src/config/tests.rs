use std::time::Duration;

use recallguard_core::{OriginId, RecallActorPolicy, UserId};
use recallguard_platform::Destination;
use recallguard_shadow::ForwardStrategy;
use recallguard_shadow::template::DEFAULT_TEMPLATE;

use super::*;

#[test]
fn empty_document_uses_defaults() {
    let config = RecallGuardConfig::from_toml("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8780);
    assert_eq!(config.server.event_path, "/onebot");
    assert_eq!(config.server.shutdown_timeout_seconds, 10);
    assert_eq!(config.onebot.api_url, "http://127.0.0.1:5700");
    assert_eq!(config.onebot.timeout_seconds, 30);
    assert_eq!(config.onebot.audio_format, "mp3");

    let guard = config.to_guard_config().unwrap();
    assert!(guard.policy.users.is_empty());
    assert!(!guard.policy.origin_monitoring);
    assert!(!guard.policy.kinds.text);
    assert!(guard.policy.kinds.image);
    assert!(!guard.policy.kinds.audio);
    assert_eq!(guard.policy.recall_actor, RecallActorPolicy::Any);
    assert!(guard.forward.destinations.is_empty());
    assert_eq!(guard.forward.strategy, ForwardStrategy::Sequential);
    assert_eq!(guard.forward.template, DEFAULT_TEMPLATE);
    assert_eq!(guard.cache.dir, std::path::PathBuf::from("./recallguard-cache"));
    assert_eq!(guard.cache.interval, Duration::from_secs(600));
    assert_eq!(guard.cache.lifetime, Duration::from_secs(86_400));
    assert_eq!(guard.cache.max_bytes, None);
    assert!(guard.cache.purge_on_start);
}

#[test]
fn full_document() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000
        event_path = "events"

        [monitor]
        users = ["10001", " 10002 ", ""]
        blacklist = ["10002"]
        origins = ["20001"]
        origin_monitoring = true
        text = true
        audio = true
        recall_actor = "monitored_only"

        [forward]
        destinations = ["group:30001", "private:40001"]
        strategy = "merged"
        template = "{{ sender_name }} took it back"
        bot_id = "50001"
        bot_name = "watcher"

        [cache]
        dir = "/var/cache/recallguard"
        interval_seconds = 60
        lifetime_seconds = 3600
        max_size_mb = 2
        purge_on_start = false

        [onebot]
        api_url = "http://onebot:5700"
        access_token = "test-placeholder"
        timeout_seconds = 5
        audio_format = "wav"
    "#;

    let config = RecallGuardConfig::from_toml(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.route_path(), "/events");

    let guard = config.to_guard_config().unwrap();
    assert_eq!(guard.policy.users.len(), 2);
    assert!(guard.policy.users.contains(&UserId::new("10002")));
    assert!(guard.policy.blacklist.contains(&UserId::new("10002")));
    assert!(guard.policy.origins.contains(&OriginId::new("20001")));
    assert!(guard.policy.origin_monitoring);
    assert!(guard.policy.kinds.text && guard.policy.kinds.image && guard.policy.kinds.audio);
    assert_eq!(guard.policy.recall_actor, RecallActorPolicy::MonitoredOnly);

    assert_eq!(
        guard.forward.destinations,
        vec![
            Destination::Group(OriginId::new("30001")),
            Destination::Private(UserId::new("40001")),
        ]
    );
    assert_eq!(guard.forward.strategy, ForwardStrategy::Merged);
    assert_eq!(guard.forward.template, "{{ sender_name }} took it back");
    assert_eq!(guard.forward.bot_id, UserId::new("50001"));
    assert_eq!(guard.forward.bot_name, "watcher");

    assert_eq!(
        guard.cache.dir,
        std::path::PathBuf::from("/var/cache/recallguard")
    );
    assert_eq!(guard.cache.interval, Duration::from_secs(60));
    assert_eq!(guard.cache.lifetime, Duration::from_secs(3600));
    assert_eq!(guard.cache.max_bytes, Some(2 * 1024 * 1024));
    assert!(!guard.cache.purge_on_start);

    let onebot = config.onebot.to_onebot_config();
    assert_eq!(onebot.api_url, "http://onebot:5700");
    assert_eq!(onebot.access_token.as_deref(), Some("test-placeholder"));
    assert_eq!(onebot.timeout, Duration::from_secs(5));
    assert_eq!(onebot.audio_format, "wav");
}

#[test]
fn non_positive_size_cap_disables_size_sweep() {
    for value in ["0", "-5"] {
        let toml = format!("[cache]\nmax_size_mb = {value}\n");
        let config = RecallGuardConfig::from_toml(&toml).unwrap();
        assert_eq!(config.cache.max_bytes(), None);
    }
}

#[test]
fn invalid_destination_is_rejected() {
    let config =
        RecallGuardConfig::from_toml("[forward]\ndestinations = [\"channel:1\"]\n").unwrap();
    let err = config.to_guard_config().unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
    assert!(err.to_string().contains("forward.destinations"));
}

#[test]
fn unknown_strategy_is_rejected() {
    let config = RecallGuardConfig::from_toml("[forward]\nstrategy = \"carrier-pigeon\"\n").unwrap();
    assert!(matches!(
        config.to_guard_config(),
        Err(ServerError::Config(_))
    ));
}

#[test]
fn unknown_recall_actor_is_rejected() {
    let config = RecallGuardConfig::from_toml("[monitor]\nrecall_actor = \"admins\"\n").unwrap();
    let err = config.to_guard_config().unwrap_err();
    assert!(err.to_string().contains("recall_actor"));
}

#[test]
fn broken_template_is_rejected() {
    let config =
        RecallGuardConfig::from_toml("[forward]\ntemplate = \"{{ sender_name \"\n").unwrap();
    let err = config.to_guard_config().unwrap_err();
    assert!(err.to_string().contains("forward.template"));
}

#[test]
fn zero_interval_is_rejected() {
    let config = RecallGuardConfig::from_toml("[cache]\ninterval_seconds = 0\n").unwrap();
    assert!(config.to_guard_config().is_err());
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = RecallGuardConfig::from_toml("[server\nport = ").unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
}

#[test]
fn onebot_debug_redacts_token() {
    let config =
        RecallGuardConfig::from_toml("[onebot]\naccess_token = \"test-placeholder\"\n").unwrap();
    let debug = format!("{:?}", config.onebot);
    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains("test-placeholder"));
}

#[test]
fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = RecallGuardConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn existing_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recallguard.toml");
    std::fs::write(&path, "[server]\nport = 9100\n").unwrap();
    let loaded = RecallGuardConfig::load(&path).unwrap().unwrap();
    assert_eq!(loaded.server.port, 9100);
}
